//! Turn a raw [`SourceTable`] into a typed, canonically-keyed [`MetricTable`].
//!
//! Rows are resolved through an explicit [`IdentifierMap`]; anything the map
//! does not know is dropped and logged, never guessed at. The first row wins
//! when two rows resolve to the same country.

use crate::countries::IdentifierMap;
use crate::error::PipelineError;
use crate::models::{Metric, MetricTable, SourceTable};
use crate::utils::parse_number;
use std::collections::btree_map::Entry;
use tracing::{info, instrument, warn};

/// Resolve every row of `table` to a canonical country and parse its value.
///
/// # Arguments
///
/// * `table` - Raw rows from one adapter
/// * `identifiers` - Mapping for the identifier kind the source uses
/// * `metric` - The metric the value column reports
///
/// # Returns
///
/// A [`MetricTable`] with at most one value per country. Identifiers the map
/// does not know are listed in `unmapped`, together with any the adapter
/// already dropped.
///
/// # Errors
///
/// [`PipelineError::ParseError`] if the identifier or value column is absent.
///
/// # Examples
///
/// ```ignore
/// let map = IdentifierMap::for_kind(IdentifierKind::ColloquialName);
/// let m = normalize(&table, &map, Metric::EconomicFreedom)?;
/// assert_eq!(m.values[&Country::Kyrgyzstan], 53.3);
/// ```
#[instrument(level = "info", skip_all, fields(source = %table.source, kind = %identifiers.kind(), %metric))]
pub fn normalize(
    table: &SourceTable,
    identifiers: &IdentifierMap,
    metric: Metric,
) -> Result<MetricTable, PipelineError> {
    let id_idx = table.column_index(&table.identifier_column)?;
    let value_idx = table.column_index(&table.value_column)?;
    let mut out = MetricTable::new(&table.source, metric);
    out.unmapped.extend(table.unmapped.iter().cloned());

    for row in &table.rows {
        let identifier = row.get(id_idx).map(String::as_str).unwrap_or("").trim();
        let raw_value = row.get(value_idx).map(String::as_str).unwrap_or("");

        let Some(country) = identifiers.resolve(identifier) else {
            let unmapped = PipelineError::UnmappedIdentifier {
                source_name: table.source.clone(),
                identifier: identifier.to_string(),
            };
            warn!(error = %unmapped, "Dropping row");
            out.unmapped.push(identifier.to_string());
            continue;
        };

        let Some(value) = parse_number(raw_value) else {
            warn!(%country, value = raw_value, "Dropping row with non-numeric value");
            continue;
        };

        match out.values.entry(country) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(existing) => {
                warn!(
                    %country,
                    identifier,
                    kept = *existing.get(),
                    dropped = value,
                    "Duplicate row for country; keeping the first"
                );
            }
        }
    }

    info!(
        countries = out.values.len(),
        unmapped = out.unmapped.len(),
        "Normalized source table"
    );
    Ok(out)
}
