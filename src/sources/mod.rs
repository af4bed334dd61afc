//! Source adapters: one per upstream dataset.
//!
//! Every adapter fetches raw data and returns an untyped [`SourceTable`]
//! already filtered to identifiers its [`IdentifierMap`] recognises. Layout
//! knowledge (URLs, selectors, column headers, JSON shape) stays inside the
//! adapter; the normalizer and reconciler only ever see `SourceTable`.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Identifier |
//! |--------|--------|--------|------------|
//! | World Bank GDP PPP | [`worldbank`] | JSON API | ISO alpha-2 |
//! | Heritage Economic Freedom | [`heritage`] | HTML table scrape | colloquial name |
//! | Freedom index | [`freedom`] | snapshot or HTML table scrape | colloquial name |

pub mod freedom;
pub mod heritage;
pub mod html_table;
pub mod worldbank;

use crate::countries::{IdentifierKind, IdentifierMap};
use crate::error::PipelineError;
use crate::http::FetchAsync;
use crate::models::{Metric, SourceTable};
use tracing::{info, warn};

/// A remote dataset that yields one metric keyed by some country identifier.
pub trait SourceAdapter {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// The metric this source reports.
    fn metric(&self) -> Metric;

    /// How this source identifies countries.
    fn identifier_kind(&self) -> IdentifierKind;

    /// Fetch and return the raw table, filtered to the reference countries.
    async fn fetch<F: FetchAsync>(&self, http: &F) -> Result<SourceTable, PipelineError>;
}

/// Drop rows whose identifier is not in `identifiers`.
///
/// Every dropped identifier is logged as [`PipelineError::UnmappedIdentifier`]
/// and recorded in [`SourceTable::unmapped`], so a new spelling of a reference
/// country shows up in the logs instead of vanishing. Blank identifier cells
/// are dropped without a record.
pub fn filter_to_reference(
    mut table: SourceTable,
    identifiers: &IdentifierMap,
) -> Result<SourceTable, PipelineError> {
    let idx = table.column_index(&table.identifier_column)?;
    let source = table.source.clone();
    let before = table.rows.len();
    let mut dropped = Vec::new();
    table.retain_by(idx, |id| {
        let keep = identifiers.contains(id);
        let id = id.trim();
        if !keep && !id.is_empty() {
            let unmapped = PipelineError::UnmappedIdentifier {
                source_name: source.clone(),
                identifier: id.to_string(),
            };
            warn!(error = %unmapped, "Dropping row");
            dropped.push(id.to_string());
        }
        keep
    });
    info!(
        %source,
        kind = %identifiers.kind(),
        kept = table.rows.len(),
        dropped = before - table.rows.len(),
        unmapped = dropped.len(),
        "Filtered to reference countries"
    );
    table.unmapped.extend(dropped);
    Ok(table)
}
