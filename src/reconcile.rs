//! Inner join of normalized metric tables on the canonical country.
//!
//! A country missing from any one table is left out entirely; there are no
//! partial rows and no null filling. An empty join is an error, because with
//! a fixed reference set it can only mean the name mappings disagree.

use crate::error::PipelineError;
use crate::models::{Country, MetricTable, ReconciledRow, ReconciledTable};
use tracing::{info, instrument, warn};

/// Inner-join `tables` on [`Country`].
///
/// # Arguments
///
/// * `tables` - Normalized tables in the order their columns should appear
///
/// # Returns
///
/// One row per country present in every table, in reference order, with
/// values in the same order as `tables`.
///
/// # Errors
///
/// [`PipelineError::NoOverlap`] when `tables` is empty or no country is in
/// all of them.
#[instrument(level = "info", skip_all, fields(tables = tables.len()))]
pub fn reconcile(tables: &[MetricTable]) -> Result<ReconciledTable, PipelineError> {
    let sources: Vec<String> = tables.iter().map(|t| t.source.clone()).collect();
    if tables.is_empty() {
        return Err(PipelineError::NoOverlap { sources });
    }

    let mut rows = Vec::new();
    for country in Country::all() {
        let missing: Vec<&str> = tables
            .iter()
            .filter(|t| !t.values.contains_key(&country))
            .map(|t| t.source.as_str())
            .collect();
        if !missing.is_empty() {
            if missing.len() < tables.len() {
                warn!(%country, missing_from = ?missing, "Excluding country absent from some sources");
            }
            continue;
        }
        rows.push(ReconciledRow {
            country,
            values: tables.iter().map(|t| t.values[&country]).collect(),
        });
    }

    if rows.is_empty() {
        return Err(PipelineError::NoOverlap { sources });
    }

    info!(rows = rows.len(), "Reconciled tables");
    Ok(ReconciledTable {
        metrics: tables.iter().map(|t| t.metric).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::{IdentifierKind, IdentifierMap, KNOWN_ALIAS_PAIRS};
    use crate::models::{Metric, SourceTable};
    use crate::normalize::normalize;
    use std::collections::HashSet;

    fn full(source: &str, metric: Metric, base: f64) -> MetricTable {
        let mut t = MetricTable::new(source, metric);
        for (i, c) in Country::all().enumerate() {
            t.values.insert(c, base + i as f64);
        }
        t
    }

    fn three_full() -> Vec<MetricTable> {
        vec![
            full("freedom", Metric::FreedomIndex, 0.0),
            full("heritage", Metric::EconomicFreedom, 50.0),
            full("worldbank", Metric::GdpPpp, 10_000.0),
        ]
    }

    #[test]
    fn three_full_tables_give_fifteen_rows() {
        let r = reconcile(&three_full()).unwrap();
        assert_eq!(r.rows.len(), 15);
        assert_eq!(
            r.metrics,
            vec![Metric::FreedomIndex, Metric::EconomicFreedom, Metric::GdpPpp]
        );
        assert_eq!(r.rows[0].country, Country::Russia);
        assert_eq!(r.rows[0].values, vec![0.0, 50.0, 10_000.0]);
    }

    #[test]
    fn rows_are_unique_reference_countries() {
        let r = reconcile(&three_full()).unwrap();
        let reference: HashSet<Country> = Country::all().collect();
        let mut seen = HashSet::new();
        for row in &r.rows {
            assert!(reference.contains(&row.country));
            assert!(seen.insert(row.country), "duplicate {}", row.country);
            assert_eq!(row.values.len(), r.metrics.len());
        }
    }

    #[test]
    fn missing_country_is_excluded() {
        let mut tables = three_full();
        tables[1].values.remove(&Country::Turkmenistan);
        let r = reconcile(&tables).unwrap();
        assert_eq!(r.rows.len(), 14);
        assert!(!r.countries().contains(&Country::Turkmenistan));
    }

    #[test]
    fn no_overlap_is_an_error() {
        let mut a = MetricTable::new("a", Metric::FreedomIndex);
        a.values.insert(Country::Estonia, 94.0);
        let mut b = MetricTable::new("b", Metric::GdpPpp);
        b.values.insert(Country::Latvia, 40_000.0);
        match reconcile(&[a, b]) {
            Err(PipelineError::NoOverlap { sources }) => assert_eq!(sources, vec!["a", "b"]),
            other => panic!("expected NoOverlap, got {other:?}"),
        }
        assert!(matches!(reconcile(&[]), Err(PipelineError::NoOverlap { .. })));
    }

    #[test]
    fn column_order_follows_supply_order() {
        let mut tables = three_full();
        tables.reverse();
        let r = reconcile(&tables).unwrap();
        assert_eq!(r.columns(), vec!["Country", "GDP PPP", "Economic Freedom", "Freedom Index"]);
    }

    fn names_table(source: &str, header: &str, names: &[&str]) -> SourceTable {
        SourceTable {
            source: source.into(),
            headers: vec![header.into(), "v".into()],
            rows: names.iter().map(|n| vec![n.to_string(), "1".into()]).collect(),
            identifier_column: header.into(),
            value_column: "v".into(),
            unmapped: Vec::new(),
        }
    }

    #[test]
    fn alias_spellings_join_across_sources() {
        let colloquial = IdentifierMap::for_kind(IdentifierKind::ColloquialName);
        let official = IdentifierMap::for_kind(IdentifierKind::OfficialName);

        for (short, long, country) in KNOWN_ALIAS_PAIRS {
            let a = normalize(
                &names_table("heritage", "Country Name", &[short]),
                &colloquial,
                Metric::EconomicFreedom,
            )
            .unwrap();
            let b = normalize(
                &names_table("stats", "Country", &[long]),
                &official,
                Metric::GdpPpp,
            )
            .unwrap();
            let r = reconcile(&[a, b]).unwrap();
            assert_eq!(r.countries(), vec![*country], "{short} / {long}");
        }
    }

    #[test]
    fn unmapped_spelling_does_not_join() {
        let colloquial = IdentifierMap::for_kind(IdentifierKind::ColloquialName);
        let iso = IdentifierMap::for_kind(IdentifierKind::Iso3);
        // "Kyrgyz Republic" is not an ISO-3 code, so nothing can join.
        let a = normalize(
            &names_table("heritage", "Country Name", &["Kyrgyz Republic"]),
            &colloquial,
            Metric::EconomicFreedom,
        )
        .unwrap();
        let b = normalize(
            &names_table("stats", "code", &["Kyrgyz Republic"]),
            &iso,
            Metric::GdpPpp,
        )
        .unwrap();
        assert_eq!(b.unmapped, vec!["Kyrgyz Republic"]);
        assert!(matches!(reconcile(&[a, b]), Err(PipelineError::NoOverlap { .. })));
    }
}
