//! Data models for the acquisition and reconciliation pipeline.
//!
//! - [`Country`] / [`CountryRecord`]: the fixed reference set of post-Soviet states
//! - [`SourceTable`]: untyped rows as a source adapter returned them
//! - [`MetricTable`]: one typed metric per canonical country, after normalization
//! - [`ReconciledTable`]: the inner join of every metric table, handed to the outputs

use crate::countries::REFERENCE_COUNTRIES;
use crate::error::PipelineError;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A reference country. Variant order is the display order of every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Country {
    Russia,
    Ukraine,
    Georgia,
    Kazakhstan,
    Belarus,
    Armenia,
    Azerbaijan,
    Moldova,
    Uzbekistan,
    Turkmenistan,
    Kyrgyzstan,
    Tajikistan,
    Estonia,
    Latvia,
    Lithuania,
}

impl Country {
    pub fn all() -> impl Iterator<Item = Country> {
        REFERENCE_COUNTRIES.iter().map(|r| r.country)
    }

    pub fn record(self) -> &'static CountryRecord {
        &REFERENCE_COUNTRIES[self as usize]
    }

    /// The canonical name shared by every merged dataset.
    pub fn name(self) -> &'static str {
        self.record().name
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Country {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Canonical identity of a reference country and its alternate identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryRecord {
    pub country: Country,
    pub name: &'static str,
    pub iso2: &'static str,
    pub iso3: &'static str,
}

/// The metrics the dashboard can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Metric {
    #[serde(rename = "Freedom Index", alias = "freedom_index")]
    FreedomIndex,
    #[serde(rename = "Economic Freedom", alias = "economic_freedom")]
    EconomicFreedom,
    #[serde(rename = "GDP PPP", alias = "gdp_ppp")]
    GdpPpp,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::FreedomIndex, Metric::EconomicFreedom, Metric::GdpPpp];

    /// Stable, source-independent column name.
    pub fn label(self) -> &'static str {
        match self {
            Metric::FreedomIndex => "Freedom Index",
            Metric::EconomicFreedom => "Economic Freedom",
            Metric::GdpPpp => "GDP PPP",
        }
    }

    /// Accepts the label or a snake_case key, case-insensitively.
    pub fn parse(s: &str) -> Option<Metric> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Metric::ALL
            .into_iter()
            .find(|m| m.label().to_lowercase() == wanted)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Rows exactly as a source delivered them, every cell still a string.
///
/// `identifier_column` and `value_column` name the header cells the
/// normalizer reads; the adapter that built the table knows the source layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub identifier_column: String,
    pub value_column: String,
    /// Identifiers already dropped by the adapter for lack of a mapping.
    pub unmapped: Vec<String>,
}

impl SourceTable {
    /// Index of the header named `name`, compared after trimming.
    pub fn column_index(&self, name: &str) -> Result<usize, PipelineError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name.trim())
            .ok_or_else(|| {
                PipelineError::parse(
                    &self.source,
                    format!("missing column '{}' (have: {:?})", name, self.headers),
                )
            })
    }

    /// Keep only the rows whose cell in `column` passes `keep`.
    pub fn retain_by(&mut self, column: usize, mut keep: impl FnMut(&str) -> bool) {
        self.rows
            .retain(|row| row.get(column).map(|cell| keep(cell)).unwrap_or(false));
    }
}

/// One metric, at most one numeric value per reference country.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub source: String,
    pub metric: Metric,
    pub values: BTreeMap<Country, f64>,
    /// Source identifiers that had no canonical mapping and were dropped.
    pub unmapped: Vec<String>,
}

impl MetricTable {
    pub fn new(source: &str, metric: Metric) -> Self {
        Self {
            source: source.to_string(),
            metric,
            values: BTreeMap::new(),
            unmapped: Vec::new(),
        }
    }
}

/// A row of the joined table: one country, one value per metric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub country: Country,
    pub values: Vec<f64>,
}

/// Countries present in every source, in reference order.
///
/// Serializes as a list of records keyed by column label, with `"Country"`
/// first, so it can feed a data table directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledTable {
    pub metrics: Vec<Metric>,
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledTable {
    /// Column labels in output order.
    pub fn columns(&self) -> Vec<&'static str> {
        std::iter::once("Country")
            .chain(self.metrics.iter().map(|m| m.label()))
            .collect()
    }

    pub fn countries(&self) -> Vec<Country> {
        self.rows.iter().map(|r| r.country).collect()
    }

    /// Values of `metric` paired with their country, or `None` if the table
    /// has no such column.
    pub fn column(&self, metric: Metric) -> Option<Vec<(Country, f64)>> {
        let idx = self.metrics.iter().position(|m| *m == metric)?;
        Some(
            self.rows
                .iter()
                .map(|r| (r.country, r.values[idx]))
                .collect(),
        )
    }
}

struct Record<'a> {
    metrics: &'a [Metric],
    row: &'a ReconciledRow,
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.metrics.len() + 1))?;
        map.serialize_entry("Country", &self.row.country)?;
        for (metric, value) in self.metrics.iter().zip(&self.row.values) {
            map.serialize_entry(metric.label(), value)?;
        }
        map.end()
    }
}

impl Serialize for ReconciledTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                metrics: &self.metrics,
                row,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReconciledTable {
        ReconciledTable {
            metrics: vec![Metric::FreedomIndex, Metric::GdpPpp],
            rows: vec![
                ReconciledRow {
                    country: Country::Estonia,
                    values: vec![94.0, 48_000.5],
                },
                ReconciledRow {
                    country: Country::Kyrgyzstan,
                    values: vec![27.0, 6_500.0],
                },
            ],
        }
    }

    #[test]
    fn country_record_matches_variant() {
        for c in Country::all() {
            assert_eq!(c.record().country, c);
        }
        assert_eq!(Country::Kyrgyzstan.name(), "Kyrgyzstan");
        assert_eq!(Country::all().count(), 15);
    }

    #[test]
    fn metric_parse_accepts_labels_and_keys() {
        assert_eq!(Metric::parse("GDP PPP"), Some(Metric::GdpPpp));
        assert_eq!(Metric::parse("economic_freedom"), Some(Metric::EconomicFreedom));
        assert_eq!(Metric::parse("freedom-index"), Some(Metric::FreedomIndex));
        assert_eq!(Metric::parse("population"), None);
    }

    #[test]
    fn table_serializes_as_numeric_records() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json[0]["Country"], "Estonia");
        assert_eq!(json[0]["GDP PPP"], 48_000.5);
        assert!(json[1]["Freedom Index"].is_number());
    }

    #[test]
    fn column_order_is_country_then_metrics() {
        assert_eq!(sample().columns(), vec!["Country", "Freedom Index", "GDP PPP"]);
    }

    #[test]
    fn column_lookup() {
        let t = sample();
        assert_eq!(
            t.column(Metric::GdpPpp).unwrap(),
            vec![(Country::Estonia, 48_000.5), (Country::Kyrgyzstan, 6_500.0)]
        );
        assert!(t.column(Metric::EconomicFreedom).is_none());
    }

    #[test]
    fn missing_column_is_parse_error() {
        let table = SourceTable {
            source: "heritage".into(),
            headers: vec!["Country Name".into()],
            rows: vec![],
            identifier_column: "Country Name".into(),
            value_column: "Overall Score".into(),
            unmapped: Vec::new(),
        };
        assert!(table.column_index("Country Name").is_ok());
        assert!(matches!(
            table.column_index("Overall Score"),
            Err(PipelineError::ParseError { .. })
        ));
    }
}
