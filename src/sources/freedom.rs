//! Freedom index (0 = least free, 100 = most free).
//!
//! Either scraped from a configured ranking page, or served from a built-in
//! snapshot when no reliably table-structured page is available.

use super::heritage::scrape_table;
use super::{SourceAdapter, filter_to_reference};
use crate::config::{FreedomConfig, TableSourceConfig};
use crate::countries::{IdentifierKind, IdentifierMap};
use crate::error::PipelineError;
use crate::http::FetchAsync;
use crate::models::{Country, Metric, SourceTable};
use tracing::{info, instrument};

pub const SOURCE: &str = "freedom";

/// Built-in scores, one per reference country.
pub const SNAPSHOT: [(Country, u8); 15] = [
    (Country::Russia, 20),
    (Country::Ukraine, 39),
    (Country::Georgia, 61),
    (Country::Kazakhstan, 23),
    (Country::Belarus, 19),
    (Country::Armenia, 55),
    (Country::Azerbaijan, 28),
    (Country::Moldova, 58),
    (Country::Uzbekistan, 11),
    (Country::Turkmenistan, 3),
    (Country::Kyrgyzstan, 27),
    (Country::Tajikistan, 10),
    (Country::Estonia, 94),
    (Country::Latvia, 89),
    (Country::Lithuania, 91),
];

#[derive(Debug, Clone)]
pub enum FreedomSource {
    Snapshot,
    Scrape(TableSourceConfig),
}

impl FreedomSource {
    pub fn from_config(config: &FreedomConfig) -> Self {
        match config {
            FreedomConfig::Snapshot => Self::Snapshot,
            FreedomConfig::Scrape(table) => Self::Scrape(table.clone()),
        }
    }

    fn snapshot_table() -> SourceTable {
        SourceTable {
            source: SOURCE.to_string(),
            headers: vec!["Country".to_string(), "Freedom Index".to_string()],
            rows: SNAPSHOT
                .iter()
                .map(|(country, score)| vec![country.name().to_string(), score.to_string()])
                .collect(),
            identifier_column: "Country".to_string(),
            value_column: "Freedom Index".to_string(),
            unmapped: Vec::new(),
        }
    }
}

impl SourceAdapter for FreedomSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn metric(&self) -> Metric {
        Metric::FreedomIndex
    }

    fn identifier_kind(&self) -> IdentifierKind {
        IdentifierKind::ColloquialName
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch<F: FetchAsync>(&self, http: &F) -> Result<SourceTable, PipelineError> {
        let table = match self {
            Self::Snapshot => {
                info!("Using built-in freedom index snapshot");
                Self::snapshot_table()
            }
            Self::Scrape(config) => {
                let table = scrape_table(SOURCE, http, config).await?;
                info!(url = %config.url, rows = table.rows.len(), "Scraped freedom index table");
                table
            }
        };
        filter_to_reference(table, &IdentifierMap::for_kind(self.identifier_kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::http::HttpFetcher;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn snapshot_covers_every_reference_country() {
        let http = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let table = FreedomSource::Snapshot.fetch(&http).await.unwrap();
        assert_eq!(table.rows.len(), 15);
        let names: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        let expected: Vec<&str> = Country::all().map(|c| c.name()).collect();
        assert_eq!(names, expected);
        assert_eq!(table.rows[12], vec!["Estonia", "94"]);
    }

    #[tokio::test]
    async fn scrape_reads_configured_columns() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/scores");
                then.status(200).body(
                    r#"<table class="scores">
                        <tr><th>Country or Territory</th><th>Total Score and Status</th></tr>
                        <tr><td>Georgia</td><td>58 Partly Free</td></tr>
                        <tr><td>Kirghizia</td><td>27 Not Free</td></tr>
                        <tr><td>Norway</td><td>100 Free</td></tr>
                    </table>"#,
                );
            })
            .await;

        let config = FreedomConfig::Scrape(TableSourceConfig {
            url: server.url("/scores"),
            table_selector: "table.scores".into(),
            identifier_column: "Country or Territory".into(),
            value_column: "Total Score and Status".into(),
        });
        let http = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let table = FreedomSource::from_config(&config).fetch(&http).await.unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], "Kirghizia");
        assert_eq!(table.value_column, "Total Score and Status");
    }
}
