//! Heritage Foundation Index of Economic Freedom.
//!
//! The ranking page at <https://www.heritage.org/index/ranking> carries one
//! table with a `Country Name` column and an `Overall Score` column. Countries
//! are listed by short name ("Russia", "Kyrgyz Republic").

use super::{SourceAdapter, filter_to_reference, html_table};
use crate::config::TableSourceConfig;
use crate::countries::{IdentifierKind, IdentifierMap};
use crate::error::PipelineError;
use crate::http::FetchAsync;
use crate::models::{Metric, SourceTable};
use tracing::{info, instrument};

pub const SOURCE: &str = "heritage";

#[derive(Debug, Clone)]
pub struct HeritageSource {
    config: TableSourceConfig,
}

impl HeritageSource {
    pub fn new(config: TableSourceConfig) -> Self {
        Self { config }
    }
}

impl SourceAdapter for HeritageSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn metric(&self) -> Metric {
        Metric::EconomicFreedom
    }

    fn identifier_kind(&self) -> IdentifierKind {
        IdentifierKind::ColloquialName
    }

    #[instrument(level = "info", skip_all, fields(url = %self.config.url))]
    async fn fetch<F: FetchAsync>(&self, http: &F) -> Result<SourceTable, PipelineError> {
        let table = scrape_table(SOURCE, http, &self.config).await?;
        info!(rows = table.rows.len(), "Scraped Heritage ranking table");
        filter_to_reference(table, &IdentifierMap::for_kind(self.identifier_kind()))
    }
}

/// GET `config.url` and pull out the configured table.
///
/// Shared with any other adapter that scrapes a ranking table.
pub(crate) async fn scrape_table<F: FetchAsync>(
    source: &str,
    http: &F,
    config: &TableSourceConfig,
) -> Result<SourceTable, PipelineError> {
    let body = http
        .get_text(&config.url)
        .await
        .map_err(|e| PipelineError::unavailable(source, e))?;
    html_table::extract_table(
        source,
        &body,
        &config.table_selector,
        &config.identifier_column,
        &config.value_column,
    )
}
