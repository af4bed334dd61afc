//! JSON export of the reconciled table.
//!
//! ```text
//! { "generated_at": "2026-10-19T08:00:00+00:00",
//!   "metrics": ["Freedom Index", "Economic Freedom", "GDP PPP"],
//!   "rows": [ { "Country": "Russia", "Freedom Index": 20.0, ... }, ... ] }
//! ```

use super::write_output;
use crate::error::PipelineError;
use crate::models::{Metric, ReconciledTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

pub const FILE_NAME: &str = "reconciled.json";

#[derive(Debug, Serialize)]
pub struct ReconciledDocument<'a> {
    pub generated_at: String,
    pub metrics: &'a [Metric],
    pub rows: &'a ReconciledTable,
}

pub fn to_json(table: &ReconciledTable, generated_at: DateTime<Utc>) -> Result<String, PipelineError> {
    let doc = ReconciledDocument {
        generated_at: generated_at.to_rfc3339(),
        metrics: &table.metrics,
        rows: table,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| PipelineError::Output {
        path: FILE_NAME.to_string(),
        reason: e.to_string(),
    })
}

/// Write the reconciled table to `{output_dir}/reconciled.json`.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_reconciled(
    table: &ReconciledTable,
    output_dir: &str,
) -> Result<String, PipelineError> {
    let json = to_json(table, Utc::now())?;
    write_output(output_dir, FILE_NAME, &json).await
}
