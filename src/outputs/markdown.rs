//! Raw data table as Markdown.

use super::{format_value, write_output};
use crate::error::PipelineError;
use crate::models::ReconciledTable;
use std::fmt::Write;
use tracing::instrument;

pub const FILE_NAME: &str = "reconciled.md";

pub fn table_to_markdown(table: &ReconciledTable) -> String {
    let columns = table.columns();
    let mut md = String::new();

    writeln!(md, "# Post-Soviet Space Index Data\n").unwrap();
    writeln!(md, "| {} |", columns.join(" | ")).unwrap();
    writeln!(
        md,
        "|{}",
        columns
            .iter()
            .enumerate()
            .map(|(i, _)| if i == 0 { " --- |" } else { " ---: |" })
            .collect::<String>()
    )
    .unwrap();
    for row in &table.rows {
        let values: Vec<String> = row.values.iter().map(|v| format_value(*v)).collect();
        writeln!(md, "| {} | {} |", row.country, values.join(" | ")).unwrap();
    }
    md
}

#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_markdown(
    table: &ReconciledTable,
    output_dir: &str,
) -> Result<String, PipelineError> {
    write_output(output_dir, FILE_NAME, &table_to_markdown(table)).await
}
