//! Output generation for the reconciled table.
//!
//! # Submodules
//!
//! - [`dashboard`]: choropleth figure data and the interactive HTML dashboard
//! - [`json`]: the reconciled table as JSON records
//! - [`markdown`]: the raw data table as Markdown
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── dashboard.html
//! ├── reconciled.json
//! └── reconciled.md
//! ```

pub mod dashboard;
pub mod json;
pub mod markdown;

use crate::error::PipelineError;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Render a metric value for display: at most two decimals, no trailing zeros.
pub fn format_value(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Write `contents` to `dir/file_name`, returning the full path.
pub(crate) async fn write_output(
    dir: &str,
    file_name: &str,
    contents: &str,
) -> Result<String, PipelineError> {
    let path = Path::new(dir).join(file_name);
    let shown = path.display().to_string();
    fs::write(&path, contents)
        .await
        .map_err(|e| PipelineError::Output {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
    info!(path = %shown, bytes = contents.len(), "Wrote output");
    Ok(shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_value_trims() {
        assert_eq!(format_value(94.0), "94");
        assert_eq!(format_value(53.3), "53.3");
        assert_eq!(format_value(41887.639), "41887.64");
        assert_eq!(format_value(-0.001), "0");
    }

    #[tokio::test]
    async fn write_output_returns_written_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_output(dir.path().to_str().unwrap(), "x.md", "# hi\n")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("x.md").display().to_string());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");
    }

    #[tokio::test]
    async fn write_output_reports_failure_path() {
        let err = write_output("/nonexistent/dir", "x.json", "{}").await.unwrap_err();
        match err {
            PipelineError::Output { path, .. } => assert!(path.ends_with("x.json")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
