//! Small helpers shared by adapters and outputs.
//!
//! - String truncation for log previews
//! - Whitespace collapsing and numeric extraction from scraped cells
//! - HTML escaping for the rendered dashboard
//! - Output directory validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// First signed decimal number in a cell, allowing `,` thousands separators.
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-−]?\d{1,3}(?:,\d{3})+(?:\.\d+)?|[-−]?\d+(?:\.\d+)?").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (on a char boundary) with an ellipsis
/// and the number of dropped bytes appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse runs of whitespace (including non-breaking spaces) to one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the first number from a scraped cell.
///
/// Handles `"1,234.5"`, `"20 Not Free"`, `"61.3*"` and a Unicode minus sign.
/// Returns `None` for `"N/A"`, `"-"`, or empty cells.
///
/// ```ignore
/// assert_eq!(parse_number("20 Not Free"), Some(20.0));
/// ```
pub fn parse_number(cell: &str) -> Option<f64> {
    let m = NUMBER.find(cell)?;
    m.as_str()
        .replace(',', "")
        .replace('−', "-")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Arguments
///
/// * `path` - Directory the outputs will be written to
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be created or written.
///
/// # Examples
///
/// ```ignore
/// ensure_writable_dir("./site").await?;
/// ```
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Probe with a real file write
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
