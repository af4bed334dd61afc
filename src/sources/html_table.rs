//! Locate and materialize a score table inside a scraped HTML page.
//!
//! Third-party ranking pages change layout without notice, so the lookup is
//! structural: walk every element matching the table selector and take the
//! first one whose header row names all the required columns. Anything else
//! is a [`PipelineError::ParseError`], never an empty table.

use crate::error::PipelineError;
use crate::models::SourceTable;
use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Extract the first table under `table_selector` whose headers include both
/// `identifier_column` and `value_column`.
///
/// # Arguments
///
/// * `source` - Source name used in errors
/// * `html` - The fetched page
/// * `table_selector` - CSS selector for candidate tables, usually `"table"`
/// * `identifier_column` - Header of the country column
/// * `value_column` - Header of the score column
///
/// # Returns
///
/// A [`SourceTable`] with whitespace-collapsed cells and rows padded to the
/// header width.
///
/// # Errors
///
/// [`PipelineError::ParseError`] if the selector is invalid, matches
/// nothing, or no matching table has both columns.
///
/// # Examples
///
/// ```ignore
/// let t = extract_table("heritage", &body, "table", "Country Name", "Overall Score")?;
/// assert_eq!(t.identifier_column, "Country Name");
/// ```
#[instrument(level = "info", skip(html), fields(bytes = html.len()))]
pub fn extract_table(
    source: &str,
    html: &str,
    table_selector: &str,
    identifier_column: &str,
    value_column: &str,
) -> Result<SourceTable, PipelineError> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse(table_selector)
        .map_err(|e| PipelineError::parse(source, format!("bad selector '{table_selector}': {e}")))?;

    let mut seen = 0usize;
    for table in document.select(&table_sel) {
        seen += 1;
        let (headers, rows) = materialize(table);
        let has = |name: &str| headers.iter().any(|h| h == name.trim());
        if has(identifier_column) && has(value_column) {
            debug!(table = seen, rows = rows.len(), ?headers, "Matched table");
            return Ok(SourceTable {
                source: source.to_string(),
                headers,
                rows,
                identifier_column: identifier_column.trim().to_string(),
                value_column: value_column.trim().to_string(),
                unmapped: Vec::new(),
            });
        }
        debug!(table = seen, ?headers, "Skipping table without expected columns");
    }

    let reason = if seen == 0 {
        format!("no element matches '{table_selector}'")
    } else {
        format!(
            "none of {seen} table(s) has columns '{identifier_column}' and '{value_column}'"
        )
    };
    Err(PipelineError::parse(source, reason))
}

/// Header cells plus body rows of one table, all text with whitespace collapsed.
///
/// Headers come from the first `thead` row (`th` or `td` cells) when present,
/// else from the first body row. Rows shorter than the header are padded
/// with empty cells.
fn materialize(table: ElementRef<'_>) -> (Vec<String>, Vec<Vec<String>>) {
    let thead_tr = Selector::parse("thead tr").unwrap();
    let tr = Selector::parse("tr").unwrap();
    let cell = Selector::parse("th, td").unwrap();

    let cells_of = |row: ElementRef<'_>| -> Vec<String> {
        row.select(&cell)
            .map(|c| collapse_whitespace(&c.text().collect::<String>()))
            .collect()
    };

    let mut headers: Vec<String> = table
        .select(&thead_tr)
        .find(|row| in_thead(*row, table))
        .map(cells_of)
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .unwrap_or_default();
    let mut rows_iter = table
        .select(&tr)
        .filter(|row| !in_thead(*row, table));

    if headers.is_empty() {
        if let Some(first) = rows_iter.next() {
            headers = cells_of(first);
        }
    }

    let rows = rows_iter
        .map(cells_of)
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .map(|mut cells| {
            if cells.len() < headers.len() {
                cells.resize(headers.len(), String::new());
            }
            cells
        })
        .collect();

    (headers, rows)
}

/// Whether `row` sits inside a `<thead>` of `table` (not of a nested table).
fn in_thead(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    for ancestor in row.ancestors() {
        if ancestor.id() == table.id() {
            return false;
        }
        if let Some(el) = ancestor.value().as_element() {
            if el.name() == "thead" {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANKING: &str = r#"
        <html><body>
          <table class="nav"><tr><td>Menu</td></tr></table>
          <table class="ranking">
            <thead>
              <tr><th>Rank</th><th>Country Name</th><th>Overall   Score</th></tr>
            </thead>
            <tbody>
              <tr><td>9</td><td>Estonia</td><td>77.8</td></tr>
              <tr><td>131</td><td> Kyrgyz
                  Republic </td><td>53.3</td></tr>
              <tr><td>176</td><td>Russia</td></tr>
              <tr><td></td><td></td><td></td></tr>
            </tbody>
          </table>
        </body></html>
    "#;

    #[test]
    fn finds_first_table_with_expected_columns() {
        let t = extract_table("heritage", RANKING, "table", "Country Name", "Overall Score")
            .unwrap();
        assert_eq!(t.headers, vec!["Rank", "Country Name", "Overall Score"]);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[1], vec!["131", "Kyrgyz Republic", "53.3"]);
        // short rows are padded
        assert_eq!(t.rows[2], vec!["176", "Russia", ""]);
        assert_eq!(t.identifier_column, "Country Name");
    }

    #[test]
    fn header_from_first_row_without_thead() {
        let html = r#"<table>
            <tr><th>Country</th><th>Total Score</th></tr>
            <tr><td>Georgia</td><td>58 Partly Free</td></tr>
        </table>"#;
        let t = extract_table("freedom", html, "table", "Country", "Total Score").unwrap();
        assert_eq!(t.headers, vec!["Country", "Total Score"]);
        assert_eq!(t.rows, vec![vec!["Georgia", "58 Partly Free"]]);
    }

    #[test]
    fn header_from_thead_with_td_cells() {
        let html = r#"<table>
            <thead><tr><td>Country Name</td><td>Overall Score</td></tr></thead>
            <tbody>
              <tr><td>Estonia</td><td>77.8</td></tr>
              <tr><td>Georgia</td><td>68.4</td></tr>
            </tbody>
        </table>"#;
        let t = extract_table("heritage", html, "table", "Country Name", "Overall Score")
            .unwrap();
        assert_eq!(t.headers, vec!["Country Name", "Overall Score"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0], vec!["Estonia", "77.8"]);
    }

    #[test]
    fn no_table_is_parse_error() {
        let err = extract_table("heritage", "<html><p>moved</p></html>", "table", "A", "B")
            .unwrap_err();
        match err {
            PipelineError::ParseError { source_name, reason } => {
                assert_eq!(source_name, "heritage");
                assert!(reason.contains("no element"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_columns_is_parse_error() {
        let err = extract_table("heritage", RANKING, "table", "Country Name", "Score 2024")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ParseError { .. }));
        assert!(err.to_string().contains("none of 2 table(s)"));
    }

    #[test]
    fn custom_selector_narrows_search() {
        let err = extract_table("heritage", RANKING, "table.nav", "Country Name", "Overall Score")
            .unwrap_err();
        assert!(err.to_string().contains("none of 1 table(s)"));
    }

    #[test]
    fn invalid_selector_is_parse_error() {
        let err = extract_table("heritage", RANKING, "table[", "A", "B").unwrap_err();
        assert!(err.to_string().contains("bad selector"));
    }
}
