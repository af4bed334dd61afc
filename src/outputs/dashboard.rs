//! Interactive dashboard: a metric selector driving a choropleth map, plus the
//! raw data table.
//!
//! Charting is done in the browser by Plotly.js. This module only produces
//! the figure data for each metric and a page that swaps between them with
//! `Plotly.react` when the selector changes. Switching metrics changes the
//! color values and titles; the set of locations stays the same.

use super::{format_value, write_output};
use crate::error::PipelineError;
use crate::models::{Metric, ReconciledTable};
use crate::utils::escape_html;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{info, instrument};

pub const FILE_NAME: &str = "dashboard.html";
pub const TITLE: &str = "Post-Soviet Space Index Dashboard";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Figure {
    pub data: Vec<ChoroplethTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChoroplethTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub locations: Vec<&'static str>,
    pub locationmode: &'static str,
    pub z: Vec<f64>,
    /// Hover names.
    pub text: Vec<&'static str>,
    pub hovertemplate: String,
    pub colorscale: &'static str,
    pub colorbar: ColorBar,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColorBar {
    pub title: Text,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Text {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Layout {
    pub title: Text,
    pub geo: Geo,
    pub margin: BTreeMap<&'static str, u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Geo {
    pub showframe: bool,
    pub showcoastlines: bool,
    pub projection: Projection,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Projection {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Choropleth figure colored by `metric`, or `None` if the table lacks it.
pub fn choropleth(table: &ReconciledTable, metric: Metric) -> Option<Figure> {
    let column = table.column(metric)?;
    let names: Vec<&'static str> = column.iter().map(|(c, _)| c.name()).collect();

    Some(Figure {
        data: vec![ChoroplethTrace {
            kind: "choropleth",
            locations: names.clone(),
            locationmode: "country names",
            z: column.iter().map(|(_, v)| *v).collect(),
            text: names,
            hovertemplate: format!("<b>%{{text}}</b><br>{}: %{{z}}<extra></extra>", metric.label()),
            colorscale: "Viridis",
            colorbar: ColorBar {
                title: Text {
                    text: metric.label().to_string(),
                },
            },
        }],
        layout: Layout {
            title: Text {
                text: format!("{} Across Post-Soviet Countries", metric.label()),
            },
            geo: Geo {
                showframe: false,
                showcoastlines: true,
                projection: Projection {
                    kind: "natural earth",
                },
            },
            margin: BTreeMap::from([("l", 0), ("r", 0), ("t", 60), ("b", 0)]),
        },
    })
}

/// Every metric's figure keyed by its label.
pub fn figures(table: &ReconciledTable) -> BTreeMap<&'static str, Figure> {
    table
        .metrics
        .iter()
        .filter_map(|m| choropleth(table, *m).map(|f| (m.label(), f)))
        .collect()
}

/// Full HTML page. `selected` falls back to the first column when absent.
pub fn render_dashboard(
    table: &ReconciledTable,
    selected: Metric,
) -> Result<String, PipelineError> {
    let selected = if table.metrics.contains(&selected) {
        selected
    } else {
        table.metrics.first().copied().unwrap_or(selected)
    };
    let figures_json = serde_json::to_string(&figures(table))
        .map_err(|e| PipelineError::Output {
            path: FILE_NAME.to_string(),
            reason: e.to_string(),
        })?
        .replace("</", "<\\/");

    let mut html = String::new();
    writeln!(html, "<!DOCTYPE html>").unwrap();
    writeln!(html, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">").unwrap();
    writeln!(html, "<title>{}</title>", escape_html(TITLE)).unwrap();
    writeln!(html, "<script src=\"{PLOTLY_CDN}\"></script>").unwrap();
    writeln!(
        html,
        "<style>\nbody {{ font-family: sans-serif; }}\n\
         h1 {{ text-align: center; }}\n\
         .selector {{ width: 40%; margin: auto; }}\n\
         table {{ border-collapse: collapse; overflow-x: auto; }}\n\
         th {{ background-color: rgb(230, 230, 230); font-weight: bold; }}\n\
         th, td {{ text-align: left; padding: 5px; }}\n</style>"
    )
    .unwrap();
    writeln!(html, "</head>\n<body>").unwrap();
    writeln!(html, "<h1>{}</h1>", escape_html(TITLE)).unwrap();

    writeln!(html, "<div class=\"selector\">").unwrap();
    writeln!(html, "<label for=\"index-selector\">Select Index to View:</label>").unwrap();
    writeln!(html, "<select id=\"index-selector\">").unwrap();
    for metric in &table.metrics {
        let label = escape_html(metric.label());
        let sel = if *metric == selected { " selected" } else { "" };
        writeln!(html, "<option value=\"{label}\"{sel}>{label}</option>").unwrap();
    }
    writeln!(html, "</select>\n</div>").unwrap();
    writeln!(html, "<div id=\"dynamic-map\" style=\"height: 600px;\"></div>").unwrap();

    writeln!(html, "<div>\n<h2 style=\"margin-top: 30px;\">Raw Data Table</h2>").unwrap();
    html.push_str(&data_table_html(table));
    writeln!(html, "</div>").unwrap();

    writeln!(
        html,
        "<script type=\"application/json\" id=\"figures\">{figures_json}</script>"
    )
    .unwrap();
    html.push_str(
        r#"<script>
const figures = JSON.parse(document.getElementById('figures').textContent);
const selector = document.getElementById('index-selector');
function draw() {
  const fig = figures[selector.value];
  Plotly.react('dynamic-map', fig.data, fig.layout, { responsive: true });
}
selector.addEventListener('change', draw);
draw();
</script>
</body>
</html>
"#,
    );
    Ok(html)
}

fn data_table_html(table: &ReconciledTable) -> String {
    let mut html = String::from("<table id=\"raw-data\">\n<thead><tr>");
    for col in table.columns() {
        write!(html, "<th>{}</th>", escape_html(col)).unwrap();
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        write!(html, "<tr><td>{}</td>", escape_html(row.country.name())).unwrap();
        for v in &row.values {
            write!(html, "<td>{}</td>", format_value(*v)).unwrap();
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

#[instrument(level = "info", skip_all, fields(%output_dir, %selected))]
pub async fn write_dashboard(
    table: &ReconciledTable,
    selected: Metric,
    output_dir: &str,
) -> Result<String, PipelineError> {
    let html = render_dashboard(table, selected)?;
    let path = write_output(output_dir, FILE_NAME, &html).await?;
    info!(%path, metrics = table.metrics.len(), rows = table.rows.len(), "Dashboard ready");
    Ok(path)
}
