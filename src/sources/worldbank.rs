//! World Bank indicators API (v2, JSON).
//!
//! GDP per capita at purchasing-power parity, current international dollars,
//! is indicator `NY.GDP.PCAP.PP.CD`. The API returns one observation per
//! country per year; this adapter keeps the most recent non-null one.
//!
//! # Response Shape
//!
//! ```text
//! [ { "page": 1, "pages": 1, "per_page": 1000, "total": 165, ... },
//!   [ { "country": { "id": "RU", "value": "Russian Federation" },
//!       "countryiso3code": "RUS", "date": "2023", "value": 41887.6, ... }, ... ] ]
//! ```
//!
//! Errors come back with HTTP 200 as `[ { "message": [ { "id", "key", "value" } ] } ]`.

use super::{SourceAdapter, filter_to_reference};
use crate::config::WorldBankConfig;
use crate::countries::{IdentifierKind, IdentifierMap, REFERENCE_COUNTRIES};
use crate::error::PipelineError;
use crate::http::FetchAsync;
use crate::models::{Metric, SourceTable};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const SOURCE: &str = "worldbank";
const PER_PAGE: u32 = 1000;
/// Guard against a server that keeps reporting more pages.
const MAX_PAGES: u32 = 50;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CountryRef {
    pub id: String,
    pub value: String,
}

/// One dated data point for one country.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Observation {
    pub country: CountryRef,
    #[serde(default)]
    pub countryiso3code: String,
    pub date: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WorldBankSource {
    config: WorldBankConfig,
}

impl WorldBankSource {
    pub fn new(config: WorldBankConfig) -> Self {
        Self { config }
    }

    /// URL for one page of the indicator query over every reference country.
    pub fn page_url(&self, page: u32) -> Result<Url, PipelineError> {
        let codes = REFERENCE_COUNTRIES.iter().map(|r| r.iso2).join(";");
        let (start, end) = self.config.date_range();
        let raw = format!(
            "{}/v2/country/{}/indicator/{}",
            self.config.base_url.trim_end_matches('/'),
            codes,
            urlencoding::encode(&self.config.indicator)
        );
        let mut url = Url::parse(&raw).map_err(|e| PipelineError::Config(format!("{raw}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("date", &format!("{start}:{end}"))
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

impl SourceAdapter for WorldBankSource {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn metric(&self) -> Metric {
        Metric::GdpPpp
    }

    fn identifier_kind(&self) -> IdentifierKind {
        IdentifierKind::Iso2
    }

    #[instrument(level = "info", skip_all, fields(indicator = %self.config.indicator))]
    async fn fetch<F: FetchAsync>(&self, http: &F) -> Result<SourceTable, PipelineError> {
        let mut observations = Vec::new();
        let mut page = 1;
        loop {
            let url = self.page_url(page)?;
            let body = http
                .get_text(url.as_str())
                .await
                .map_err(|e| PipelineError::unavailable(SOURCE, e))?;
            let (pages, mut batch) = parse_page(&body)?;
            debug!(page, pages, count = batch.len(), "Fetched World Bank page");
            observations.append(&mut batch);
            if page >= pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        let total = observations.len();
        let latest = latest_observations(observations);
        info!(
            observations = total,
            countries = latest.len(),
            "Selected most recent observation per country"
        );
        filter_to_reference(to_table(&latest), &IdentifierMap::for_kind(self.identifier_kind()))
    }
}

/// Parse one response page into `(total_pages, observations)`.
pub fn parse_page(body: &str) -> Result<(u32, Vec<Observation>), PipelineError> {
    let doc: Vec<Value> = serde_json::from_str(body).map_err(|e| {
        PipelineError::parse(
            SOURCE,
            format!("invalid JSON ({e}): {}", truncate_for_log(body, 200)),
        )
    })?;

    let meta = doc
        .first()
        .ok_or_else(|| PipelineError::parse(SOURCE, "empty response array"))?;
    if let Some(messages) = meta.get("message") {
        return Err(PipelineError::parse(SOURCE, format!("API error: {messages}")));
    }
    let pages = meta.get("pages").and_then(as_u32).unwrap_or(1);

    let observations = match doc.get(1) {
        None | Some(Value::Null) => Vec::new(),
        Some(data) => serde_json::from_value(data.clone())
            .map_err(|e| PipelineError::parse(SOURCE, format!("unexpected observation shape: {e}")))?,
    };
    Ok((pages, observations))
}

/// The API reports paging fields as numbers, older versions as strings.
fn as_u32(v: &Value) -> Option<u32> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

/// Keep the latest non-null observation per country.
///
/// Observations are stably sorted by `(country id, date)` and the last one
/// per country wins, so equal dates resolve to the later input row.
pub fn latest_observations(observations: Vec<Observation>) -> Vec<Observation> {
    let mut latest: BTreeMap<String, Observation> = BTreeMap::new();
    let (present, missing): (Vec<_>, Vec<_>) =
        observations.into_iter().partition(|o| o.value.is_some());
    if !missing.is_empty() {
        debug!(count = missing.len(), "Skipping null observations");
    }
    for obs in present
        .into_iter()
        .sorted_by(|a, b| (&a.country.id, &a.date).cmp(&(&b.country.id, &b.date)))
    {
        latest.insert(obs.country.id.clone(), obs);
    }
    for record in &REFERENCE_COUNTRIES {
        if !latest.contains_key(record.iso2) {
            warn!(country = record.name, "No non-null World Bank observation in range");
        }
    }
    latest.into_values().collect()
}

fn to_table(observations: &[Observation]) -> SourceTable {
    SourceTable {
        source: SOURCE.to_string(),
        headers: ["iso2", "country", "date", "value"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: observations
            .iter()
            .map(|o| {
                vec![
                    o.country.id.clone(),
                    o.country.value.clone(),
                    o.date.clone(),
                    o.value.map(|v| v.to_string()).unwrap_or_default(),
                ]
            })
            .collect(),
        identifier_column: "iso2".to_string(),
        value_column: "value".to_string(),
        unmapped: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::http::HttpFetcher;
    use httpmock::prelude::*;
    use serde_json::json;

    fn obs(id: &str, date: &str, value: Option<f64>) -> Observation {
        Observation {
            country: CountryRef {
                id: id.into(),
                value: format!("name of {id}"),
            },
            countryiso3code: String::new(),
            date: date.into(),
            value,
        }
    }

    fn config_for(server: &MockServer) -> WorldBankConfig {
        WorldBankConfig {
            base_url: server.base_url(),
            start_year: Some(2020),
            end_year: Some(2023),
            ..WorldBankConfig::default()
        }
    }

    #[test]
    fn picks_latest_non_null_observation() {
        let picked = latest_observations(vec![
            obs("RU", "2022", Some(36_000.0)),
            obs("RU", "2023", None),
            obs("RU", "2021", Some(32_000.0)),
            obs("EE", "2023", Some(48_000.0)),
        ]);
        assert_eq!(picked.len(), 2);
        let ru = picked.iter().find(|o| o.country.id == "RU").unwrap();
        assert_eq!(ru.date, "2022");
        assert_eq!(ru.value, Some(36_000.0));
    }

    #[test]
    fn duplicate_dates_resolve_deterministically() {
        let input = vec![
            obs("KG", "2023", Some(1.0)),
            obs("KG", "2023", Some(2.0)),
        ];
        for _ in 0..5 {
            let picked = latest_observations(input.clone());
            assert_eq!(picked.len(), 1);
            assert_eq!(picked[0].value, Some(2.0));
        }
    }

    #[test]
    fn page_url_lists_reference_codes() {
        let source = WorldBankSource::new(WorldBankConfig {
            start_year: Some(2015),
            end_year: Some(2023),
            ..WorldBankConfig::default()
        });
        let url = source.page_url(2).unwrap();
        assert_eq!(url.host_str(), Some("api.worldbank.org"));
        assert!(url.path().starts_with("/v2/country/RU;UA;GE;"));
        assert!(url.path().ends_with("/indicator/NY.GDP.PCAP.PP.CD"));
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("date".into(), "2015:2023".into())));
        assert!(query.contains(&("page".into(), "2".into())));
        assert!(query.contains(&("format".into(), "json".into())));
    }

    #[test]
    fn api_error_payload_is_parse_error() {
        let body = r#"[{"message":[{"id":"120","key":"Invalid value","value":"The provided parameter value is not valid"}]}]"#;
        let err = parse_page(body).unwrap_err();
        assert!(matches!(err, PipelineError::ParseError { .. }));
        assert!(err.to_string().contains("Invalid value"));
    }

    #[test]
    fn null_data_page_is_empty() {
        let (pages, data) = parse_page(r#"[{"page":1,"pages":0,"total":0}, null]"#).unwrap();
        assert_eq!(pages, 0);
        assert!(data.is_empty());
    }

    #[test]
    fn html_body_is_parse_error() {
        assert!(matches!(
            parse_page("<html>maintenance</html>"),
            Err(PipelineError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn follows_pagination_and_maps_iso2() {
        let server = MockServer::start_async().await;
        let page1 = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_includes("/indicator/NY.GDP.PCAP.PP.CD")
                    .query_param("page", "1");
                then.status(200).json_body(json!([
                    {"page": 1, "pages": 2, "per_page": 1000, "total": 3},
                    [
                        {"country": {"id": "RU", "value": "Russian Federation"},
                         "countryiso3code": "RUS", "date": "2023", "value": 41887.6},
                        {"country": {"id": "RU", "value": "Russian Federation"},
                         "countryiso3code": "RUS", "date": "2022", "value": 39000.0}
                    ]
                ]));
            })
            .await;
        let page2 = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_includes("/indicator/NY.GDP.PCAP.PP.CD")
                    .query_param("page", "2");
                then.status(200).json_body(json!([
                    {"page": "2", "pages": "2", "per_page": "1000", "total": 3},
                    [
                        {"country": {"id": "KG", "value": "Kyrgyz Republic"},
                         "countryiso3code": "KGZ", "date": "2023", "value": 6500.25},
                        {"country": {"id": "XK", "value": "Kosovo"},
                         "countryiso3code": "XKX", "date": "2023", "value": 15000.0}
                    ]
                ]));
            })
            .await;

        let http = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let table = WorldBankSource::new(config_for(&server))
            .fetch(&http)
            .await
            .unwrap();
        page1.assert_async().await;
        page2.assert_async().await;

        // Kosovo is outside the reference set
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["KG", "Kyrgyz Republic", "2023", "6500.25"]);
        assert_eq!(table.rows[1], vec!["RU", "Russian Federation", "2023", "41887.6"]);
        assert_eq!(table.unmapped, vec!["XK"]);
    }
}
