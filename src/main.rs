//! # Post-Soviet Index
//!
//! Collects three country-level indicators for the fifteen post-Soviet
//! states, reconciles them onto one canonical set of country names, and
//! writes an interactive choropleth dashboard along with the raw data.
//!
//! ## Usage
//!
//! ```sh
//! post_soviet_index -o ./site
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Acquisition**: each source adapter fetches its table and keeps only
//!    rows for the reference countries
//! 2. **Normalization**: identifiers are resolved to canonical countries
//!    through an explicit mapping, values are parsed to numbers
//! 3. **Reconciliation**: the metric tables are inner-joined on country
//! 4. **Output**: dashboard HTML, JSON and Markdown are written
//!
//! Any adapter failure stops the run before outputs are touched.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod countries;
mod error;
mod http;
mod models;
mod normalize;
mod outputs;
mod reconcile;
mod sources;
mod utils;

use cli::Cli;
use config::Config;
use countries::IdentifierMap;
use error::PipelineError;
use http::{FetchAsync, HttpFetcher, RetryFetch};
use models::{Metric, MetricTable, ReconciledTable};
use normalize::normalize;
use outputs::{dashboard, json, markdown};
use reconcile::reconcile;
use sources::SourceAdapter;
use sources::freedom::FreedomSource;
use sources::heritage::HeritageSource;
use sources::worldbank::WorldBankSource;
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("post_soviet_index starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.config, ?args.metric, "Parsed CLI arguments");

    // ---- Config ----
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Could not load configuration");
            return Err(e.into());
        }
    };
    if let Some(secs) = args.timeout_secs {
        config.http.timeout_secs = secs;
        config.validate()?;
    }
    let selected = args
        .metric
        .or(config.default_metric)
        .unwrap_or(Metric::FreedomIndex);

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let http = RetryFetch::from_config(HttpFetcher::new(&config.http)?, &config.http);
    info!(?http, timeout_secs = config.http.timeout_secs, "HTTP client ready");

    // ---- Acquire, normalize, reconcile ----
    let table = match run_pipeline(&config, &http).await {
        Ok(table) => table,
        Err(e) => {
            error!(
                source_name = e.source_name().unwrap_or("pipeline"),
                error = %e,
                "Pipeline failed; no outputs written"
            );
            return Err(e.into());
        }
    };

    // ---- Outputs ----
    if let Err(e) = write_outputs(&table, selected, &args.output_dir).await {
        error!(error = %e, "Failed writing outputs");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        countries = ?table.countries(),
        "Execution complete"
    );

    Ok(())
}

/// Fetch one source and resolve it onto canonical countries.
#[instrument(level = "info", skip_all, fields(source = adapter.name()))]
async fn acquire<A, F>(adapter: &A, http: &F) -> Result<MetricTable, PipelineError>
where
    A: SourceAdapter,
    F: FetchAsync,
{
    let raw = adapter.fetch(http).await?;
    let identifiers = IdentifierMap::for_kind(adapter.identifier_kind());
    let table = normalize(&raw, &identifiers, adapter.metric())?;
    info!(
        countries = table.values.len(),
        unmapped = table.unmapped.len(),
        "Source acquired"
    );
    Ok(table)
}

/// Run every adapter in order, then join.
///
/// Column order in the result is Freedom Index, Economic Freedom, GDP PPP.
#[instrument(level = "info", skip_all)]
async fn run_pipeline<F: FetchAsync>(
    config: &Config,
    http: &F,
) -> Result<ReconciledTable, PipelineError> {
    let freedom = FreedomSource::from_config(&config.freedom);
    let heritage = HeritageSource::new(config.heritage.clone());
    let worldbank = WorldBankSource::new(config.worldbank.clone());

    let tables = vec![
        acquire(&freedom, http).await?,
        acquire(&heritage, http).await?,
        acquire(&worldbank, http).await?,
    ];
    reconcile(&tables)
}

async fn write_outputs(
    table: &ReconciledTable,
    selected: Metric,
    output_dir: &str,
) -> Result<(), PipelineError> {
    dashboard::write_dashboard(table, selected, output_dir).await?;
    json::write_reconciled(table, output_dir).await?;
    markdown::write_markdown(table, output_dir).await?;
    Ok(())
}
