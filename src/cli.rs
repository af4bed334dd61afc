//! Command-line interface definitions.
//!
//! Options can also be supplied through environment variables where noted.
//! Anything not given here falls back to the YAML config, then to defaults.

use crate::models::Metric;
use clap::Parser;

/// Command-line arguments for the post-Soviet index dashboard builder.
///
/// # Examples
///
/// ```sh
/// # Fetch everything with stock settings, write into ./site
/// post_soviet_index -o ./site
///
/// # Open the dashboard on GDP and use a custom config
/// post_soviet_index -o ./site -c config.yaml -m "GDP PPP"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory for dashboard.html, reconciled.json and reconciled.md
    #[arg(short, long, env = "PSID_OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "PSID_CONFIG")]
    pub config: Option<String>,

    /// Metric shown when the dashboard opens ("Freedom Index", "economic_freedom", ...)
    #[arg(short, long, value_parser = parse_metric)]
    pub metric: Option<Metric>,

    /// Per-request timeout in seconds, overriding the config file
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    Metric::parse(s).ok_or_else(|| {
        let known: Vec<&str> = Metric::ALL.iter().map(|m| m.label()).collect();
        format!("unknown metric '{s}', expected one of: {}", known.join(", "))
    })
}
