//! Command-line arguments for the stock query server.
//!
//! This module defines the CLI interface using `clap`. Every option can also be
//! supplied through the environment.
use clap::Parser;
use stock_common::net::{DEFAULT_PORT, REVALIDATE_SECS, addr};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address the HTTP server binds to.
    #[clap(long, env = "STOCKS_BIND", default_value_t = addr("0.0.0.0", DEFAULT_PORT))]
    pub bind: String,

    /// URL of the upstream feed returning the full symbol snapshot as a JSON array.
    /// It usually carries an access key, so prefer the environment variable.
    #[clap(long, env = "STOCKS_UPSTREAM_URL", hide_env_values = true)]
    pub upstream_url: String,

    /// How long a fetched snapshot is served before the upstream is asked again, in seconds.
    #[clap(long, env = "STOCKS_REVALIDATE_SECS", default_value_t = REVALIDATE_SECS)]
    pub revalidate_secs: u64,

    /// Timeout of a single upstream request, in seconds.
    #[clap(long, env = "STOCKS_UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,
}
