//! Command-line arguments for the table client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use stock_common::net::{DEFAULT_LIMIT, DEFAULT_PORT, addr};

use crate::model::debounce::DEBOUNCE_MS;
use crate::model::viewport::{OVERSCAN, ROW_HEIGHT, VIEWPORT_HEIGHT};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base URL of the stock query server.
    #[clap(long, env = "STOCKS_SERVER", default_value_t = format!("http://{}", addr("127.0.0.1", DEFAULT_PORT)))]
    pub server: String,

    /// Rows requested per page.
    #[clap(long, default_value_t = DEFAULT_LIMIT)]
    pub page_size: usize,

    /// Height of the scroll container.
    #[clap(long, default_value_t = VIEWPORT_HEIGHT)]
    pub viewport_height: f64,

    /// Estimated height of one row.
    #[clap(long, default_value_t = ROW_HEIGHT)]
    pub row_height: f64,

    /// Rows materialized beyond each edge of the viewport.
    #[clap(long, default_value_t = OVERSCAN)]
    pub overscan: usize,

    /// Quiet period before a typed filter is sent, in milliseconds.
    #[clap(long, default_value_t = DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Timeout of a single page request, in seconds.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}
