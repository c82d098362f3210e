//! Stock query HTTP server.
//!
//! Serves `GET /api/stocks`, a paged, filterable and sortable view over the
//! current market snapshot. Internally it wires together:
//!
//! - `FeedCache` over an `HttpSnapshotSource`: pulls the full upstream snapshot
//!   and keeps it for the revalidation window (30 minutes by default).
//! - `normalizer`: drops ineligible records and derives `PowerI` and the
//!   formatted `tvol`/`tval` fields.
//! - `query`: applies the request's filter, sort and offset/limit.
//!
//! Upstream failures never escape as faults: a throttled upstream becomes a
//! 429 with `RATE_LIMIT`, anything else a 500 with `FETCH_ERROR`, both with an
//! empty page.
#![warn(missing_docs)]
use crate::args::Args;
use crate::model::feed::{FeedCache, HttpSnapshotSource};
use crate::routes::{AppState, create_router};
use clap::Parser;
use log::{error, info};
use stock_common::{Result, StockError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

mod args;
pub mod model;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let source = Arc::new(HttpSnapshotSource::new(
        args.upstream_url.clone(),
        Duration::from_secs(args.upstream_timeout_secs),
    )?);
    let feed = FeedCache::new(source, Duration::from_secs(args.revalidate_secs));
    info!(
        "Upstream feed configured, revalidating every {}s",
        args.revalidate_secs
    );

    let app = create_router(Arc::new(AppState::new(feed)));

    let socket_addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| StockError::Config(format!("Invalid bind address {}: {}", args.bind, e)))?;
    let listener = TcpListener::bind(socket_addr).await?;
    info!("Stock query server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stock query server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received. Shutting down server..."),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
