//! Stock table client: an infinitely scrolling, sortable and filterable view
//! over the stock query server, driven from the terminal.
//!
//! The first page is loaded before the loop starts. After that, scrolling
//! near the end of the loaded rows pulls the next page, `sort <key>` cycles a
//! column's order and `filter <text>` narrows the rows once typing settles.
//! Both of the latter discard the loaded rows and start again from offset 0;
//! answers to superseded requests are ignored.
//!
//! Usage example (CLI):
//! ```bash
//! stock_client --server http://127.0.0.1:3000 --page-size 20
//! ```
#![warn(missing_docs)]
mod app;
mod args;
mod fetcher;
mod input;
mod model;
mod render;

use crate::app::App;
use crate::args::Args;
use crate::fetcher::{HttpStocksApi, StocksApi};
use crate::input::{UiEvent, start_input_thread};
use crate::model::debounce::Debouncer;
use crate::model::viewport::{Geometry, Viewport};
use crate::model::window::WindowController;
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use stock_common::{QueryParams, Result, StockError};

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    if args.page_size == 0 {
        return Err(StockError::Config("--page-size must be positive".into()));
    }

    let api: Arc<dyn StocksApi> = Arc::new(HttpStocksApi::new(
        &args.server,
        Duration::from_secs(args.request_timeout_secs),
    )?);
    info!("Loading first page from {}", args.server);

    let initial = api.fetch_page(&QueryParams {
        limit: args.page_size,
        ..Default::default()
    });
    if let Err(e) = &initial {
        warn!("Initial load failed: {}", e);
    }
    let controller = WindowController::from_initial_page(initial, args.page_size);

    let (ui_tx, ui_rx) = crossbeam_channel::unbounded();
    {
        let ui_tx = ui_tx.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down...");
            let _ = ui_tx.send(UiEvent::Quit);
        })
        .map_err(|e| StockError::Config(format!("Failed to set Ctrl+C handler: {}", e)))?;
    }
    start_input_thread(ui_tx);

    let geometry = Geometry {
        row_height: args.row_height,
        viewport_height: args.viewport_height,
        overscan: args.overscan,
    };
    App::new(
        controller,
        Viewport::new(geometry),
        Debouncer::new(Duration::from_millis(args.debounce_ms)),
        api,
    )
    .run(ui_rx)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
