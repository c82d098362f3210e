//! Page requests against the stock query endpoint.
//!
//! `StocksApi` is the seam between the event loop and the network. The HTTP
//! implementation classifies responses into the shared error taxonomy:
//! 429 is `RateLimited`, any other non-success status or transport failure is
//! `FetchFailed`, and a body that is not a page is `MalformedResponse`.
//! `FetchDispatcher` runs one request on a background thread and posts the
//! completion back to the loop.
use log::{debug, error};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use stock_common::net::{STOCKS_PATH, endpoint};
use stock_common::{ErrorBody, PageResult, QueryParams, Result, StockError};

use crate::model::window::{FetchCompletion, FetchRequest};

/// Source of result pages.
pub trait StocksApi: Send + Sync {
    /// Fetches one page for `params`.
    fn fetch_page(&self, params: &QueryParams) -> Result<PageResult>;
}

/// `StocksApi` over HTTP.
pub struct HttpStocksApi {
    url: String,
    client: Client,
}

impl HttpStocksApi {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: endpoint(base_url, STOCKS_PATH),
            client,
        })
    }
}

impl StocksApi for HttpStocksApi {
    fn fetch_page(&self, params: &QueryParams) -> Result<PageResult> {
        let response = self
            .client
            .get(&self.url)
            .query(&params.to_query_pairs())
            .send()
            .map_err(|e| StockError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let message = response
                .json::<ErrorBody>()
                .map(|body| body.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(StockError::RateLimited(message));
        }
        if !status.is_success() {
            return Err(StockError::FetchFailed(format!("server status {}", status)));
        }

        response
            .json::<PageResult>()
            .map_err(|e| StockError::MalformedResponse(e.to_string()))
    }
}

/// Runs requests off the event loop.
pub struct FetchDispatcher;

impl FetchDispatcher {
    /// Executes `request` on a new thread and sends its completion to `done_tx`.
    pub fn spawn(api: Arc<dyn StocksApi>, request: FetchRequest, done_tx: Sender<FetchCompletion>) {
        debug!(
            "Dispatching {:?} request #{} at offset {}",
            request.kind, request.generation, request.params.offset
        );
        thread::spawn(move || {
            let result = api.fetch_page(&request.params);
            if let Err(e) = done_tx.send(FetchCompletion::new(&request, result)) {
                error!("Failed to deliver page response: {}", e);
            }
        });
    }
}
