//! Window controller: the client-side state machine behind the table.
//!
//! The controller owns the row buffer and the query parameters that produced
//! it. It never performs I/O itself: every operation that needs data returns a
//! `FetchRequest`, and the caller hands the eventual `FetchCompletion` back to
//! [`WindowController::apply`].
//!
//! Ordering rules:
//! - At most one request is in flight from the controller's point of view;
//!   `fetch_more` is a no-op while `loading`.
//! - Every issued request gets the next generation number. A parameter change
//!   (sort click, committed filter) issues a reset request even when an older
//!   one is still running, and only the completion carrying the latest
//!   generation is applied. Late completions of superseded requests are
//!   dropped without touching the buffer.
//! - The buffer is always a prefix of the server's filtered and sorted result
//!   for the current parameters, and `offset == rows.len()` once it settles.
use log::{debug, warn};
use stock_common::{ColumnKey, DisplayRecord, PageResult, QueryParams, SortOrder, StockError};

/// Message shown once the server reports throttling.
pub const RATE_LIMIT_MESSAGE: &str = "Request limit reached. Try again a little later.";
/// Message shown for any other failed request.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to load data";

/// Why a request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page for new parameters; replaces the buffer.
    Reset,
    /// Next page at the current offset; appends to the buffer.
    More,
}

/// A page request the caller must execute.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Generation the completion must carry to be applied.
    pub generation: u64,
    /// Reset or append.
    pub kind: FetchKind,
    /// Query to send.
    pub params: QueryParams,
}

/// Result of an executed `FetchRequest`.
#[derive(Debug)]
pub struct FetchCompletion {
    /// Generation of the request.
    pub generation: u64,
    /// Kind of the request.
    pub kind: FetchKind,
    /// Page, or the classified failure.
    pub result: Result<PageResult, StockError>,
}

impl FetchCompletion {
    /// Pairs a request with its result.
    pub fn new(request: &FetchRequest, result: Result<PageResult, StockError>) -> Self {
        Self {
            generation: request.generation,
            kind: request.kind,
            result,
        }
    }
}

/// Effective mode used for rendering decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing in flight, more rows may follow.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request failed; scrolling retries unless exhausted.
    Error,
    /// No further pages will be requested for the current parameters.
    Exhausted,
}

/// Row buffer plus the parameters that produced it.
#[derive(Debug)]
pub struct WindowController {
    rows: Vec<DisplayRecord>,
    offset: usize,
    has_more: bool,
    loading: bool,
    error: Option<String>,
    sort_key: Option<ColumnKey>,
    order: SortOrder,
    filter_text: String,
    debounced_filter_text: String,
    page_size: usize,
    generation: u64,
    total: Option<usize>,
}

impl WindowController {
    /// Creates a controller around the server-rendered first page.
    pub fn new(initial_rows: Vec<DisplayRecord>, page_size: usize) -> Self {
        Self {
            offset: initial_rows.len(),
            rows: initial_rows,
            has_more: true,
            loading: false,
            error: None,
            sort_key: None,
            order: SortOrder::Asc,
            filter_text: String::new(),
            debounced_filter_text: String::new(),
            page_size: page_size.max(1),
            generation: 0,
            total: None,
        }
    }

    /// Creates a controller from the outcome of the initial page request.
    ///
    /// A failed initial load starts with an empty buffer and the error shown.
    pub fn from_initial_page(initial: Result<PageResult, StockError>, page_size: usize) -> Self {
        match initial {
            Ok(page) => {
                let mut controller = Self::new(page.rows, page_size);
                controller.total = Some(page.total);
                controller
            }
            Err(err) => {
                let mut controller = Self::new(Vec::new(), page_size);
                controller.record_failure(&err);
                controller
            }
        }
    }

    /// Loaded rows, in server order.
    pub fn rows(&self) -> &[DisplayRecord] {
        &self.rows
    }

    /// Offset of the next page.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether another page may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// User-visible error of the last request.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Active sort column.
    pub fn sort_key(&self) -> Option<ColumnKey> {
        self.sort_key
    }

    /// Active sort direction.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Filter text as typed.
    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Filter text the buffer was queried with.
    pub fn debounced_filter_text(&self) -> &str {
        &self.debounced_filter_text
    }

    /// Matching record count reported by the last applied page.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Effective mode.
    pub fn mode(&self) -> Mode {
        if self.loading {
            Mode::Loading
        } else if !self.has_more {
            Mode::Exhausted
        } else if self.error.is_some() {
            Mode::Error
        } else {
            Mode::Idle
        }
    }

    /// Records a keystroke in the filter box. Takes effect on the query only
    /// once committed through [`Self::commit_filter`].
    pub fn set_filter_text(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
    }

    /// Commits a debounced filter value; issues a reset if it changed.
    pub fn commit_filter(&mut self, text: impl Into<String>) -> Option<FetchRequest> {
        let text = text.into();
        if text == self.debounced_filter_text {
            return None;
        }
        self.debounced_filter_text = text;
        Some(self.reset())
    }

    /// Header click: flips the order on the active column, otherwise sorts
    /// ascending by `key`. Always a parameter change.
    pub fn click_sort(&mut self, key: ColumnKey) -> FetchRequest {
        if self.sort_key == Some(key) {
            self.order = self.order.flipped();
        } else {
            self.sort_key = Some(key);
            self.order = SortOrder::Asc;
        }
        self.reset()
    }

    /// Next page at the current offset, unless exhausted or already loading.
    pub fn fetch_more(&mut self) -> Option<FetchRequest> {
        if !self.has_more || self.loading {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(self.issue(FetchKind::More, self.offset))
    }

    /// Applies a completion. Returns `false` if it belonged to a superseded
    /// request and was discarded.
    pub fn apply(&mut self, completion: FetchCompletion) -> bool {
        if completion.generation != self.generation {
            debug!(
                "Discarding stale {:?} response (generation {}, latest {})",
                completion.kind, completion.generation, self.generation
            );
            return false;
        }
        self.loading = false;

        match completion.result {
            Ok(page) => {
                self.total = Some(page.total);
                match completion.kind {
                    FetchKind::Reset => {
                        self.has_more = !page.rows.is_empty();
                        self.rows = page.rows;
                        self.offset = self.rows.len();
                    }
                    FetchKind::More if page.rows.is_empty() => self.has_more = false,
                    FetchKind::More => {
                        self.offset += page.rows.len();
                        self.rows.extend(page.rows);
                    }
                }
            }
            Err(err) => self.record_failure(&err),
        }
        true
    }

    fn record_failure(&mut self, err: &StockError) {
        warn!("Page request failed: {}", err);
        if err.is_rate_limited() {
            self.has_more = false;
            self.error = Some(RATE_LIMIT_MESSAGE.to_string());
        } else {
            self.error = Some(FETCH_ERROR_MESSAGE.to_string());
        }
    }

    fn reset(&mut self) -> FetchRequest {
        self.rows.clear();
        self.offset = 0;
        self.has_more = true;
        self.loading = true;
        self.error = None;
        self.total = None;
        self.issue(FetchKind::Reset, 0)
    }

    fn issue(&mut self, kind: FetchKind, offset: usize) -> FetchRequest {
        self.generation += 1;
        FetchRequest {
            generation: self.generation,
            kind,
            params: QueryParams {
                offset,
                limit: self.page_size,
                sort: self.sort_key,
                order: self.order,
                filter: self.debounced_filter_text.clone(),
            },
        }
    }
}
