//! Event loop of the table client.
//!
//! A single thread owns the `WindowController`, the `Viewport` and the filter
//! `Debouncer`, and multiplexes three sources with crossbeam `select!`:
//!
//! - UI events from the input thread (filter text, header clicks, scrolling),
//! - page completions from fetch worker threads,
//! - the debounce deadline, armed only while a filter commit is pending.
//!
//! After every event the loop recomputes the visible window, fires the
//! boundary trigger if the window reaches the end of the buffer, and redraws.
//! A failed page disarms the trigger so the error stays on screen; the next
//! scroll or parameter change arms it again.
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, after, never, select, unbounded};
use log::{debug, info};
use stock_common::{Result, StockError};

use crate::fetcher::{FetchDispatcher, StocksApi};
use crate::input::{HELP, ScrollAction, UiEvent};
use crate::model::debounce::Debouncer;
use crate::model::viewport::{Viewport, should_fetch_more, slot_count};
use crate::model::window::{FetchCompletion, FetchRequest, WindowController};
use crate::render::render;

/// Client state plus the channels its fetches report on.
pub struct App {
    controller: WindowController,
    viewport: Viewport,
    debouncer: Debouncer<String>,
    api: Arc<dyn StocksApi>,
    done_tx: Sender<FetchCompletion>,
    done_rx: Receiver<FetchCompletion>,
    boundary_armed: bool,
}

impl App {
    /// Assembles the client.
    pub fn new(
        controller: WindowController,
        viewport: Viewport,
        debouncer: Debouncer<String>,
        api: Arc<dyn StocksApi>,
    ) -> Self {
        let (done_tx, done_rx) = unbounded();
        let boundary_armed = controller.error().is_none();
        Self {
            controller,
            viewport,
            debouncer,
            api,
            done_tx,
            done_rx,
            boundary_armed,
        }
    }

    /// Current controller state.
    pub fn controller(&self) -> &WindowController {
        &self.controller
    }

    /// Runs until `Quit`, or until input ends and nothing is left in flight.
    pub fn run(mut self, ui_rx: Receiver<UiEvent>) -> Result<()> {
        let mut input_open = true;
        let done_rx = self.completions().clone();
        println!("{}", self.refresh());

        loop {
            if !input_open && !self.controller.is_loading() && !self.debouncer.is_pending() {
                break;
            }
            let ui = if input_open { ui_rx.clone() } else { never() };
            let timer = self
                .debouncer
                .deadline()
                .map_or_else(never, |deadline| {
                    after(deadline.saturating_duration_since(Instant::now()))
                });

            select! {
                recv(ui) -> msg => match msg {
                    Ok(UiEvent::Quit) => break,
                    Ok(UiEvent::Help) => {
                        println!("{}", HELP);
                        continue;
                    }
                    Ok(event) => self.handle_event(event, Instant::now()),
                    Err(_) => {
                        debug!("Input channel closed");
                        input_open = false;
                        continue;
                    }
                },
                recv(done_rx) -> msg => {
                    let completion = msg.map_err(|e| StockError::ChannelRecv(e.to_string()))?;
                    if !self.apply(completion) {
                        continue;
                    }
                },
                recv(timer) -> _ => self.commit_filter(Instant::now()),
            }
            println!("{}", self.refresh());
        }

        info!(
            "Client stopping with {} rows loaded",
            self.controller().rows().len()
        );
        Ok(())
    }

    /// Applies one UI event at `now`.
    pub fn handle_event(&mut self, event: UiEvent, now: Instant) {
        let count = slot_count(self.controller.rows().len(), self.controller.has_more());
        match event {
            UiEvent::Filter(text) => {
                self.controller.set_filter_text(text.clone());
                self.debouncer.input(text, now);
            }
            UiEvent::Sort(key) => {
                let request = self.controller.click_sort(key);
                self.viewport.scroll_to_top();
                self.boundary_armed = true;
                self.dispatch(Some(request));
            }
            UiEvent::Scroll(action) => {
                self.boundary_armed = true;
                match action {
                    ScrollAction::Rows(n) => self.viewport.scroll_rows(n, count),
                    ScrollAction::Pages(n) => self.viewport.scroll_pages(n, count),
                    ScrollAction::Top => self.viewport.scroll_to_top(),
                    ScrollAction::Bottom => self.viewport.scroll_to_bottom(count),
                }
            }
            UiEvent::Redraw | UiEvent::Help | UiEvent::Quit => {}
        }
    }

    /// Commits the debounced filter if its quiet period is over at `now`.
    pub fn commit_filter(&mut self, now: Instant) {
        if let Some(text) = self.debouncer.poll(now) {
            let request = self.controller.commit_filter(text);
            if request.is_some() {
                self.viewport.scroll_to_top();
                self.boundary_armed = true;
            }
            self.dispatch(request);
        }
    }

    /// Applies a page completion; returns `false` if it was stale.
    pub fn apply(&mut self, completion: FetchCompletion) -> bool {
        let applied = self.controller.apply(completion);
        if applied && self.controller.error().is_some() {
            debug!("Boundary trigger paused until the next scroll");
            self.boundary_armed = false;
        }
        applied
    }

    fn dispatch(&self, request: Option<FetchRequest>) {
        if let Some(request) = request {
            FetchDispatcher::spawn(Arc::clone(&self.api), request, self.done_tx.clone());
        }
    }

    /// Clamps the scroll position, fires the boundary trigger and draws.
    pub fn refresh(&mut self) -> String {
        let rows_len = self.controller.rows().len();
        let count = slot_count(rows_len, self.controller.has_more());
        self.viewport.clamp(count);
        let window = self.viewport.window(count);
        let at_boundary = should_fetch_more(
            window.as_ref(),
            rows_len,
            self.controller.has_more(),
            self.controller.is_loading(),
        );
        if self.boundary_armed && at_boundary {
            let request = self.controller.fetch_more();
            self.dispatch(request);
        }
        render(&self.controller, &self.viewport)
    }

    /// Receiver of page completions, for driving the loop by hand.
    pub fn completions(&self) -> &Receiver<FetchCompletion> {
        &self.done_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::VecApi;
    use crate::model::viewport::Geometry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use stock_common::{ColumnKey, DisplayRecord, PageResult, QueryParams};

    /// Fails every request with a transport error and counts the attempts.
    struct DownApi {
        calls: AtomicUsize,
    }

    impl StocksApi for DownApi {
        fn fetch_page(&self, _params: &QueryParams) -> Result<PageResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StockError::FetchFailed("connection refused".into()))
        }
    }

    fn down_app(controller: WindowController) -> (App, Arc<DownApi>) {
        let api = Arc::new(DownApi {
            calls: AtomicUsize::new(0),
        });
        let app = App::new(
            controller,
            Viewport::new(Geometry::default()),
            Debouncer::new(Duration::from_millis(400)),
            api.clone(),
        );
        (app, api)
    }

    fn app(total: usize, initial: usize) -> App {
        let rows: Vec<DisplayRecord> = (0..total)
            .map(|i| DisplayRecord {
                symbol: Some(format!("S{}", i)),
                ..Default::default()
            })
            .collect();
        let controller = WindowController::new(rows[..initial].to_vec(), 20);
        App::new(
            controller,
            Viewport::new(Geometry::default()),
            Debouncer::new(Duration::from_millis(400)),
            Arc::new(VecApi { rows }),
        )
    }

    fn settle(app: &mut App) {
        let completion = app
            .completions()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert!(app.apply(completion));
    }

    #[test]
    fn boundary_trigger_loads_until_the_window_is_covered() {
        let mut app = app(100, 20);
        // 20 rows with overscan reach the end of the buffer
        app.refresh();
        assert!(app.controller().is_loading());
        // a second refresh while loading does not issue another request
        app.refresh();
        assert_eq!(app.controller().generation(), 1);

        settle(&mut app);
        assert_eq!(app.controller().offset(), 40);
        app.refresh();
        assert!(!app.controller().is_loading());
    }

    #[test]
    fn scrolling_to_the_bottom_pages_until_exhausted() {
        let mut app = app(25, 20);
        app.refresh();
        settle(&mut app);
        assert_eq!(app.controller().rows().len(), 25);

        app.handle_event(UiEvent::Scroll(ScrollAction::Bottom), Instant::now());
        app.refresh();
        settle(&mut app);
        assert!(!app.controller().has_more());
        assert_eq!(app.controller().offset(), 25);

        app.refresh();
        assert!(!app.controller().is_loading());
    }

    #[test]
    fn filter_commits_only_after_quiet_period() {
        let mut app = app(30, 20);
        let t0 = Instant::now();
        app.handle_event(UiEvent::Filter("s1".into()), t0);
        app.commit_filter(t0 + Duration::from_millis(100));
        assert_eq!(app.controller().debounced_filter_text(), "");

        app.handle_event(UiEvent::Filter("s2".into()), t0 + Duration::from_millis(200));
        app.commit_filter(t0 + Duration::from_millis(500));
        assert_eq!(app.controller().debounced_filter_text(), "");

        app.commit_filter(t0 + Duration::from_millis(600));
        assert_eq!(app.controller().debounced_filter_text(), "s2");
        assert!(app.controller().is_loading());
        assert!(app.controller().rows().is_empty());
    }

    #[test]
    fn sort_click_resets_buffer_and_scroll() {
        let mut app = app(60, 20);
        app.handle_event(UiEvent::Scroll(ScrollAction::Rows(5)), Instant::now());
        app.handle_event(UiEvent::Sort(ColumnKey::Name), Instant::now());
        assert!(app.controller().rows().is_empty());
        assert_eq!(app.controller().sort_key(), Some(ColumnKey::Name));

        settle(&mut app);
        assert_eq!(app.controller().offset(), 20);
        assert!(app.controller().has_more());
    }

    #[test]
    fn failed_page_stays_on_screen_until_the_user_scrolls() {
        let (mut app, api) = down_app(WindowController::new(vec![DisplayRecord::default(); 20], 20));
        app.refresh();
        assert!(app.controller().is_loading());

        let completion = app
            .completions()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert!(app.apply(completion));

        for _ in 0..3 {
            let screen = app.refresh();
            assert!(screen.contains("! Failed to load data"));
            assert!(!app.controller().is_loading());
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.controller().generation(), 1);

        app.handle_event(UiEvent::Scroll(ScrollAction::Rows(1)), Instant::now());
        app.refresh();
        assert!(app.controller().is_loading());
        app.completions()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_initial_load_is_shown_before_any_retry() {
        let controller = WindowController::from_initial_page(
            Err(StockError::FetchFailed("connection refused".into())),
            20,
        );
        let (mut app, api) = down_app(controller);

        let screen = app.refresh();
        assert!(screen.contains("! Failed to load data"));
        assert!(!app.controller().is_loading());
        assert_eq!(app.controller().generation(), 0);

        app.handle_event(UiEvent::Scroll(ScrollAction::Top), Instant::now());
        app.refresh();
        assert!(app.controller().is_loading());
        app.completions()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }
}
