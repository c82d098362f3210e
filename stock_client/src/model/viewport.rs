//! Virtualization geometry.
//!
//! Only the rows around the viewport are materialized. Given the number of
//! slots (loaded rows plus one sentinel while more pages may follow), a fixed
//! row height and the scroll offset, `visible_window` returns the index range
//! to render, widened by an overscan margin on each side, and the vertical
//! offset of every slot in it. Nothing here knows about terminals; the
//! renderer and the event loop only consume the numbers.
use std::ops::RangeInclusive;

use stock_common::DisplayRecord;

/// Estimated height of one row.
pub const ROW_HEIGHT: f64 = 52.0;
/// Height of the scroll container.
pub const VIEWPORT_HEIGHT: f64 = 600.0;
/// Extra rows materialized beyond each edge of the viewport.
pub const OVERSCAN: usize = 8;

/// Materialized slot range and placements.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleWindow {
    /// First materialized index.
    pub start_index: usize,
    /// Last materialized index (inclusive).
    pub end_index: usize,
    /// Vertical offset of each index in `start_index..=end_index`.
    pub offsets: Vec<f64>,
}

impl VisibleWindow {
    /// Materialized indices.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start_index..=self.end_index
    }

    /// `(index, offset)` pairs in order.
    pub fn items(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices().zip(self.offsets.iter().copied())
    }
}

/// Computes the slots to materialize.
///
/// Returns `None` when there is nothing to show (no slots or a non-positive
/// row height). Scroll offsets outside the content are clamped to it.
pub fn visible_window(
    scroll_offset: f64,
    viewport_height: f64,
    row_height: f64,
    total_count: usize,
    overscan: usize,
) -> Option<VisibleWindow> {
    if total_count == 0 || row_height <= 0.0 || !row_height.is_finite() {
        return None;
    }
    let last_slot = total_count - 1;
    let top = scroll_offset.max(0.0);
    let bottom = top + viewport_height.max(0.0);

    let first_visible = ((top / row_height).floor() as usize).min(last_slot);
    let last_visible = ((bottom / row_height).ceil() as usize)
        .saturating_sub(1)
        .clamp(first_visible, last_slot);

    let start_index = first_visible.saturating_sub(overscan);
    let end_index = last_visible.saturating_add(overscan).min(last_slot);
    let offsets = (start_index..=end_index)
        .map(|i| i as f64 * row_height)
        .collect();

    Some(VisibleWindow {
        start_index,
        end_index,
        offsets,
    })
}

/// Total scrollable height of `count` slots.
pub fn total_extent(count: usize, row_height: f64) -> f64 {
    count as f64 * row_height
}

/// Number of slots: loaded rows plus the sentinel while more may follow.
pub fn slot_count(rows_len: usize, has_more: bool) -> usize {
    if has_more { rows_len + 1 } else { rows_len }
}

/// Whether the window reaches the last loaded row.
pub fn reaches_end(window: &VisibleWindow, rows_len: usize) -> bool {
    window.end_index + 1 >= rows_len
}

/// Boundary trigger: the window reaches the end of the buffer while more
/// pages may follow and nothing is loading.
pub fn should_fetch_more(
    window: Option<&VisibleWindow>,
    rows_len: usize,
    has_more: bool,
    loading: bool,
) -> bool {
    has_more && !loading && window.is_some_and(|w| reaches_end(w, rows_len))
}

/// What a materialized slot shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    /// A loaded row.
    Row(&'a DisplayRecord),
    /// The sentinel while a page is loading.
    Loading,
    /// The sentinel while idle.
    Placeholder,
}

/// Resolves slot `index` against the buffer.
pub fn slot(rows: &[DisplayRecord], index: usize, loading: bool) -> Slot<'_> {
    match rows.get(index) {
        Some(row) => Slot::Row(row),
        None if loading => Slot::Loading,
        None => Slot::Placeholder,
    }
}

/// Sizes of the scroll container and its rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Estimated row height.
    pub row_height: f64,
    /// Scroll container height.
    pub viewport_height: f64,
    /// Overscan rows on each side.
    pub overscan: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            row_height: ROW_HEIGHT,
            viewport_height: VIEWPORT_HEIGHT,
            overscan: OVERSCAN,
        }
    }
}

/// Scroll position over a slot list of known size.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    geometry: Geometry,
    scroll_offset: f64,
}

impl Viewport {
    /// Viewport scrolled to the top.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            scroll_offset: 0.0,
        }
    }

    /// Container geometry.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Current scroll offset.
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    fn max_offset(&self, count: usize) -> f64 {
        (total_extent(count, self.geometry.row_height) - self.geometry.viewport_height).max(0.0)
    }

    /// Keeps the offset within `[0, extent - viewport]`.
    pub fn clamp(&mut self, count: usize) {
        self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_offset(count));
    }

    /// Scrolls by whole rows (negative is up).
    pub fn scroll_rows(&mut self, rows: i64, count: usize) {
        self.scroll_offset += rows as f64 * self.geometry.row_height;
        self.clamp(count);
    }

    /// Scrolls by whole viewports (negative is up).
    pub fn scroll_pages(&mut self, pages: i64, count: usize) {
        self.scroll_offset += pages as f64 * self.geometry.viewport_height;
        self.clamp(count);
    }

    /// Jumps to the top.
    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0.0;
    }

    /// Jumps to the bottom of `count` slots.
    pub fn scroll_to_bottom(&mut self, count: usize) {
        self.scroll_offset = self.max_offset(count);
    }

    /// Window for the current offset.
    pub fn window(&self, count: usize) -> Option<VisibleWindow> {
        visible_window(
            self.scroll_offset,
            self.geometry.viewport_height,
            self.geometry.row_height,
            count,
            self.geometry.overscan,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_at_top_includes_trailing_overscan() {
        let w = visible_window(0.0, VIEWPORT_HEIGHT, ROW_HEIGHT, 100, OVERSCAN).unwrap();
        // 600 / 52 → rows 0..=11 visible, plus 8 below
        assert_eq!(w.start_index, 0);
        assert_eq!(w.end_index, 19);
        assert_eq!(w.offsets.len(), 20);
        assert_eq!(w.offsets[3], 3.0 * ROW_HEIGHT);
    }

    #[test]
    fn window_in_the_middle_has_overscan_on_both_sides() {
        let w = visible_window(52.0 * 30.0, 600.0, 52.0, 100, 8).unwrap();
        assert_eq!(w.start_index, 22);
        assert_eq!(w.end_index, 49);
        let items: Vec<_> = w.items().take(2).collect();
        assert_eq!(items, vec![(22, 22.0 * 52.0), (23, 23.0 * 52.0)]);
    }

    #[test]
    fn window_is_clamped_to_count() {
        let w = visible_window(10_000.0, 600.0, 52.0, 5, 8).unwrap();
        assert_eq!(w.start_index, 0);
        assert_eq!(w.end_index, 4);
        assert!(visible_window(0.0, 600.0, 52.0, 0, 8).is_none());
        assert!(visible_window(0.0, 600.0, 0.0, 10, 8).is_none());
    }

    #[test]
    fn extent_and_sentinel_slot() {
        assert_eq!(total_extent(21, 52.0), 1092.0);
        assert_eq!(slot_count(20, true), 21);
        assert_eq!(slot_count(20, false), 20);
    }

    #[test]
    fn boundary_trigger_requires_more_and_idle() {
        let w = visible_window(0.0, 600.0, 52.0, slot_count(20, true), 8).unwrap();
        assert!(should_fetch_more(Some(&w), 20, true, false));
        assert!(!should_fetch_more(Some(&w), 20, true, true));
        assert!(!should_fetch_more(Some(&w), 20, false, false));

        let w = visible_window(0.0, 600.0, 52.0, slot_count(60, true), 8).unwrap();
        assert!(!should_fetch_more(Some(&w), 60, true, false));

        // an empty buffer with more to come always asks
        let w = visible_window(0.0, 600.0, 52.0, slot_count(0, true), 8).unwrap();
        assert!(should_fetch_more(Some(&w), 0, true, false));
        assert!(!should_fetch_more(None, 0, true, false));
    }

    #[test]
    fn sentinel_slot_shows_loading_or_placeholder() {
        let rows = vec![DisplayRecord::default()];
        assert!(matches!(slot(&rows, 0, true), Slot::Row(_)));
        assert_eq!(slot(&rows, 1, true), Slot::Loading);
        assert_eq!(slot(&rows, 1, false), Slot::Placeholder);
    }

    #[test]
    fn viewport_scrolling_is_clamped() {
        let mut viewport = Viewport::new(Geometry::default());
        viewport.scroll_rows(-5, 100);
        assert_eq!(viewport.scroll_offset(), 0.0);

        viewport.scroll_pages(1, 100);
        assert_eq!(viewport.scroll_offset(), 600.0);

        viewport.scroll_to_bottom(100);
        assert_eq!(viewport.scroll_offset(), 5200.0 - 600.0);

        // the buffer shrinks after a reset
        viewport.clamp(5);
        assert_eq!(viewport.scroll_offset(), 0.0);
        assert_eq!(viewport.window(5).unwrap().end_index, 4);
    }
}
