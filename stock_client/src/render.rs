//! Text rendering of the table.
//!
//! The renderer draws the slots of the materialized window that fall inside
//! the viewport; overscan slots are computed but stay off screen.
use std::fmt::Write;

use stock_common::format::format_grouped;
use stock_common::{COLUMNS, Cell, DisplayRecord, SortOrder};

use crate::model::viewport::{Slot, Viewport, slot, slot_count, total_extent};
use crate::model::window::{Mode, WindowController};

const CELL_WIDTH: usize = 12;
const INDEX_WIDTH: usize = 6;

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

fn cell_text(cell: Cell<'_>) -> String {
    match cell {
        Cell::Text(s) => s.to_string(),
        Cell::Number(n) => format_grouped(n),
        Cell::Missing => String::new(),
    }
}

fn header(controller: &WindowController) -> String {
    let mut line = " ".repeat(INDEX_WIDTH);
    for column in COLUMNS {
        let arrow = match (controller.sort_key() == Some(column.key), controller.order()) {
            (true, SortOrder::Asc) => " ▲",
            (true, SortOrder::Desc) => " ▼",
            (false, _) => "",
        };
        line.push_str(&fit(&format!("{}{}", column.label, arrow), CELL_WIDTH));
        line.push(' ');
    }
    line.trim_end().to_string()
}

fn row_line(index: usize, row: &DisplayRecord) -> String {
    let mut line = fit(&(index + 1).to_string(), INDEX_WIDTH);
    for column in COLUMNS {
        line.push_str(&fit(&cell_text(row.cell(column.key)), CELL_WIDTH));
        line.push(' ');
    }
    line.trim_end().to_string()
}

/// Draws the filter box, header, visible rows and status lines.
pub fn render(controller: &WindowController, viewport: &Viewport) -> String {
    let geometry = viewport.geometry();
    let rows = controller.rows();
    let count = slot_count(rows.len(), controller.has_more());
    let top = viewport.scroll_offset();
    let bottom = top + geometry.viewport_height;

    let mut out = String::new();
    let pending = if controller.filter_text() != controller.debounced_filter_text() {
        " …"
    } else {
        ""
    };
    let _ = writeln!(out, "filter: {}{}", controller.filter_text(), pending);
    let _ = writeln!(out, "{}", header(controller));

    if let Some(window) = viewport.window(count) {
        for (index, offset) in window.items() {
            if offset + geometry.row_height <= top || offset >= bottom {
                continue;
            }
            let line = match slot(rows, index, controller.is_loading()) {
                Slot::Row(row) => row_line(index, row),
                Slot::Loading => format!("{}loading...", " ".repeat(INDEX_WIDTH)),
                Slot::Placeholder => format!("{}—", " ".repeat(INDEX_WIDTH)),
            };
            let _ = writeln!(out, "{}", line);
        }
    } else {
        let _ = writeln!(out, "{}no rows", " ".repeat(INDEX_WIDTH));
    }

    let total = controller
        .total()
        .map_or_else(|| "?".to_string(), |t| t.to_string());
    let mode = match controller.mode() {
        Mode::Idle => "idle",
        Mode::Loading => "loading",
        Mode::Error => "error",
        Mode::Exhausted => "end",
    };
    let _ = writeln!(
        out,
        "{} of {} loaded | {} | {:.0}/{:.0}",
        rows.len(),
        total,
        mode,
        top,
        total_extent(count, geometry.row_height)
    );
    if let Some(error) = controller.error() {
        let _ = writeln!(out, "! {}", error);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::viewport::Geometry;
    use stock_common::ColumnKey;

    fn rows(n: usize) -> Vec<DisplayRecord> {
        (0..n)
            .map(|i| DisplayRecord {
                symbol: Some(format!("SYM{}", i)),
                last_price: Some(12_500.0),
                volume: Some("1.5 M".into()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn renders_only_rows_inside_the_viewport() {
        let controller = WindowController::new(rows(30), 20);
        let viewport = Viewport::new(Geometry::default());
        let text = render(&controller, &viewport);

        assert!(text.contains("SYM0 "));
        assert!(text.contains("SYM11 "));
        assert!(!text.contains("SYM12 "));
        assert!(text.contains("12,500"));
        assert!(text.contains("1.5 M"));
        assert!(text.contains("30 of ? loaded | idle"));
    }

    #[test]
    fn shows_sort_arrow_and_sentinel() {
        let mut controller = WindowController::new(Vec::new(), 20);
        controller.click_sort(ColumnKey::Symbol);
        let viewport = Viewport::new(Geometry::default());
        let text = render(&controller, &viewport);

        assert!(text.contains("Symbol ▲"));
        assert!(text.contains("loading..."));
        assert!(text.contains("| loading |"));
    }

    #[test]
    fn shows_pending_filter_and_error() {
        let mut controller = WindowController::from_initial_page(
            Err(stock_common::StockError::RateLimited("slow".into())),
            20,
        );
        controller.set_filter_text("ban");
        let text = render(&controller, &Viewport::new(Geometry::default()));
        assert!(text.contains("filter: ban …"));
        assert!(text.contains("no rows"));
        assert!(text.contains("! Request limit reached"));
    }

    #[test]
    fn fit_truncates_and_pads() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 5), "abcd…");
    }
}
