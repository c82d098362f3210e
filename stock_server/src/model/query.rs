//! Query engine: filter, stable sort and offset/limit slicing over display records.
use chrono::{DateTime, Utc};
use stock_common::{COLUMNS, DisplayRecord, PageResult, QueryParams};

/// Returns `true` if any configured column of `record` contains `needle`
/// (already lower-cased) in its lower-cased string form.
pub fn matches_filter(record: &DisplayRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    COLUMNS
        .iter()
        .any(|column| record.cell(column.key).to_text().to_lowercase().contains(needle))
}

/// Runs `params` against `records` and returns one page stamped with `now`.
///
/// `total` counts every record passing the filter, independent of
/// `offset`/`limit`. Sorting is stable, so equal keys keep input order.
/// An offset past the end yields an empty page.
pub fn query(records: &[DisplayRecord], params: &QueryParams, now: DateTime<Utc>) -> PageResult {
    let needle = params.filter.to_lowercase();
    let mut matched: Vec<&DisplayRecord> = records
        .iter()
        .filter(|record| matches_filter(record, &needle))
        .collect();

    if let Some(key) = params.sort {
        let descending = params.order.is_descending();
        matched.sort_by(|a, b| a.sort_cell(key).sort_cmp(&b.sort_cell(key), descending));
    }

    let total = matched.len();
    let rows = matched
        .into_iter()
        .skip(params.offset)
        .take(params.limit)
        .cloned()
        .collect();

    PageResult {
        rows,
        total,
        cached_at: now,
    }
}
