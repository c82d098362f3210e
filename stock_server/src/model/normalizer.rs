//! Row normalization: eligibility filtering and derived display fields.
//!
//! Funds are dropped (their category carries the fund marker) as are
//! instruments whose name contains a dot. Surviving records keep upstream
//! order and gain `PowerI` plus magnitude-formatted `tvol`/`tval`.
use stock_common::format::format_magnitude;
use stock_common::{DisplayRecord, RawRecord};

/// Category token identifying fund-type instruments.
pub const FUND_MARKER: &str = "صندوق";

/// Returns `true` if the record belongs in the table.
pub fn is_eligible(raw: &RawRecord) -> bool {
    let is_fund = raw
        .category
        .as_deref()
        .is_some_and(|cs| cs.contains(FUND_MARKER));
    let has_dot = raw.name.as_deref().is_some_and(|name| name.contains('.'));
    !is_fund && !has_dot
}

fn per_trade(volume: Option<f64>, count: Option<f64>) -> f64 {
    match (volume, count) {
        (Some(v), Some(c)) if v != 0.0 && c != 0.0 => v / c,
        _ => 0.0,
    }
}

/// Institutional buy volume per buy trade over sell volume per sell trade,
/// rounded to two decimals. Zero when either side has no volume or no trades.
pub fn power_i(raw: &RawRecord) -> f64 {
    let buy = per_trade(raw.buy_i_volume, raw.buy_count_i);
    let sell = per_trade(raw.sell_i_volume, raw.sell_count_i);
    if buy == 0.0 || sell == 0.0 {
        return 0.0;
    }
    let ratio = (buy / sell * 100.0).round() / 100.0;
    if ratio.is_finite() { ratio } else { 0.0 }
}

/// Derives the display form of a record.
pub fn normalize(raw: RawRecord) -> DisplayRecord {
    let power_i = power_i(&raw);
    DisplayRecord {
        volume: raw.volume.and_then(format_magnitude),
        value: raw.value.and_then(format_magnitude),
        volume_raw: raw.volume,
        value_raw: raw.value,
        power_i,
        symbol: raw.symbol,
        name: raw.name,
        category: raw.category,
        last_price: raw.last_price,
        last_change_percent: raw.last_change_percent,
        close_price: raw.close_price,
        close_change_percent: raw.close_change_percent,
        trade_count: raw.trade_count,
        buy_i_volume: raw.buy_i_volume,
        buy_count_i: raw.buy_count_i,
        sell_i_volume: raw.sell_i_volume,
        sell_count_i: raw.sell_count_i,
        extra: raw.extra,
    }
}

/// Filters and normalizes a whole snapshot, preserving upstream order.
pub fn normalize_snapshot(records: Vec<RawRecord>) -> Vec<DisplayRecord> {
    records
        .into_iter()
        .filter(is_eligible)
        .map(normalize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn institutional(buy_vol: f64, buy_cnt: f64, sell_vol: f64, sell_cnt: f64) -> RawRecord {
        RawRecord {
            buy_i_volume: Some(buy_vol),
            buy_count_i: Some(buy_cnt),
            sell_i_volume: Some(sell_vol),
            sell_count_i: Some(sell_cnt),
            ..Default::default()
        }
    }

    #[test]
    fn power_i_is_ratio_of_per_trade_volumes() {
        assert_eq!(power_i(&institutional(100.0, 10.0, 50.0, 10.0)), 2.0);
        assert_eq!(power_i(&institutional(100.0, 3.0, 100.0, 7.0)), 2.33);
    }

    #[test]
    fn power_i_is_zero_without_trades_or_volume() {
        assert_eq!(power_i(&institutional(100.0, 10.0, 50.0, 0.0)), 0.0);
        assert_eq!(power_i(&institutional(0.0, 10.0, 50.0, 10.0)), 0.0);
        assert_eq!(power_i(&RawRecord::default()), 0.0);
    }

    #[test]
    fn funds_and_dotted_names_are_ineligible() {
        let fund = RawRecord {
            category: Some(format!("{} سرمایه گذاری", FUND_MARKER)),
            ..Default::default()
        };
        let dotted = RawRecord {
            name: Some("Foo.B".into()),
            ..Default::default()
        };
        let plain = RawRecord {
            name: Some("Foolad".into()),
            category: Some("basic metals".into()),
            ..Default::default()
        };
        assert!(!is_eligible(&fund));
        assert!(!is_eligible(&dotted));
        assert!(is_eligible(&plain));
        assert!(is_eligible(&RawRecord::default()));
    }

    #[test]
    fn normalize_formats_magnitudes_and_keeps_raw_numbers() {
        let raw = RawRecord {
            symbol: Some("FOLD".into()),
            volume: Some(1_500_000.0),
            value: Some(3_200_000_000.0),
            ..institutional(100.0, 10.0, 50.0, 10.0)
        };
        let display = normalize(raw);
        assert_eq!(display.symbol.as_deref(), Some("FOLD"));
        assert_eq!(display.volume.as_deref(), Some("1.5 M"));
        assert_eq!(display.value.as_deref(), Some("3.2 B"));
        assert_eq!(display.volume_raw, Some(1_500_000.0));
        assert_eq!(display.power_i, 2.0);
    }

    #[test]
    fn snapshot_keeps_upstream_order_of_eligible_records() {
        let names = ["B", "A.x", "C", "A"];
        let records: Vec<RawRecord> = names
            .iter()
            .map(|n| RawRecord {
                name: Some(n.to_string()),
                ..Default::default()
            })
            .collect();
        let out: Vec<String> = normalize_snapshot(records)
            .into_iter()
            .filter_map(|r| r.name)
            .collect();
        assert_eq!(out, vec!["B", "C", "A"]);
    }
}
