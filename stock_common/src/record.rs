//! Typed schema of upstream and display records.
//!
//! `RawRecord` mirrors one element of the upstream feed array. Fields the table
//! works with are declared; everything else is kept in `extra` and passed
//! through untouched. Upstream numbers may arrive as JSON numbers or numeric
//! strings, so numeric fields are coerced on the way in and anything that is
//! not a finite number becomes `None`.
//!
//! `DisplayRecord` is what the query endpoint serves: the same fields plus the
//! derived `PowerI` ratio and the magnitude-formatted `tvol`/`tval` strings.
use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::columns::{ColumnKey, ColumnKind};
use crate::format::plain_number;

/// One symbol record as delivered by the upstream feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Short trading symbol.
    #[serde(rename = "l18", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Full instrument name.
    #[serde(rename = "l30", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category/sector of the instrument.
    #[serde(rename = "cs", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Last traded price.
    #[serde(rename = "pl", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    /// Last price change, percent.
    #[serde(rename = "plp", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub last_change_percent: Option<f64>,
    /// Closing price.
    #[serde(rename = "pc", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub close_price: Option<f64>,
    /// Closing price change, percent.
    #[serde(rename = "pcp", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub close_change_percent: Option<f64>,
    /// Number of trades.
    #[serde(rename = "tno", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<f64>,
    /// Traded volume.
    #[serde(rename = "tvol", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Traded value.
    #[serde(rename = "tval", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Institutional buy volume.
    #[serde(rename = "Buy_I_Volume", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub buy_i_volume: Option<f64>,
    /// Institutional buy trade count.
    #[serde(rename = "Buy_CountI", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub buy_count_i: Option<f64>,
    /// Institutional sell volume.
    #[serde(rename = "Sell_I_Volume", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sell_i_volume: Option<f64>,
    /// Institutional sell trade count.
    #[serde(rename = "Sell_CountI", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sell_count_i: Option<f64>,
    /// Every other upstream field, passed through as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A record as served to the table: raw fields plus derived ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    /// Short trading symbol.
    #[serde(rename = "l18", default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Full instrument name.
    #[serde(rename = "l30", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category/sector of the instrument.
    #[serde(rename = "cs", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Last traded price.
    #[serde(rename = "pl", default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    /// Last price change, percent.
    #[serde(rename = "plp", default, skip_serializing_if = "Option::is_none")]
    pub last_change_percent: Option<f64>,
    /// Closing price.
    #[serde(rename = "pc", default, skip_serializing_if = "Option::is_none")]
    pub close_price: Option<f64>,
    /// Closing price change, percent.
    #[serde(rename = "pcp", default, skip_serializing_if = "Option::is_none")]
    pub close_change_percent: Option<f64>,
    /// Number of trades.
    #[serde(rename = "tno", default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<f64>,
    /// Traded volume, magnitude-formatted.
    #[serde(rename = "tvol", default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    /// Traded value, magnitude-formatted.
    #[serde(rename = "tval", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Traded volume as received, used for numeric sorting.
    #[serde(rename = "tvolRaw", default, skip_serializing_if = "Option::is_none")]
    pub volume_raw: Option<f64>,
    /// Traded value as received, used for numeric sorting.
    #[serde(rename = "tvalRaw", default, skip_serializing_if = "Option::is_none")]
    pub value_raw: Option<f64>,
    /// Institutional buy volume.
    #[serde(rename = "Buy_I_Volume", default, skip_serializing_if = "Option::is_none")]
    pub buy_i_volume: Option<f64>,
    /// Institutional buy trade count.
    #[serde(rename = "Buy_CountI", default, skip_serializing_if = "Option::is_none")]
    pub buy_count_i: Option<f64>,
    /// Institutional sell volume.
    #[serde(rename = "Sell_I_Volume", default, skip_serializing_if = "Option::is_none")]
    pub sell_i_volume: Option<f64>,
    /// Institutional sell trade count.
    #[serde(rename = "Sell_CountI", default, skip_serializing_if = "Option::is_none")]
    pub sell_count_i: Option<f64>,
    /// Institutional buy-per-trade over sell-per-trade, two decimals.
    #[serde(rename = "PowerI", default)]
    pub power_i: f64,
    /// Every other upstream field, passed through as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Value of a single table cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// Text value.
    Text(&'a str),
    /// Numeric value.
    Number(f64),
    /// Field absent on the record.
    Missing,
}

impl Cell<'_> {
    /// String form used for text filtering; missing values are empty.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => (*s).to_string(),
            Cell::Number(n) => plain_number(*n),
            Cell::Missing => String::new(),
        }
    }

    fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Number(n) => n.is_nan(),
            Cell::Text(_) => false,
        }
    }

    /// Ascending order of two present cells: numbers numerically, text by
    /// bytes, and numbers before text when a column mixes both.
    fn cmp_present(&self, other: &Cell<'_>) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Number(_), _) => Ordering::Less,
            (_, Cell::Number(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    /// Total order used for sorting.
    ///
    /// Missing values (and NaN) always come last, whatever the direction;
    /// `descending` reverses only the order among present values.
    pub fn sort_cmp(&self, other: &Cell<'_>, descending: bool) -> Ordering {
        match (self.is_missing(), other.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = self.cmp_present(other);
                if descending { ord.reverse() } else { ord }
            }
        }
    }
}

fn text_cell(value: &Option<String>) -> Cell<'_> {
    value.as_deref().map_or(Cell::Missing, Cell::Text)
}

fn number_cell(value: Option<f64>) -> Cell<'static> {
    value.map_or(Cell::Missing, Cell::Number)
}

impl DisplayRecord {
    /// Displayed value of a column (formatted strings for magnitude columns).
    pub fn cell(&self, key: ColumnKey) -> Cell<'_> {
        match key {
            ColumnKey::Symbol => text_cell(&self.symbol),
            ColumnKey::Name => text_cell(&self.name),
            ColumnKey::LastPrice => number_cell(self.last_price),
            ColumnKey::LastChangePercent => number_cell(self.last_change_percent),
            ColumnKey::ClosePrice => number_cell(self.close_price),
            ColumnKey::CloseChangePercent => number_cell(self.close_change_percent),
            ColumnKey::TradeCount => number_cell(self.trade_count),
            ColumnKey::Volume => text_cell(&self.volume),
            ColumnKey::Value => text_cell(&self.value),
            ColumnKey::PowerI => Cell::Number(self.power_i),
        }
    }

    /// Value a column sorts by: the raw number behind magnitude columns,
    /// the displayed value otherwise.
    pub fn sort_cell(&self, key: ColumnKey) -> Cell<'_> {
        match key.column().kind {
            ColumnKind::Magnitude => match key {
                ColumnKey::Volume => number_cell(self.volume_raw),
                ColumnKey::Value => number_cell(self.value_raw),
                _ => self.cell(key),
            },
            ColumnKind::Text | ColumnKind::Number => self.cell(key),
        }
    }
}

/// Coerces a JSON value into a finite number: numbers as-is, numeric strings
/// parsed, everything else `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
