//! Static column configuration of the stock table.
//!
//! `COLUMNS` is the ordered list of fields that are rendered, filtered and
//! sortable. Keys keep the wire names of the upstream feed (`l18`, `tvol`,
//! `PowerI`, ...) so they can be used directly in query strings.
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Key of a configured column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ColumnKey {
    /// Short trading symbol.
    #[serde(rename = "l18")]
    #[strum(serialize = "l18")]
    Symbol,
    /// Full instrument name.
    #[serde(rename = "l30")]
    #[strum(serialize = "l30")]
    Name,
    /// Last traded price.
    #[serde(rename = "pl")]
    #[strum(serialize = "pl")]
    LastPrice,
    /// Last price change, percent.
    #[serde(rename = "plp")]
    #[strum(serialize = "plp")]
    LastChangePercent,
    /// Closing price.
    #[serde(rename = "pc")]
    #[strum(serialize = "pc")]
    ClosePrice,
    /// Closing price change, percent.
    #[serde(rename = "pcp")]
    #[strum(serialize = "pcp")]
    CloseChangePercent,
    /// Number of trades.
    #[serde(rename = "tno")]
    #[strum(serialize = "tno")]
    TradeCount,
    /// Traded volume.
    #[serde(rename = "tvol")]
    #[strum(serialize = "tvol")]
    Volume,
    /// Traded value.
    #[serde(rename = "tval")]
    #[strum(serialize = "tval")]
    Value,
    /// Institutional buy/sell power ratio.
    #[serde(rename = "PowerI")]
    #[strum(serialize = "PowerI")]
    PowerI,
}

/// How a column's values are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, compared lexicographically.
    Text,
    /// Plain number.
    Number,
    /// Displayed as a magnitude string ("1.5 M"), compared by the raw number.
    Magnitude,
}

/// A `{key, label}` entry of the column configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Field key, as used on the wire and in `sort=`.
    pub key: ColumnKey,
    /// Header label.
    pub label: &'static str,
    /// Value type of the column.
    pub kind: ColumnKind,
}

/// Ordered column configuration.
pub const COLUMNS: &[Column] = &[
    Column { key: ColumnKey::Symbol, label: "Symbol", kind: ColumnKind::Text },
    Column { key: ColumnKey::Name, label: "Name", kind: ColumnKind::Text },
    Column { key: ColumnKey::LastPrice, label: "Last", kind: ColumnKind::Number },
    Column { key: ColumnKey::LastChangePercent, label: "Last %", kind: ColumnKind::Number },
    Column { key: ColumnKey::ClosePrice, label: "Close", kind: ColumnKind::Number },
    Column { key: ColumnKey::CloseChangePercent, label: "Close %", kind: ColumnKind::Number },
    Column { key: ColumnKey::TradeCount, label: "Trades", kind: ColumnKind::Number },
    Column { key: ColumnKey::Volume, label: "Volume", kind: ColumnKind::Magnitude },
    Column { key: ColumnKey::Value, label: "Value", kind: ColumnKind::Magnitude },
    Column { key: ColumnKey::PowerI, label: "Power I", kind: ColumnKind::Number },
];

impl ColumnKey {
    /// Configuration entry of this key.
    pub fn column(self) -> &'static Column {
        // `COLUMNS` lists the keys in declaration order.
        &COLUMNS[self as usize]
    }

    /// Header label of this key.
    pub fn label(self) -> &'static str {
        self.column().label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_key_is_configured_once() {
        let keys: HashSet<ColumnKey> = COLUMNS.iter().map(|c| c.key).collect();
        assert_eq!(keys.len(), COLUMNS.len());
        for column in COLUMNS {
            assert_eq!(column.key.column(), column);
        }
    }

    #[test]
    fn keys_parse_from_wire_names() {
        assert_eq!("l18".parse::<ColumnKey>().unwrap(), ColumnKey::Symbol);
        assert_eq!("poweri".parse::<ColumnKey>().unwrap(), ColumnKey::PowerI);
        assert_eq!(ColumnKey::Volume.to_string(), "tvol");
        assert!("price".parse::<ColumnKey>().is_err());
    }
}
