//! Query parameters and page payloads exchanged over `GET /api/stocks`.
//!
//! `QueryParams` fully determines a response for a given record set. On the
//! server it is built leniently from the raw query string (bad numbers fall
//! back to defaults); on the client it is turned back into query pairs.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::columns::ColumnKey;
use crate::net::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::record::DisplayRecord;

/// Sort direction.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// `true` for [`SortOrder::Desc`].
    pub fn is_descending(self) -> bool {
        self == SortOrder::Desc
    }
}

/// Query string as received, before any validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuery {
    /// Start index of the page.
    pub offset: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// Column key to sort by.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
    /// Filter text.
    pub filter: Option<String>,
}

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Start index into the filtered and sorted result set.
    pub offset: usize,
    /// Maximum number of rows returned, always positive.
    pub limit: usize,
    /// Column to sort by, if any.
    pub sort: Option<ColumnKey>,
    /// Sort direction; ignored without `sort`.
    pub order: SortOrder,
    /// Case-insensitive substring filter; empty means no filter.
    pub filter: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort: None,
            order: SortOrder::Asc,
            filter: String::new(),
        }
    }
}

impl QueryParams {
    /// Validates a raw query string.
    ///
    /// Unparsable or absent `offset` becomes 0; unparsable, absent or zero
    /// `limit` becomes [`DEFAULT_LIMIT`] and larger values are capped at
    /// [`MAX_LIMIT`]. An empty or unknown `sort` key means no sort. `order`
    /// is descending only for `desc`. The filter is lower-cased.
    pub fn from_query(raw: &RawQuery) -> Self {
        let offset = raw
            .offset
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let limit = raw
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&l| l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let sort = raw
            .sort
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<ColumnKey>().ok());
        let order = raw
            .order
            .as_deref()
            .and_then(|s| s.trim().parse::<SortOrder>().ok())
            .unwrap_or_default();
        let filter = raw.filter.as_deref().unwrap_or("").to_lowercase();

        Self {
            offset,
            limit,
            sort,
            order,
            filter,
        }
    }

    /// Same parameters at another offset.
    pub fn at_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// Query-string pairs for an HTTP request.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.map(|k| k.to_string()).unwrap_or_default()),
            ("order", self.order.to_string()),
            ("filter", self.filter.clone()),
        ]
    }
}

/// Successful page response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Rows of the requested page, at most `limit` of them.
    pub rows: Vec<DisplayRecord>,
    /// Number of records passing the filter, before pagination.
    pub total: usize,
    /// When this response was computed.
    pub cached_at: DateTime<Utc>,
}

/// Machine-readable error code of a failed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ErrorCode {
    /// Upstream throttled the request.
    #[serde(rename = "RATE_LIMIT")]
    #[strum(serialize = "RATE_LIMIT")]
    RateLimit,
    /// Any other upstream failure.
    #[serde(rename = "FETCH_ERROR")]
    #[strum(serialize = "FETCH_ERROR")]
    FetchError,
}

/// Body of a failed page request: an empty page plus the error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always empty.
    pub rows: Vec<DisplayRecord>,
    /// Always 0.
    pub total: usize,
    /// Error code.
    pub error: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ErrorBody {
    /// Empty page carrying `error` and `message`.
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            error,
            message: message.into(),
        }
    }
}
