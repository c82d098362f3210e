//! Shared networking constants and helpers used by server and client.

/// Default TCP port of the stock query server.
pub const DEFAULT_PORT: u16 = 3000;
/// Path of the paged query endpoint.
pub const STOCKS_PATH: &str = "/api/stocks";
/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";
/// Page size used when a request does not name one (and for the initial page).
pub const DEFAULT_LIMIT: usize = 20;
/// Largest page a single request may ask for.
pub const MAX_LIMIT: usize = 500;
/// Upstream snapshot revalidation window, in seconds.
pub const REVALIDATE_SECS: u64 = 1800;

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}

/// Joins a base URL (with or without trailing slash) and an absolute path.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
