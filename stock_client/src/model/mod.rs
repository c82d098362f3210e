//! Client-side table state and geometry.
//!
//! - `window`: the window controller state machine (rows, offset, paging).
//! - `debounce`: quiet-period debouncer for the filter box.
//! - `viewport`: virtualization math and scroll position.
pub mod debounce;
pub mod viewport;
pub mod window;
