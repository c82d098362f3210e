//! Domain models of the stock server.
//!
//! - `feed`: upstream snapshot source and its revalidation cache.
//! - `normalizer`: eligibility filter and derived display fields.
//! - `query`: filter, sort and pagination over display records.

pub mod feed;
pub mod normalizer;
pub mod query;
