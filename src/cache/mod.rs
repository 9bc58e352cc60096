//! Cache module for storing schedule responses to disk
//!
//! One JSON file per query, named after a digest of the query parameters and
//! stamped with its write time. Entries past their TTL, or that no longer
//! parse, read as absent and are removed.

mod key;
mod manager;

pub use key::CacheKey;
pub use manager::{CacheManager, APP_NAME, DEFAULT_TTL_HOURS};
