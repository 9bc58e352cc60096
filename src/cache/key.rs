//! Cache key derivation
//!
//! Key: blake3 digest of (endpoint | subject | RFC 3339 query time | day range).
//! String components are length-prefixed so that moving a separator between
//! two fields can never produce the same input bytes.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-length identifier of one logical schedule query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of every key, in hex characters
    pub const LEN: usize = 64;

    /// Derives the key for a query
    ///
    /// `query_time` is taken in UTC so equal instants always canonicalize to
    /// the same text.
    pub fn derive(endpoint: &str, subject: &str, query_time: DateTime<Utc>, day_range: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in [endpoint, subject] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.update(
            query_time
                .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                .as_bytes(),
        );
        hasher.update(b"|");
        hasher.update(&day_range.to_le_bytes());

        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
