//! Cache entry with TTL and access metadata.

use serde_json::Value;
use std::time::{Duration, Instant};

/// A single cached value with its lifecycle metadata.
///
/// The expiry deadline is fixed at insertion time: `expires_at` is
/// `created_at + ttl` when a TTL is set, and `None` (never expires)
/// otherwise. Accesses refresh `last_accessed` but never the deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub created_at: Instant,
    pub last_accessed: Instant,
    pub access_count: u64,
    pub ttl: Option<Duration>,
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    pub fn new(value: Value, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            ttl,
            expires_at: ttl.map(|t| now + t),
        }
    }

    /// Whether the entry's TTL deadline has passed.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Record an access, updating `last_accessed` and the access counter.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count = self.access_count.saturating_add(1);
    }
}
