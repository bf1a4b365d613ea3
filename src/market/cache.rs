//! TTL cache entry used by the market service.

use std::time::{Duration, Instant};

/// A cached value with TTL tracking
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Create a new cache entry
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// Check if entry is still valid
    pub fn is_valid(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }

    /// Get time remaining before expiry
    pub fn time_remaining(&self) -> Option<Duration> {
        let elapsed = self.inserted_at.elapsed();
        if elapsed < self.ttl {
            Some(self.ttl - elapsed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_valid() {
        let entry = CacheEntry::new(42u64, Duration::from_secs(60));
        assert!(entry.is_valid());
        assert!(entry.time_remaining().is_some());
    }

    #[test]
    fn entry_expires_after_ttl() {
        let entry = CacheEntry::new("x", Duration::from_millis(10));
        assert!(entry.is_valid());

        std::thread::sleep(Duration::from_millis(20));

        assert!(!entry.is_valid());
        assert!(entry.time_remaining().is_none());
    }

    #[test]
    fn zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new(1u8, Duration::ZERO);
        assert!(!entry.is_valid());
    }
}
