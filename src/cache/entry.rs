//! Cache Item Module
//!
//! Defines individual cache items and the expiration policy applied on insert.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

// == Expiration ==
/// Lifetime requested for an item at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the cache's default expiration
    #[default]
    Default,
    /// The item never expires
    Never,
    /// The item expires this long after insertion
    After(Duration),
}

impl Expiration {
    // == Signed Seconds ==
    /// Maps the signed-seconds convention onto an expiration:
    /// zero uses the default, negative never expires, positive is a lifetime.
    pub fn from_secs_signed(secs: i64) -> Self {
        match secs {
            0 => Expiration::Default,
            s if s < 0 => Expiration::Never,
            s => Expiration::After(Duration::from_secs(s.unsigned_abs())),
        }
    }

    // == Resolve ==
    /// Resolves to a concrete lifetime against the cache default.
    ///
    /// `None` means the item never expires. A zero default never expires, and
    /// `After(Duration::ZERO)` falls back to the default.
    pub fn resolve(self, default: Duration) -> Option<Duration> {
        match self {
            Expiration::Never => None,
            Expiration::After(lifetime) if !lifetime.is_zero() => Some(lifetime),
            Expiration::After(_) | Expiration::Default => {
                if default.is_zero() {
                    None
                } else {
                    Some(default)
                }
            }
        }
    }
}

impl From<Duration> for Expiration {
    fn from(lifetime: Duration) -> Self {
        if lifetime.is_zero() {
            Expiration::Default
        } else {
            Expiration::After(lifetime)
        }
    }
}

// == Item ==
/// A single cached value with its metadata.
#[derive(Debug, Clone)]
pub struct Item<V> {
    /// The stored value
    pub value: V,
    /// Wall-clock time of insertion
    pub created_at: DateTime<Utc>,
    /// Monotonic deadline, None = never expires
    pub expire_at: Option<Instant>,
}

impl<V> Item<V> {
    // == Constructor ==
    /// Creates a new item that lives for `lifetime`, or forever if `None`.
    pub fn new(value: V, lifetime: Option<Duration>) -> Self {
        // A deadline past the representable range is as good as never.
        let expire_at = lifetime.and_then(|d| Instant::now().checked_add(d));

        Self {
            value,
            created_at: Utc::now(),
            expire_at,
        }
    }

    // == Is Expired ==
    /// Checks if the item has expired.
    ///
    /// An item is live while the current time is at or before its deadline and
    /// expired once the current time is strictly after it.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiration against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expire_at {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the item never expires.
    ///
    /// Returns `Some(Duration::ZERO)` once the item has expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expire_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}
