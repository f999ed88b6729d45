//! Wall-clock instants in microseconds since the Unix epoch
//!
//! One type serves three roles: the commit time of a WAL record, the
//! absolute expiry of a stored entry, and the expiry carried in session
//! claims. Every deadline uses the same rule: it has passed once
//! `now >= deadline`.
//!
//! ```
//! use genesis_core::Timestamp;
//! use std::time::Duration;
//!
//! let issued = Timestamp::from_secs(100);
//! let deadline = issued.saturating_add(Duration::from_secs(60));
//! assert_eq!(deadline.remaining_at(issued), Duration::from_secs(60));
//! assert!(deadline.has_passed_at(Timestamp::from_secs(160)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microseconds since the Unix epoch
///
/// Serializes as a bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// 1970-01-01 00:00:00 UTC
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Latest representable instant; a deadline that never passes
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Current wall-clock time
    ///
    /// A clock set before 1970 reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(u64::try_from(since_epoch.as_micros()).unwrap_or(u64::MAX))
    }

    /// From microseconds since the epoch
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// From whole seconds since the epoch
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    /// Microseconds since the epoch
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// `self + duration`, clamped to [`Timestamp::MAX`]
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(micros))
    }

    /// Time elapsed from `earlier` to `self`, or `None` if `earlier` is later
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_micros)
    }

    /// Treating `self` as a deadline: has it passed at `now`?
    #[inline]
    pub fn has_passed_at(&self, now: Timestamp) -> bool {
        now >= *self
    }

    /// Treating `self` as a deadline: time left at `now`, zero once passed
    pub fn remaining_at(&self, now: Timestamp) -> Duration {
        self.duration_since(now).unwrap_or_default()
    }

    /// Strictly later than `other`
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_passes_at_exact_instant() {
        let deadline = Timestamp::from_micros(5_000);
        assert!(!deadline.has_passed_at(Timestamp::from_micros(4_999)));
        assert!(deadline.has_passed_at(Timestamp::from_micros(5_000)));
        assert!(deadline.has_passed_at(Timestamp::from_micros(5_001)));
    }

    #[test]
    fn test_remaining_saturates_at_zero() {
        let deadline = Timestamp::from_secs(10);
        assert_eq!(
            deadline.remaining_at(Timestamp::from_secs(7)),
            Duration::from_secs(3)
        );
        assert_eq!(deadline.remaining_at(Timestamp::from_secs(11)), Duration::ZERO);
        assert!(!Timestamp::MAX.has_passed_at(Timestamp::now()));
    }

    #[test]
    fn test_saturating_add_clamps() {
        assert_eq!(
            Timestamp::MAX.saturating_add(Duration::from_secs(1)),
            Timestamp::MAX
        );
        assert_eq!(
            Timestamp::EPOCH.saturating_add(Duration::from_millis(2_500)),
            Timestamp::from_micros(2_500_000)
        );
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(Timestamp::now().is_after(Timestamp::from_secs(1_577_836_800)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::from_micros(1_000_042).to_string(), "1.000042");
    }
}
