//! Hardware timestamps

use std::cmp::Ordering;
use std::fmt;

/// Absolute hardware clock time
///
/// Whole seconds plus a fractional part that is always kept in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timestamp {
    full_secs: i64,
    frac_secs: f64,
}

impl Timestamp {
    /// Create a timestamp, carrying any whole seconds out of `frac_secs`
    ///
    /// A non-finite fractional part is treated as zero.
    pub fn new(full_secs: i64, frac_secs: f64) -> Self {
        if !frac_secs.is_finite() {
            return Self {
                full_secs,
                frac_secs: 0.0,
            };
        }
        let carry = frac_secs.floor();
        let mut frac = frac_secs - carry;
        let mut full = full_secs.saturating_add(carry as i64);
        // floor() rounding can leave exactly 1.0 for tiny negative inputs
        if frac >= 1.0 {
            frac -= 1.0;
            full = full.saturating_add(1);
        }
        Self {
            full_secs: full,
            frac_secs: frac,
        }
    }

    /// Timestamp from a number of seconds
    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(0, secs)
    }

    /// Whole seconds
    pub fn full_secs(&self) -> i64 {
        self.full_secs
    }

    /// Fractional seconds in `[0, 1)`
    pub fn frac_secs(&self) -> f64 {
        self.frac_secs
    }

    /// Time as a single `f64` (loses precision for large times)
    pub fn as_secs_f64(&self) -> f64 {
        self.full_secs as f64 + self.frac_secs
    }

    /// Timestamp shifted forward by `secs`
    pub fn offset(&self, secs: f64) -> Self {
        Self::new(self.full_secs, self.frac_secs + secs)
    }
}

impl Eq for Timestamp {}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full_secs
            .cmp(&other.full_secs)
            .then(self.frac_secs.total_cmp(&other.frac_secs))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = ((self.frac_secs * 1e9).round() as u64).min(999_999_999);
        write!(f, "{}.{:09}s", self.full_secs, nanos)
    }
}

/// Value of the `time` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpec {
    /// Apply at this hardware time
    At(Timestamp),
    /// Clear any pending command time and apply immediately
    Clear,
}
