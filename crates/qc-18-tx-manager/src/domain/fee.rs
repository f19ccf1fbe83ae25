//! Linear fee escalation
//!
//! Fees are `U256` values passed by copy. No attempt ever observes another
//! attempt's fee changing underneath it.

use primitive_types::U256;

/// Bump `current` by `increment`, clamping the result to `max`.
///
/// Returns a new value and leaves the inputs untouched. Addition saturates,
/// so the function is total over the whole `U256` range.
pub fn next_fee(current: U256, increment: U256, max: U256) -> U256 {
    current.saturating_add(increment).min(max)
}

/// The sequence of fees a single send will offer.
///
/// Yields `min`, then `min + increment`, ... and finally `max` exactly once.
/// A zero increment never reaches the ceiling, so the schedule only
/// terminates for validated configurations.
#[derive(Clone, Debug)]
pub struct FeeSchedule {
    next: Option<U256>,
    increment: U256,
    max: U256,
}

impl FeeSchedule {
    /// Create a schedule starting at `min`
    pub fn new(min: U256, increment: U256, max: U256) -> Self {
        Self {
            next: Some(min.min(max)),
            increment,
            max,
        }
    }

    /// Number of distinct fees the schedule offers, saturating at `u64::MAX`.
    ///
    /// A send that never confirms times out after this many resubmission
    /// intervals.
    pub fn len_hint(&self) -> u64 {
        let Some(start) = self.next else {
            return 0;
        };
        if self.increment.is_zero() {
            return if start >= self.max { 1 } else { u64::MAX };
        }
        let span = self.max - start;
        let mut steps = span / self.increment;
        if !(span % self.increment).is_zero() {
            steps += U256::one();
        }
        if steps >= U256::from(u64::MAX) {
            u64::MAX
        } else {
            steps.low_u64() + 1
        }
    }
}

impl Iterator for FeeSchedule {
    type Item = U256;

    fn next(&mut self) -> Option<U256> {
        let current = self.next?;
        self.next = if current >= self.max {
            None
        } else {
            Some(next_fee(current, self.increment, self.max))
        };
        Some(current)
    }
}
