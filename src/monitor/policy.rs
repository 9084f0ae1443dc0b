//! Escalation policy - pure decision for one tracked transaction.

use super::store::TrackedTransaction;
use crate::config::BumpConfig;

/// Smallest fee-rate increase (sat/vB) worth a replacement; bitcoind's
/// incremental relay fee.
pub const MINIMUM_INCREMENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BumpPolicy {
    pub interval_blocks: u64,
    pub bump_amount: f64,
    pub fee_cap: f64,
    pub apply: bool,
}

impl BumpPolicy {
    pub fn new(interval_blocks: u64, bump_amount: f64, fee_cap: f64) -> Self {
        Self { interval_blocks, bump_amount, fee_cap, apply: false }
    }

    pub fn applying(mut self) -> Self {
        self.apply = true;
        self
    }

    pub fn dry_run(&self) -> bool {
        !self.apply
    }

    /// `min(rate + bump, cap)`, never below `rate`.
    pub fn candidate_rate(&self, rate: f64) -> f64 {
        (rate + self.bump_amount).min(self.fee_cap).max(rate)
    }

    pub fn evaluate(&self, tx: &TrackedTransaction, height: u64) -> Escalation {
        let age = tx.age(height);
        if age < self.interval_blocks as i64 {
            return Escalation::NotDue { age };
        }
        let candidate = self.candidate_rate(tx.fee_rate);
        if candidate - tx.fee_rate >= MINIMUM_INCREMENT {
            Escalation::Bump { candidate, rounded: candidate.round() as u64 }
        } else {
            Escalation::BelowIncrement { candidate }
        }
    }
}

impl From<&BumpConfig> for BumpPolicy {
    fn from(c: &BumpConfig) -> Self {
        Self { interval_blocks: c.bump_interval_blocks, bump_amount: c.fee_bump_amount, fee_cap: c.fee_cap, apply: c.apply }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escalation {
    /// Younger than the bump interval.
    NotDue { age: i64 },
    /// Replace at `rounded` sat/vB.
    Bump { candidate: f64, rounded: u64 },
    /// Cap leaves less than [`MINIMUM_INCREMENT`] of headroom.
    BelowIncrement { candidate: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BumpPolicy {
        BumpPolicy::new(5, 2.0, 10.0)
    }

    #[test]
    fn capped_candidate_below_increment() {
        let tx = TrackedTransaction::new("aa", "w", 100, 9.5);
        assert_eq!(policy().evaluate(&tx, 105), Escalation::BelowIncrement { candidate: 10.0 });
    }

    #[test]
    fn uncapped_candidate_bumps() {
        let tx = TrackedTransaction::new("aa", "w", 100, 5.0);
        assert_eq!(policy().evaluate(&tx, 106), Escalation::Bump { candidate: 7.0, rounded: 7 });
    }

    #[test]
    fn not_due_before_interval() {
        let tx = TrackedTransaction::new("aa", "w", 100, 5.0);
        assert_eq!(policy().evaluate(&tx, 104), Escalation::NotDue { age: 4 });
        assert!(matches!(policy().evaluate(&tx, 105), Escalation::Bump { .. }));
    }

    #[test]
    fn still_evaluated_long_after_interval() {
        let tx = TrackedTransaction::new("aa", "w", 100, 9.5);
        for height in 105..200 {
            assert!(!matches!(policy().evaluate(&tx, height), Escalation::NotDue { .. }));
        }
    }

    #[test]
    fn candidate_is_min_of_bump_and_cap() {
        let p = policy();
        for (rate, expected) in [(0.0, 2.0), (3.3, 5.3), (8.0, 10.0), (10.0, 10.0)] {
            assert!((p.candidate_rate(rate) - expected).abs() < 1e-12, "rate {}", rate);
        }
    }

    #[test]
    fn candidate_never_below_tracked_rate() {
        let p = policy();
        assert_eq!(p.candidate_rate(25.0), 25.0);
        let tx = TrackedTransaction::new("aa", "w", 100, 25.0);
        assert_eq!(p.evaluate(&tx, 110), Escalation::BelowIncrement { candidate: 25.0 });
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        let p = BumpPolicy::new(0, 1.5, 100.0);
        let tx = TrackedTransaction::new("aa", "w", 1, 4.0);
        assert_eq!(p.evaluate(&tx, 1), Escalation::Bump { candidate: 5.5, rounded: 6 });
    }

    #[test]
    fn dry_run_is_inverse_of_apply() {
        assert!(policy().dry_run());
        assert!(!policy().applying().dry_run());
    }
}
