//! The crowdfunding project as read back from the contract.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};

/// Progress is tracked in basis points so it can be computed exactly.
const FULL_PROGRESS_BP: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Minimal units.
    pub funding_goal: U256,
    /// Sum of contributions, in minimal units.
    pub current_funding: U256,
    /// Unix seconds.
    pub deadline: u64,
    pub creator: Address,
    /// Set by the contract only.
    pub is_completed: bool,
}

impl Project {
    /// Funding progress in basis points, clamped to 100%.
    ///
    /// A zero goal counts as met once anything has been raised.
    pub fn progress_basis_points(&self) -> u32 {
        if self.funding_goal.is_zero() {
            return if self.current_funding.is_zero() {
                0
            } else {
                FULL_PROGRESS_BP
            };
        }
        let full = U256::from(FULL_PROGRESS_BP);
        let bp = self.current_funding.saturating_mul(full) / self.funding_goal;
        if bp >= full {
            FULL_PROGRESS_BP
        } else {
            bp.to::<u32>()
        }
    }

    /// Width of the progress bar, `0.0..=100.0`.
    pub fn progress_percent(&self) -> f64 {
        f64::from(self.progress_basis_points()) / 100.0
    }

    /// Deadlines beyond `i64::MAX` seconds never pass.
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        i64::try_from(self.deadline).is_ok_and(|deadline| now.timestamp() > deadline)
    }

    pub fn goal_reached(&self) -> bool {
        self.current_funding >= self.funding_goal
    }

    pub fn is_creator(&self, account: &Address) -> bool {
        self.creator == *account
    }

    /// Whether the contribute action is offered.
    pub fn accepts_contributions(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && !self.deadline_passed(now)
    }

    /// Whether the withdraw action is offered to `viewer`.
    pub fn can_withdraw(&self, viewer: &Address, now: DateTime<Utc>) -> bool {
        self.is_creator(viewer) && (self.goal_reached() || self.deadline_passed(now))
    }

    pub fn deadline_date(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.deadline)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
