//! The module contains the representation of the piggy bank.
//!
//! The piggy bank is a bounded container for banked savings. Its bound, the
//! capacity, is one of the [`TIERS`]. When the fill reaches the capacity the
//! piggy bank "explodes": the capacity is moved into the lifetime total, the
//! remainder carries over and the capacity advances to the next tier.
//!
//! ** Examples
//!
//! A piggy bank at tier 30 holding 25 receives 40. The fill becomes 65, which
//! overflows tier 30 (fill 35, lifetime +30, tier 50) and then tier 50
//! (fill 15, lifetime +50, tier 100). The result is fill 15 at tier 100 with
//! 80 added to the lifetime total.
//!
//! The last tier never overflows: there is no tier to roll into, so the fill
//! keeps growing past it.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Capacities of the piggy bank, in ascending order.
pub const TIERS: [u32; 9] = [30, 50, 100, 200, 500, 1000, 2000, 5000, 10000];

/// First tier strictly greater than `capacity`, if any.
pub fn next_tier(capacity: u32) -> Option<u32> {
    TIERS.iter().copied().find(|tier| *tier > capacity)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiggyBank {
    pub current_amount: Money,
    pub capacity_level: u32,
    pub total_saved_history: Money,
    /// Day whose savings last advanced the tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_upgraded_at: Option<NaiveDate>,
}

impl Default for PiggyBank {
    fn default() -> Self {
        Self {
            current_amount: Money::ZERO,
            capacity_level: TIERS[0],
            total_saved_history: Money::ZERO,
            last_upgraded_at: None,
        }
    }
}

impl PiggyBank {
    /// Returns a copy holding `amount` more, with every overflow applied.
    ///
    /// `amount` is a [`Money`], so it is never negative: the piggy bank only
    /// ever grows.
    #[must_use]
    pub fn apply_increment(&self, amount: Money) -> PiggyBank {
        let mut bank = self.clone();
        bank.current_amount += amount;

        while bank.current_amount.value() >= f64::from(bank.capacity_level) {
            let Some(next) = next_tier(bank.capacity_level) else {
                break;
            };
            let capacity = Money::from(bank.capacity_level);
            bank.current_amount = bank.current_amount.saturating_sub(capacity);
            bank.total_saved_history += capacity;
            bank.capacity_level = next;
        }

        bank
    }

    /// `true` when the capacity is the last tier.
    pub fn is_max_tier(&self) -> bool {
        next_tier(self.capacity_level).is_none()
    }

    /// 1-based position of the current capacity in [`TIERS`].
    pub fn level(&self) -> usize {
        TIERS
            .iter()
            .position(|tier| *tier == self.capacity_level)
            .map_or(0, |idx| idx + 1)
    }

    /// Fill ratio, `1.0` meaning full. May exceed `1.0` at the last tier.
    pub fn progress(&self) -> f64 {
        self.current_amount.value() / f64::from(self.capacity_level)
    }

    pub fn validate(&self) -> ResultEngine<()> {
        if !TIERS.contains(&self.capacity_level) {
            return Err(EngineError::InvalidAmount(format!(
                "capacity {} is not a piggy bank tier",
                self.capacity_level
            )));
        }
        Ok(())
    }
}
