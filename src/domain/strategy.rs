//! The driver-facing strategy contract and rebalance cadence gating.

use chrono::{NaiveDate, Weekday};

use crate::domain::allocation::TargetAllocation;
use crate::domain::snapshot::MarketSnapshot;

/// Bar interval a strategy expects from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Daily,
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Daily => write!(f, "1day"),
        }
    }
}

/// A bar-driven signal strategy. The host engine owns the event loop and
/// calls [`Strategy::run`] once per bar with the full history to date; the
/// strategy owns its rolling state and returns a fresh target allocation
/// each call. State mutations land only after the allocation is fully
/// computed, so a returned allocation never reflects a partial update.
pub trait Strategy: std::fmt::Debug {
    /// Symbols this strategy wants bar history for.
    fn assets(&self) -> Vec<String>;

    fn interval(&self) -> Interval {
        Interval::Daily
    }

    /// Bars of history needed before the first meaningful output.
    fn warmup(&self) -> usize;

    fn run(&mut self, snapshot: &MarketSnapshot) -> TargetAllocation;
}

/// When cadence-gated work (scoring, ranking, entries) is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every N bars, counted by invocations.
    EveryNBars(u32),
    /// On a fixed day of the week.
    Weekly(Weekday),
}

/// Cadence with its counter state. The bar counter starts saturated so the
/// first invocation of an `EveryNBars` cadence rebalances immediately.
#[derive(Debug, Clone)]
pub struct CadenceClock {
    cadence: Cadence,
    bars_since_rebalance: u32,
}

impl CadenceClock {
    pub fn new(cadence: Cadence) -> Self {
        let bars_since_rebalance = match cadence {
            Cadence::EveryNBars(n) => n,
            Cadence::Weekly(_) => 0,
        };
        CadenceClock {
            cadence,
            bars_since_rebalance,
        }
    }

    /// Advance one bar and report whether this period rebalances.
    pub fn tick(&mut self, date: NaiveDate) -> bool {
        match self.cadence {
            Cadence::EveryNBars(n) => {
                self.bars_since_rebalance += 1;
                if self.bars_since_rebalance >= n {
                    self.bars_since_rebalance = 0;
                    true
                } else {
                    false
                }
            }
            Cadence::Weekly(day) => {
                use chrono::Datelike;
                date.weekday() == day
            }
        }
    }
}
