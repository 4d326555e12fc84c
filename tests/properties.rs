//! Property-based invariants for the scoring and allocation core.

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use signalloc::domain::allocation::{TargetAllocation, long_only, proportional};
use signalloc::domain::bar::Bar;
use signalloc::domain::ranking::StreakState;
use signalloc::domain::risk::{HoldingRecord, RiskAction, RiskOverlay};
use signalloc::domain::score::score_to_fraction;

fn score_map(scores: &[f64]) -> HashMap<String, f64> {
    scores
        .iter()
        .enumerate()
        .map(|(i, &s)| (format!("S{i}"), s))
        .collect()
}

fn bars_ending_at(last_close: f64) -> Vec<Bar> {
    let mut bars: Vec<Bar> = (0..20)
        .map(|i| Bar {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000,
        })
        .collect();
    let n = bars.len();
    bars[n - 1].close = last_close;
    bars[n - 1].high = last_close.max(101.0);
    bars[n - 1].low = last_close.min(99.0);
    bars
}

proptest! {
    #[test]
    fn proportional_allocation_stays_on_simplex(
        scores in prop::collection::vec(-100.0f64..100.0, 0..12),
        budget in 0.01f64..1.0,
    ) {
        let alloc = proportional(&score_map(&scores), budget);
        prop_assert!(alloc.is_valid());
        prop_assert!(alloc.total() <= budget + 1e-9);
        for (_, weight) in alloc.iter() {
            prop_assert!(*weight >= 0.0);
        }
    }

    #[test]
    fn normalize_produces_unit_total_or_nothing(
        weights in prop::collection::vec(0.0f64..10.0, 0..12),
    ) {
        let mut alloc = TargetAllocation::new();
        for (i, w) in weights.iter().enumerate() {
            alloc.set(&format!("S{i}"), *w);
        }
        alloc.normalize(1.0);
        if alloc.is_empty() {
            prop_assert!(alloc.total() == 0.0);
        } else {
            prop_assert!((alloc.total() - 1.0).abs() < 1e-9);
        }
        prop_assert!(alloc.is_valid());
    }

    #[test]
    fn long_only_conversion_preserves_gross_weight(
        weights in prop::collection::vec(-1.0f64..1.0, 1..10),
    ) {
        let model: HashMap<String, f64> = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| (format!("S{i}"), w))
            .collect();
        let converted = long_only(&model, "BENCH");

        let gross_in: f64 = model.values().map(|w| w.abs()).sum();
        let total_out: f64 = converted.values().sum();
        prop_assert!((total_out - gross_in).abs() < 1e-9);
        for weight in converted.values() {
            prop_assert!(*weight >= 0.0);
        }
    }

    #[test]
    fn streak_counts_consecutive_qualifications(
        outcomes in prop::collection::vec(any::<bool>(), 1..50),
    ) {
        let mut streaks = StreakState::new();
        let mut expected: u32 = 0;
        for &qualified in &outcomes {
            let count = streaks.observe("A", qualified);
            expected = if qualified { expected + 1 } else { 0 };
            prop_assert_eq!(count, expected);
        }
    }

    #[test]
    fn score_fraction_always_in_unit_interval(score in -1e9f64..1e9) {
        let fraction = score_to_fraction(score);
        prop_assert!((0.0..=1.0).contains(&fraction));
    }

    #[test]
    fn gain_past_final_tier_always_fully_exits(gain in 0.35f64..5.0) {
        let overlay = RiskOverlay::default();
        let record = HoldingRecord::new(100.0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let action = overlay.evaluate(&record, &bars_ending_at(100.0 * (1.0 + gain)));
        prop_assert_eq!(action, RiskAction::FullProfitExit);
    }

    #[test]
    fn gains_below_first_tier_never_trim(gain in -0.001f64..0.0999) {
        let overlay = RiskOverlay::default();
        let record = HoldingRecord::new(100.0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let action = overlay.evaluate(&record, &bars_ending_at(100.0 * (1.0 + gain)));
        prop_assert!(matches!(action, RiskAction::Keep));
    }
}
