//! Macro regime filters and the fixed risk/defensive split they select.
//!
//! A regime filter fixes the split between a risk sleeve and a benchmark or
//! defensive asset independent of individual asset scores.

use tracing::debug;

use crate::domain::bar::Bar;
use crate::domain::rolling::rolling_mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    RiskOn,
    RiskOff,
}

/// Price-above-long-moving-average filter. Insufficient history reads as
/// risk-off.
#[derive(Debug, Clone)]
pub struct MovingAverageRegime {
    pub window: usize,
}

impl Default for MovingAverageRegime {
    fn default() -> Self {
        MovingAverageRegime { window: 200 }
    }
}

impl MovingAverageRegime {
    pub fn evaluate(&self, closes: &[f64]) -> Regime {
        let ma = rolling_mean(closes, self.window);
        match (closes.last(), ma.last().copied().flatten()) {
            (Some(&close), Some(mean)) if close > mean => Regime::RiskOn,
            _ => Regime::RiskOff,
        }
    }
}

/// Ichimoku-baseline pass/fail: last close above the midpoint of the
/// rolling high/low extremes. Insufficient history fails.
#[derive(Debug, Clone)]
pub struct IchimokuRegime {
    pub window: usize,
}

impl Default for IchimokuRegime {
    fn default() -> Self {
        IchimokuRegime { window: 26 }
    }
}

impl IchimokuRegime {
    pub fn passes(&self, bars: &[Bar]) -> bool {
        if bars.len() < self.window || self.window == 0 {
            return false;
        }
        let tail = &bars[bars.len() - self.window..];
        let highest = tail.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = tail.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let baseline = (highest + lowest) / 2.0;
        let passes = tail[tail.len() - 1].close > baseline;
        debug!(baseline, passes, "ichimoku baseline check");
        passes
    }
}

/// Policy constants for the regime carve-out. In a risk-on regime the
/// anchor weight goes to the benchmark and the sleeve budget to scored
/// assets; risk-off swaps the anchor to the defensive asset.
#[derive(Debug, Clone)]
pub struct RegimeSplit {
    pub risk_on_anchor: f64,
    pub risk_on_sleeve: f64,
    pub risk_off_anchor: f64,
    pub risk_off_sleeve: f64,
}

impl Default for RegimeSplit {
    fn default() -> Self {
        RegimeSplit {
            risk_on_anchor: 0.25,
            risk_on_sleeve: 0.75,
            risk_off_anchor: 0.50,
            risk_off_sleeve: 0.50,
        }
    }
}

impl RegimeSplit {
    /// (anchor weight, sleeve budget) for the given regime.
    pub fn for_regime(&self, regime: Regime) -> (f64, f64) {
        match regime {
            Regime::RiskOn => (self.risk_on_anchor, self.risk_on_sleeve),
            Regime::RiskOff => (self.risk_off_anchor, self.risk_off_sleeve),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                symbol: "SPY".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Days::new(i as u64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn ma_regime_risk_on_above_mean() {
        let filter = MovingAverageRegime { window: 5 };
        let closes = [100.0, 100.0, 100.0, 100.0, 110.0];
        assert_eq!(filter.evaluate(&closes), Regime::RiskOn);
    }

    #[test]
    fn ma_regime_risk_off_below_mean() {
        let filter = MovingAverageRegime { window: 5 };
        let closes = [100.0, 100.0, 100.0, 100.0, 90.0];
        assert_eq!(filter.evaluate(&closes), Regime::RiskOff);
    }

    #[test]
    fn ma_regime_short_history_is_risk_off() {
        let filter = MovingAverageRegime { window: 200 };
        assert_eq!(filter.evaluate(&[100.0, 110.0]), Regime::RiskOff);
    }

    #[test]
    fn ichimoku_passes_above_baseline() {
        let filter = IchimokuRegime { window: 5 };
        // highs 101..105+1, lows -1; baseline well below the last close
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 110.0]);
        assert!(filter.passes(&bars));
    }

    #[test]
    fn ichimoku_fails_below_baseline() {
        let filter = IchimokuRegime { window: 5 };
        let bars = make_bars(&[110.0, 110.0, 110.0, 110.0, 100.0]);
        assert!(!filter.passes(&bars));
    }

    #[test]
    fn ichimoku_short_history_fails() {
        let filter = IchimokuRegime::default();
        let bars = make_bars(&[100.0, 110.0]);
        assert!(!filter.passes(&bars));
    }

    #[test]
    fn split_selects_anchor_and_sleeve() {
        let split = RegimeSplit::default();
        assert_eq!(split.for_regime(Regime::RiskOn), (0.25, 0.75));
        assert_eq!(split.for_regime(Regime::RiskOff), (0.50, 0.50));
    }
}
