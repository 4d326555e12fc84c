//! Per-invocation market snapshot handed in by the driver.
//!
//! The snapshot is read-only for the strategy: bar histories are
//! chronological and include the current bar; fundamental and
//! model-portfolio series are optional joins keyed by symbol or provider.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use crate::domain::bar::Bar;
use crate::domain::fundamentals::{AnalystEstimate, DcfValuation, EarningsSurprise};

/// One dated model-portfolio record from an external provider. Weights may
/// be negative (short legs) and need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAllocation {
    pub date: NaiveDate,
    pub weights: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub bars: HashMap<String, Vec<Bar>>,
    pub earnings: HashMap<String, Vec<EarningsSurprise>>,
    pub estimates: HashMap<String, Vec<AnalystEstimate>>,
    pub valuations: HashMap<String, Vec<DcfValuation>>,
    pub model_portfolios: HashMap<String, Vec<ModelAllocation>>,
    pub holdings: HashMap<String, f64>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bar history for a symbol; empty when the symbol is unknown.
    pub fn history(&self, symbol: &str) -> &[Bar] {
        self.bars.get(symbol).map_or(&[], |b| b.as_slice())
    }

    pub fn last_bar(&self, symbol: &str) -> Option<&Bar> {
        self.bars.get(symbol).and_then(|b| b.last())
    }

    pub fn last_close(&self, symbol: &str) -> Option<f64> {
        self.last_bar(symbol).map(|b| b.close)
    }

    /// The most recent bar date across all symbols.
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.bars
            .values()
            .filter_map(|b| b.last())
            .map(|b| b.date)
            .max()
    }

    pub fn earnings_for(&self, symbol: &str) -> &[EarningsSurprise] {
        self.earnings.get(symbol).map_or(&[], |s| s.as_slice())
    }

    pub fn estimates_for(&self, symbol: &str) -> &[AnalystEstimate] {
        self.estimates.get(symbol).map_or(&[], |s| s.as_slice())
    }

    pub fn valuations_for(&self, symbol: &str) -> &[DcfValuation] {
        self.valuations.get(symbol).map_or(&[], |s| s.as_slice())
    }

    /// Latest model-portfolio record from a provider, if any.
    pub fn model_portfolio(&self, provider: &str) -> Option<&ModelAllocation> {
        self.model_portfolios.get(provider).and_then(|s| s.last())
    }

    /// Held quantity for a symbol; 0.0 when holdings are not supplied.
    pub fn held(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).copied().unwrap_or(0.0)
    }

    /// Whether the driver supplied any holdings at all. When it did not,
    /// strategies fall back to their own holding book.
    pub fn has_holdings(&self) -> bool {
        !self.holdings.is_empty()
    }
}

/// Sorted union of all bar dates across symbols.
pub fn unified_timeline(bars: &HashMap<String, Vec<Bar>>) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = bars
        .values()
        .flat_map(|b| b.iter().map(|bar| bar.date))
        .collect();
    dates.into_iter().collect()
}
