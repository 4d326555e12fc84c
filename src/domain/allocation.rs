//! Target allocation vector and normalization helpers.
//!
//! Weights are dimensionless fractions of equity: non-negative, summing to
//! at most 1.0 (the residual is implicitly cash or the safe asset). The
//! vector is produced fresh every invocation and handed to the driver;
//! strategies keep a copy only as the cached last-known allocation.

use std::collections::{BTreeMap, HashMap};

/// Mapping from asset symbol to non-negative target weight. Iteration
/// order is deterministic (sorted by symbol).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetAllocation {
    weights: BTreeMap<String, f64>,
}

impl TargetAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(symbol: &str, weight: f64) -> Self {
        let mut alloc = Self::new();
        alloc.set(symbol, weight);
        alloc
    }

    /// Set a symbol's weight. Non-positive weights remove the entry.
    pub fn set(&mut self, symbol: &str, weight: f64) {
        if weight > 0.0 {
            self.weights.insert(symbol.to_string(), weight);
        } else {
            self.weights.remove(symbol);
        }
    }

    /// Add to a symbol's weight.
    pub fn add(&mut self, symbol: &str, delta: f64) {
        let current = self.get(symbol);
        self.set(symbol, current + delta);
    }

    pub fn get(&self, symbol: &str) -> f64 {
        self.weights.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn remove(&mut self, symbol: &str) {
        self.weights.remove(symbol);
    }

    /// Scale one symbol's weight by a factor (profit-taking trims).
    pub fn scale(&mut self, symbol: &str, factor: f64) {
        let current = self.get(symbol);
        self.set(symbol, current * factor);
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.weights.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &String> {
        self.weights.keys()
    }

    /// Rescale all weights so they sum to `target`. A zero or empty total
    /// leaves the vector untouched.
    pub fn normalize(&mut self, target: f64) {
        let total = self.total();
        if total <= 0.0 {
            return;
        }
        for weight in self.weights.values_mut() {
            *weight = *weight / total * target;
        }
    }

    /// Weight-vector invariant: every weight non-negative and the total at
    /// most 1.0 within epsilon.
    pub fn is_valid(&self) -> bool {
        self.weights.values().all(|w| *w >= 0.0) && self.total() <= 1.0 + 1e-9
    }
}

impl FromIterator<(String, f64)> for TargetAllocation {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut alloc = TargetAllocation::new();
        for (symbol, weight) in iter {
            alloc.add(&symbol, weight);
        }
        alloc
    }
}

/// Weights proportional to `max(score, 0)`, scaled to sum to `budget`.
/// All-zero or empty scores produce an empty vector.
pub fn proportional(scores: &HashMap<String, f64>, budget: f64) -> TargetAllocation {
    let total: f64 = scores.values().map(|s| s.max(0.0)).sum();
    if total <= 0.0 || budget <= 0.0 {
        return TargetAllocation::new();
    }
    let mut alloc = TargetAllocation::new();
    for (symbol, score) in scores {
        let clipped = score.max(0.0);
        if clipped > 0.0 {
            alloc.set(symbol, clipped / total * budget);
        }
    }
    alloc
}

/// Convert a long/short model-weight map to long-only: short legs are
/// dropped and their absolute total redirected to `redirect`.
pub fn long_only(model: &HashMap<String, f64>, redirect: &str) -> HashMap<String, f64> {
    let mut out: HashMap<String, f64> = HashMap::new();
    let mut short_total = 0.0;
    for (symbol, &weight) in model {
        if weight > 0.0 {
            *out.entry(symbol.clone()).or_insert(0.0) += weight;
        } else {
            short_total += weight.abs();
        }
    }
    if short_total > 0.0 {
        *out.entry(redirect.to_string()).or_insert(0.0) += short_total;
    }
    out
}
