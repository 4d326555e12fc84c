//! Symbol universe parsing and validation against a bar source.
//!
//! Parses symbol lists from configuration and checks each symbol has
//! enough history before a replay starts.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::domain::error::SignallocError;
use crate::ports::bar_source::BarSource;

pub const MIN_BARS: usize = 30;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated symbol list: trimmed, uppercased, duplicates
/// rejected.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if seen.contains(&symbol) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        seen.insert(symbol.clone());
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug)]
pub struct UniverseValidation {
    pub symbols: Vec<String>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Keep the symbols a bar source can actually serve with at least
/// [`MIN_BARS`] bars in the window; report the rest. Errors only when every
/// symbol fails.
pub fn validate_universe(
    source: &dyn BarSource,
    symbols: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<UniverseValidation, SignallocError> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let bars = match source.fetch_bars(&symbol, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                eprintln!("Warning: skipping {symbol} ({e})");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.is_empty() {
            eprintln!("Warning: skipping {symbol} (no data found)");
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if bars.len() < MIN_BARS {
            eprintln!(
                "Warning: skipping {symbol} (only {} bars, minimum {} required)",
                bars.len(),
                MIN_BARS
            );
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        valid.push(symbol);
    }

    if valid.is_empty() {
        return Err(SignallocError::InsufficientData {
            symbol: "all".to_string(),
            bars: 0,
            minimum: MIN_BARS,
        });
    }

    Ok(UniverseValidation {
        symbols: valid,
        skipped,
    })
}
