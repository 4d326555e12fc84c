//! Shared helpers for integration tests.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Write a `SYMBOL.csv` bar file with one calendar-day bar per close.
pub fn write_bars_csv(dir: &Path, symbol: &str, closes: &[f64], start: NaiveDate) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for (i, close) in closes.iter().enumerate() {
        let date = start + chrono::Days::new(i as u64);
        writeln!(
            content,
            "{},{:.4},{:.4},{:.4},{:.4},{}",
            date.format("%Y-%m-%d"),
            close,
            close * 1.01,
            close * 0.99,
            close,
            1_000_000
        )
        .unwrap();
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

pub fn rising_closes(len: usize, start: f64, step: f64) -> Vec<f64> {
    (0..len).map(|i| start + i as f64 * step).collect()
}

pub fn flat_closes(len: usize, level: f64) -> Vec<f64> {
    vec![level; len]
}

pub fn start_date() -> NaiveDate {
    // a Monday, so weekday-gated cadences are predictable
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}
