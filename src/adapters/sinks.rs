//! Allocation sinks: console output and a CSV writer.

use chrono::NaiveDate;
use std::fs::File;
use std::path::Path;

use crate::domain::allocation::TargetAllocation;
use crate::domain::error::SignallocError;
use crate::ports::allocation_sink::AllocationSink;

/// Prints one line per symbol and period to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl AllocationSink for ConsoleSink {
    fn record(
        &mut self,
        date: NaiveDate,
        allocation: &TargetAllocation,
    ) -> Result<(), SignallocError> {
        if allocation.is_empty() {
            println!("{date}  (no position)");
            return Ok(());
        }
        for (symbol, weight) in allocation.iter() {
            println!("{date}  {symbol:<8} {weight:.4}");
        }
        Ok(())
    }
}

/// Writes `date,symbol,weight` rows to a CSV file.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SignallocError> {
        let file = File::create(path.as_ref())?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(["date", "symbol", "weight"])
            .map_err(|e| SignallocError::Data {
                reason: format!("CSV write error: {e}"),
            })?;
        Ok(Self { writer })
    }
}

impl AllocationSink for CsvSink {
    fn record(
        &mut self,
        date: NaiveDate,
        allocation: &TargetAllocation,
    ) -> Result<(), SignallocError> {
        for (symbol, weight) in allocation.iter() {
            self.writer
                .write_record([
                    date.format("%Y-%m-%d").to_string(),
                    symbol.clone(),
                    format!("{weight:.6}"),
                ])
                .map_err(|e| SignallocError::Data {
                    reason: format!("CSV write error: {e}"),
                })?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SignallocError> {
        self.writer.flush().map_err(SignallocError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn csv_sink_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("allocations.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        let mut alloc = TargetAllocation::new();
        alloc.set("SPY", 0.6);
        alloc.set("BIL", 0.4);
        sink.record(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), &alloc)
            .unwrap();
        sink.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,symbol,weight");
        assert_eq!(lines[1], "2024-01-02,BIL,0.400000");
        assert_eq!(lines[2], "2024-01-02,SPY,0.600000");
    }

    #[test]
    fn console_sink_accepts_empty_allocation() {
        let mut sink = ConsoleSink;
        let alloc = TargetAllocation::new();
        assert!(
            sink.record(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), &alloc)
                .is_ok()
        );
    }
}
