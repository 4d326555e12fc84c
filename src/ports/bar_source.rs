//! Bar history access port.

use chrono::NaiveDate;

use crate::domain::bar::Bar;
use crate::domain::error::SignallocError;

pub trait BarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, SignallocError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignallocError>;

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignallocError>;
}
