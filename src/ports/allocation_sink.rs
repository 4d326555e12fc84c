//! Allocation output port: where the driver hands each period's target
//! allocation.

use chrono::NaiveDate;

use crate::domain::allocation::TargetAllocation;
use crate::domain::error::SignallocError;

pub trait AllocationSink {
    fn record(
        &mut self,
        date: NaiveDate,
        allocation: &TargetAllocation,
    ) -> Result<(), SignallocError>;

    /// Flush any buffered output. Default is a no-op.
    fn finish(&mut self) -> Result<(), SignallocError> {
        Ok(())
    }
}
