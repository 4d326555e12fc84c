//! Concrete port implementations for the reference driver.

pub mod csv_bars;
pub mod csv_tables;
pub mod ini_config;
pub mod sinks;
