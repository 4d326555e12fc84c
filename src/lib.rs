//! signalloc: composite scoring and target-allocation engine for
//! bar-driven trading strategies.
//!
//! Hexagonal architecture: scoring and allocation logic in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`]. A host
//! engine owns the event loop and calls [`domain::strategy::Strategy::run`]
//! once per bar; everything in the domain is synchronous and free of I/O.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
