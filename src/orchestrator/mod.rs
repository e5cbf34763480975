//! Orchestrator module for coordinating aggregation cycles
//! Fetches every source for an asset, merges, synthesizes and persists snapshots

pub mod aggregator;
pub mod flight;
pub mod scheduler;

// Re-export main orchestrators
pub use aggregator::{Aggregator, CycleOutput, CycleReport, DataOrigin};
pub use flight::{FlightToken, SingleFlight};
pub use scheduler::{AggregationJob, CycleJob, PriceJob, PriceRunner, Scheduler};
