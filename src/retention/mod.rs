//! Capacity-driven retention: delete the oldest rows in bounded batches
//! once disk usage crosses the configured threshold.

pub mod monitor;
