//! End-to-end import pipelines, one per data source

pub mod nflverse;
pub mod pfr;
