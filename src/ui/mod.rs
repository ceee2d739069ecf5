//! Terminal presentation of a benchmark run

pub mod report;
