// pgslice - Postgres 시간 기준 범위 파티셔닝 도구
// prep / add_partitions / fill / analyze / swap / unswap / unprep

pub mod cli;
pub mod commands;
pub mod constants;
pub mod db;
pub mod error;
pub mod fill;
pub mod lifecycle;
pub mod partition;
pub mod table;

#[cfg(test)]
mod testing;

pub use error::{Result, SliceError};
