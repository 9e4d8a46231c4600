//! Expose autolink's internal API for use in integration testing. The engine
//! itself lives in `autolink-engine`; this crate only wires configuration,
//! the filesystem and the thread pool around it.
pub mod cli;
pub mod config;
pub mod utils;
