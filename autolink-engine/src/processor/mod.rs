//! The linking pipeline.
//!
//! - [`core`]: `AutolinkProcessor` and the shield, stages, restore and
//!   post-processing sequence
//! - [`passes`]: the keyword, post-title and taxonomy-term stages
//! - [`process`]: high-level processing functions with error recovery
//! - [`types`]: run configuration, processing context and result types
pub mod core;
mod passes;
pub mod process;
pub mod types;

pub use process::{process, process_with_recovery};
pub use types::{
  AutolinkProcessor,
  InsertedLink,
  LinkResult,
  LinkStage,
  ProcessingContext,
  RunConfig,
  RunConfigBuilder,
  clamp_limit,
};
