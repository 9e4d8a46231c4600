//! # autolink-engine
//!
//! Automatic content linking for HTML: occurrences of configured keywords,
//! post titles and taxonomy term names are wrapped in anchors, under global,
//! per-rule and per-destination link budgets, without ever touching
//! existing anchors, scripts, styles or (optionally) headings and captions.
//!
//! ## Quick Start
//!
//! ```rust
//! use autolink_engine::{
//!   AutolinkProcessor,
//!   CandidateSet,
//!   LinkRule,
//!   ProcessingContext,
//!   RunConfig,
//! };
//!
//! let candidates = CandidateSet {
//!   keywords: vec![LinkRule::new("WordPress", "/wp", false)],
//!   ..Default::default()
//! };
//! let config = RunConfig {
//!   max_links_per_rule: 2,
//!   ..Default::default()
//! };
//!
//! let processor = AutolinkProcessor::new(config);
//! let html = processor.process(
//!   "I love WordPress and wordpress.",
//!   &candidates,
//!   &ProcessingContext::default(),
//! );
//!
//! assert_eq!(
//!   html,
//!   "I love <a href=\"/wp\">WordPress</a> and <a href=\"/wp\">wordpress</a>."
//! );
//! ```
//!
//! ## Pipeline
//!
//! 1. [`shield`] replaces protected regions with placeholder comments
//! 2. the keyword, post-title and taxonomy-term stages run in that order,
//!    sharing one [`budget::LinkBudget`]; every literal goes through
//!    [`pattern::build`]
//! 3. the placeholders are restored
//! 4. [`postprocess`] adds `target`/`rel` attributes to external anchors

pub mod budget;
pub mod candidates;
pub mod error;
pub mod pattern;
pub mod postprocess;
pub mod processor;
pub mod shield;
pub mod utils;

pub use crate::{
  candidates::{
    CandidateSet,
    CandidateSource,
    LinkRule,
    PostCandidate,
    TermCandidate,
    parse_keyword_lines,
  },
  error::{AutolinkError, AutolinkResult},
  processor::{
    AutolinkProcessor,
    InsertedLink,
    LinkResult,
    LinkStage,
    ProcessingContext,
    RunConfig,
    RunConfigBuilder,
    clamp_limit,
    process,
    process_with_recovery,
  },
};
