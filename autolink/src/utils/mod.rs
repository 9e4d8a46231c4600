//! Batch relinking: candidate loading, per-document context and the
//! parallel directory walk.
pub mod candidates;
pub mod document;
pub mod link;

pub use candidates::load_candidates;
pub use document::{context_for, document_url, extract_title, split_body};
pub use link::{RunSummary, relink_directory, write_report};
