//! Core domain logic and pipeline orchestration for RosterLink.
//!
//! This crate ties the directory, search and storage collaborators together
//! into the member-resolution pipeline (see [`pipeline::run_roster`]).

pub mod filter;
pub mod organization;
pub mod pipeline;
pub mod progress;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use filter::{eligible_members, is_eligible};
pub use organization::infer_organization;
pub use pipeline::{EnrichmentPipeline, PipelineState, RunOptions, run_roster};
pub use progress::{BroadcastProgress, ProgressEvent, ProgressReporter, SilentProgress};
pub use resolver::ProfileResolver;
