//! Shared types, error model, and configuration for RosterLink.
//!
//! This crate is the foundation depended on by all other RosterLink crates.
//! It provides:
//! - [`RosterLinkError`]: the unified error type
//! - Domain types ([`Member`], [`ProfileUrl`], [`EnrichedRecord`], [`RunSummary`])
//! - Configuration ([`AppConfig`], [`SearchOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AirtableConfig, AppConfig, Credentials, OutputConfig, SearchConfig, SearchOptions,
    SlackConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_credentials, validate_store_target,
};
pub use error::{Result, RosterLinkError};
pub use types::{
    EnrichedRecord, LOOKUP_ERROR, Member, MemberProfile, NOT_FOUND, ProfileUrl, RecordId,
    ResolutionResult, RunId, RunSummary,
};
