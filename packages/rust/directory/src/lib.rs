//! Directory service access: who is in the workspace and what it is called.
//!
//! The pipeline only needs two things from a directory: the raw member
//! roster and the workspace's display name. [`DirectoryService`] captures
//! that; [`SlackDirectory`] implements it over the Slack Web API.

mod slack;

use async_trait::async_trait;
use rosterlink_shared::{Member, Result};

pub use slack::{SlackDirectory, SlackOptions};

/// Source of the raw member roster.
///
/// Credentials are bound when the implementation is constructed. Any error
/// returned here is fatal to a run; a rejected credential surfaces as
/// [`RosterLinkError::Auth`](rosterlink_shared::RosterLinkError::Auth).
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Every member of the workspace, in directory order.
    async fn list_members(&self) -> Result<Vec<Member>>;

    /// The workspace display name.
    async fn team_name(&self) -> Result<String>;
}
