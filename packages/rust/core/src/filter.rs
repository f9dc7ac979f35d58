//! Roster filtering: which members get a profile lookup.

use rosterlink_shared::Member;

/// Whether a member is a human with a usable display name.
///
/// Automated accounts are excluded, as are members whose name is missing or
/// blank, or whose name contains "bot" in any casing (service users such as
/// Slackbot are not always flagged as automated).
pub fn is_eligible(member: &Member) -> bool {
    if member.is_automated {
        return false;
    }
    match member.real_name.as_deref() {
        Some(name) if !name.trim().is_empty() => !name.to_lowercase().contains("bot"),
        _ => false,
    }
}

/// Eligible members, in roster order.
pub fn eligible_members(members: &[Member]) -> Vec<Member> {
    members.iter().filter(|m| is_eligible(m)).cloned().collect()
}
