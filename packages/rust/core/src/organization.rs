//! Best-effort organization name from an email domain.

/// Domain labels that end the organization part of a domain.
const GENERIC_LABELS: [&str; 4] = ["edu", "com", "net", "org"];

/// Personal mailbox providers that say nothing about an employer.
const PERSONAL_PROVIDERS: [&str; 2] = ["Gmail", "Outlook"];

/// Guess the member's organization from their email address.
///
/// The domain labels before the first generic label (`edu`, `com`, `net`,
/// `org`) are capitalized and joined with spaces: `ada@analytical.engines.org`
/// gives `Analytical Engines`. Returns `None` when nothing precedes the
/// generic label or the guess is a personal mailbox provider.
pub fn infer_organization(email: &str) -> Option<String> {
    let domain = email.rsplit('@').next().unwrap_or_default();

    let words: Vec<String> = domain
        .split('.')
        .take_while(|label| !GENERIC_LABELS.contains(label))
        .filter(|label| !label.trim().is_empty())
        .map(capitalize)
        .collect();

    let candidate = words.join(" ");
    let candidate = candidate.trim();

    if candidate.is_empty() || PERSONAL_PROVIDERS.contains(&candidate) {
        return None;
    }
    Some(candidate.to_string())
}

/// Upper-case the first character, leaving the rest untouched.
fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
