//! Checks applied before talking to a platform or after it answers

use crate::model::PostDraft;
use crate::ports::ProviderError;

/// Split a granted-scope string as returned by a token endpoint
///
/// Platforms disagree on the delimiter: LinkedIn uses commas, most OAuth
/// servers use spaces.
pub fn parse_scopes(granted: &str) -> Vec<String> {
    granted
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Fail with `InsufficientScope` if any required scope was not granted
pub fn check_scopes<S: AsRef<str>>(required: &[&str], granted: &[S]) -> Result<(), ProviderError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|scope| !granted.iter().any(|g| g.as_ref() == **scope))
        .map(|scope| scope.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::warn!(missing = ?missing, "Granted scopes do not cover required scopes");
        Err(ProviderError::InsufficientScope { missing })
    }
}

/// Reject drafts that cannot be published
pub fn validate_draft(draft: &PostDraft) -> Result<(), ProviderError> {
    if draft.segments.is_empty() {
        return Err(ProviderError::InvalidInput(
            "Draft has no segments".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for segment in &draft.segments {
        if !seen.insert(segment.id.as_str()) {
            return Err(ProviderError::InvalidInput(format!(
                "Duplicate segment id '{}'",
                segment.id
            )));
        }
    }

    Ok(())
}
