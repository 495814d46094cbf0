//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ports::ProviderError;

/// Social networks an account can be connected to for publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// LinkedIn member profile
    Linkedin,
    /// LinkedIn organization page
    LinkedinPage,
    /// Offline provider for dry runs and tests
    Stub,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Linkedin, Self::LinkedinPage, Self::Stub];

    /// Stable identifier stored alongside credentials
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::LinkedinPage => "linkedin-page",
            Self::Stub => "stub",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == s)
            .ok_or_else(|| ProviderError::UnsupportedProvider(s.to_string()))
    }
}

/// Identity providers used for signing users in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginProviderKind {
    Github,
    Google,
    OpenId,
}

impl LoginProviderKind {
    pub const ALL: [LoginProviderKind; 3] = [Self::Github, Self::Google, Self::OpenId];

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
            Self::OpenId => "openid",
        }
    }
}

impl fmt::Display for LoginProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for LoginProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == lower)
            .ok_or_else(|| ProviderError::UnsupportedProvider(s.to_string()))
    }
}

/// Who owns uploaded media and authors posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadTarget {
    #[default]
    Personal,
    Organization,
}

impl fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => f.write_str("personal"),
            Self::Organization => f.write_str("organization"),
        }
    }
}

/// Consent URL plus the values the caller must persist and echo back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub url: String,
    /// CSRF state
    pub state: String,
    /// PKCE verifier (ignored by platforms that do not use PKCE)
    pub code_verifier: String,
}

/// Parameters for the authorization-code exchange
#[derive(Debug, Clone, Default)]
pub struct AuthenticateParams {
    pub code: String,
    pub code_verifier: String,
    /// Credential id being reconnected, echoed on the redirect URI
    pub refresh: Option<String>,
}

/// Tokens and profile returned by a successful exchange or refresh
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthTokenDetails {
    /// Platform account id
    pub id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: Option<i64>,
    pub name: String,
    pub picture: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl fmt::Debug for AuthTokenDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokenDetails")
            .field("id", &self.id)
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("name", &self.name)
            .field("picture", &self.picture)
            .field("username", &self.username)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// User returned by a login provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
}

/// A connected account on a social network, owned by a tenant organization
#[derive(Clone, Serialize, Deserialize)]
pub struct IntegrationCredential {
    pub id: Uuid,
    /// Tenant organization
    pub org_id: String,
    pub provider: ProviderKind,
    /// Account id on the platform
    pub internal_id: String,
    pub name: String,
    pub picture: Option<String>,
    pub username: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Set when the platform revoked access or the account changed
    #[serde(default)]
    pub refresh_needed: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl IntegrationCredential {
    /// Build a credential from a fresh token exchange
    pub fn from_token_details(
        org_id: &str,
        provider: ProviderKind,
        details: AuthTokenDetails,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id: org_id.to_string(),
            provider,
            internal_id: details.id,
            name: details.name,
            picture: details.picture,
            username: details.username,
            access_token: details.access_token,
            refresh_token: details.refresh_token,
            expires_at: expiry_from(now, details.expires_in),
            scopes: details.scopes,
            refresh_needed: false,
            disabled: false,
            updated_at: now,
        }
    }

    /// Apply the result of a token refresh
    pub fn apply_refresh(&mut self, details: AuthTokenDetails, now: OffsetDateTime) {
        self.access_token = details.access_token;
        if details.refresh_token.is_some() {
            self.refresh_token = details.refresh_token;
        }
        self.expires_at = expiry_from(now, details.expires_in);
        self.name = details.name;
        if details.picture.is_some() {
            self.picture = details.picture;
        }
        if details.username.is_some() {
            self.username = details.username;
        }
        if !details.scopes.is_empty() {
            self.scopes = details.scopes;
        }
        self.refresh_needed = false;
        self.updated_at = now;
    }

    /// Whether the access token has expired at `now`
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for IntegrationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationCredential")
            .field("id", &self.id)
            .field("org_id", &self.org_id)
            .field("provider", &self.provider)
            .field("internal_id", &self.internal_id)
            .field("name", &self.name)
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .field("refresh_needed", &self.refresh_needed)
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// Expiry instant; lifetimes past the representable range count as no expiry
fn expiry_from(now: OffsetDateTime, expires_in: Option<i64>) -> Option<OffsetDateTime> {
    expires_in.and_then(|secs| now.checked_add(time::Duration::seconds(secs)))
}

/// Media attached to a segment, resolved to bytes only at upload time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// URL or local path
    pub path: String,
    /// Detected MIME type
    pub mime_type: String,
}

impl MediaReference {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Last path component, used for diagnostics
    pub fn file_name(&self) -> &str {
        let trimmed = self.path.split(['?', '#']).next().unwrap_or(&self.path);
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}

/// One unit of a draft: the root post or a threaded reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSegment {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub media: Vec<MediaReference>,
}

/// Ordered segments; the first is the root, the rest become replies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostDraft {
    pub segments: Vec<PostSegment>,
}

impl PostDraft {
    pub fn new(segments: Vec<PostSegment>) -> Self {
        Self { segments }
    }

    /// Split into root and replies
    pub fn split_root(&self) -> Option<(&PostSegment, &[PostSegment])> {
        self.segments.split_first()
    }

    /// Iterate over every media item with its owning segment id
    pub fn media(&self) -> impl Iterator<Item = (&str, &MediaReference)> {
        self.segments
            .iter()
            .flat_map(|s| s.media.iter().map(move |m| (s.id.as_str(), m)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Posted,
    Failed,
}

/// Per-segment publish outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResult {
    /// Segment id from the draft
    pub id: String,
    pub status: PostStatus,
    /// Platform-assigned id
    pub post_id: Option<String>,
    /// Canonical URL of the published content
    pub release_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostResult {
    pub fn posted(segment_id: &str, post_id: String, release_url: String) -> Self {
        Self {
            id: segment_id.to_string(),
            status: PostStatus::Posted,
            post_id: Some(post_id),
            release_url: Some(release_url),
            error: None,
        }
    }

    pub fn failed(segment_id: &str, error: impl Into<String>) -> Self {
        Self {
            id: segment_id.to_string(),
            status: PostStatus::Failed,
            post_id: None,
            release_url: None,
            error: Some(error.into()),
        }
    }

    pub fn is_posted(&self) -> bool {
        self.status == PostStatus::Posted
    }
}

/// Organization resolved from a company page URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyMention {
    pub label: String,
    /// Mention tag usable in a message body
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(id: &str) -> AuthTokenDetails {
        AuthTokenDetails {
            id: id.to_string(),
            access_token: "secret-access".to_string(),
            refresh_token: Some("secret-refresh".to_string()),
            expires_in: Some(3600),
            name: "Jane".to_string(),
            picture: None,
            username: Some("jane".to_string()),
            scopes: vec!["openid".to_string()],
        }
    }

    #[test]
    fn test_provider_kind_round_trips_identifier() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.identifier().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let err = "myspace".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedProvider(p) if p == "myspace"));
    }

    #[test]
    fn test_login_provider_parse_is_case_insensitive() {
        assert_eq!(
            "GitHub".parse::<LoginProviderKind>().unwrap(),
            LoginProviderKind::Github
        );
        assert!("facebook".parse::<LoginProviderKind>().is_err());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let now = OffsetDateTime::now_utc();
        let credential =
            IntegrationCredential::from_token_details("org", ProviderKind::Linkedin, details("a"), now);

        let rendered = format!("{:?} {:?}", credential, details("a"));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_expiry_computed_from_clock() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let credential =
            IntegrationCredential::from_token_details("org", ProviderKind::Linkedin, details("a"), now);

        assert_eq!(credential.expires_at, Some(now + time::Duration::seconds(3600)));
        assert!(!credential.is_expired(now));
        assert!(credential.is_expired(now + time::Duration::seconds(3600)));
    }

    #[test]
    fn test_out_of_range_lifetime_has_no_expiry() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut huge = details("a");
        huge.expires_in = Some(i64::MAX);

        let mut credential =
            IntegrationCredential::from_token_details("org", ProviderKind::Linkedin, huge.clone(), now);
        assert_eq!(credential.expires_at, None);
        assert!(!credential.is_expired(now));

        credential.expires_at = Some(now);
        huge.expires_in = Some(i64::MIN);
        credential.apply_refresh(huge, now);
        assert_eq!(credential.expires_at, None);
    }

    #[test]
    fn test_apply_refresh_keeps_old_refresh_token_when_absent() {
        let now = OffsetDateTime::now_utc();
        let mut credential =
            IntegrationCredential::from_token_details("org", ProviderKind::Linkedin, details("a"), now);
        credential.refresh_needed = true;

        let mut refreshed = details("a");
        refreshed.access_token = "new-access".to_string();
        refreshed.refresh_token = None;
        credential.apply_refresh(refreshed, now);

        assert_eq!(credential.access_token, "new-access");
        assert_eq!(credential.refresh_token.as_deref(), Some("secret-refresh"));
        assert!(!credential.refresh_needed);
    }

    #[test]
    fn test_media_file_name() {
        let media = MediaReference {
            path: "https://cdn.example.com/uploads/a/clip.mp4?sig=1".to_string(),
            mime_type: "video/mp4".to_string(),
        };
        assert_eq!(media.file_name(), "clip.mp4");
        assert!(media.is_video());
    }

    #[test]
    fn test_draft_media_carries_segment_id() {
        let draft = PostDraft::new(vec![
            PostSegment {
                id: "s1".to_string(),
                message: "root".to_string(),
                media: vec![MediaReference {
                    path: "a.png".to_string(),
                    mime_type: "image/png".to_string(),
                }],
            },
            PostSegment {
                id: "s2".to_string(),
                message: "reply".to_string(),
                media: vec![],
            },
        ]);

        let media: Vec<_> = draft.media().map(|(id, m)| (id, m.path.as_str())).collect();
        assert_eq!(media, vec![("s1", "a.png")]);
        assert_eq!(draft.split_root().unwrap().1.len(), 1);
    }
}
