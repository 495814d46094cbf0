//! Offline provider for dry runs and tests

use async_trait::async_trait;
use social_relay_domain::policy::validate_draft;
use social_relay_domain::{
    AuthTokenDetails, AuthenticateParams, AuthorizationRequest, PostDraft, PostResult,
    ProviderError, SocialProvider,
};
use std::collections::HashSet;
use std::sync::Mutex;

use crate::http::make_id;

const SCOPES: &[&str] = &["publish"];

/// Stub provider that records drafts instead of publishing them
pub struct StubSocialProvider {
    fail_root: bool,
    fail_segments: HashSet<String>,
    published: Mutex<Vec<PostDraft>>,
}

impl StubSocialProvider {
    pub fn new() -> Self {
        Self {
            fail_root: false,
            fail_segments: HashSet::new(),
            published: Mutex::new(vec![]),
        }
    }

    /// Reject every root post with a publish error
    pub fn failing_root(mut self) -> Self {
        self.fail_root = true;
        self
    }

    /// Fail the reply with the given segment id
    pub fn failing_segment(mut self, segment_id: impl Into<String>) -> Self {
        self.fail_segments.insert(segment_id.into());
        self
    }

    /// Get all drafts that were published
    pub fn get_published(&self) -> Vec<PostDraft> {
        self.published.lock().unwrap().clone()
    }

    fn details(&self, access_token: String) -> AuthTokenDetails {
        AuthTokenDetails {
            id: "stub-account".to_string(),
            access_token,
            refresh_token: Some("stub-refresh".to_string()),
            expires_in: Some(3600),
            name: "Stub Account".to_string(),
            picture: None,
            username: Some("stub".to_string()),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for StubSocialProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocialProvider for StubSocialProvider {
    fn identifier(&self) -> &'static str {
        "stub"
    }

    fn name(&self) -> &'static str {
        "Stub"
    }

    fn scopes(&self) -> &[&'static str] {
        SCOPES
    }

    fn generate_auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = make_id(6);
        Ok(AuthorizationRequest {
            url: format!("https://stub.invalid/oauth/authorize?state={}", state),
            state,
            code_verifier: make_id(30),
        })
    }

    async fn authenticate(
        &self,
        params: &AuthenticateParams,
    ) -> Result<AuthTokenDetails, ProviderError> {
        if params.code.is_empty() {
            return Err(ProviderError::AuthExchange("empty authorization code".to_string()));
        }
        Ok(self.details(format!("stub-access-{}", params.code)))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokenDetails, ProviderError> {
        if refresh_token != "stub-refresh" {
            return Err(ProviderError::TokenRefresh("unknown refresh token".to_string()));
        }
        Ok(self.details(format!("stub-access-{}", make_id(8))))
    }

    async fn post(
        &self,
        account_id: &str,
        _access_token: &str,
        draft: &PostDraft,
    ) -> Result<Vec<PostResult>, ProviderError> {
        validate_draft(draft)?;
        if self.fail_root {
            return Err(ProviderError::Publish {
                status: Some(500),
                body: "stub root failure".to_string(),
            });
        }

        self.published.lock().unwrap().push(draft.clone());

        let results = draft
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                if index > 0 && self.fail_segments.contains(&segment.id) {
                    PostResult::failed(&segment.id, "stub reply failure")
                } else {
                    let post_id = format!("stub-{}", segment.id);
                    let url = format!("https://stub.invalid/{}/posts/{}", account_id, post_id);
                    PostResult::posted(&segment.id, post_id, url)
                }
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_relay_domain::{PostSegment, PostStatus};

    fn draft(ids: &[&str]) -> PostDraft {
        PostDraft::new(
            ids.iter()
                .map(|id| PostSegment {
                    id: id.to_string(),
                    message: format!("message {}", id),
                    media: vec![],
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_posts_every_segment() {
        let provider = StubSocialProvider::new();
        let results = provider.post("acct", "token", &draft(&["a", "b"])).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].post_id.as_deref(), Some("stub-a"));
        assert!(results.iter().all(|r| r.is_posted()));
        assert_eq!(provider.get_published().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_segment_is_partial() {
        let provider = StubSocialProvider::new().failing_segment("b");
        let results = provider
            .post("acct", "token", &draft(&["a", "b", "c"]))
            .await
            .unwrap();

        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![PostStatus::Posted, PostStatus::Failed, PostStatus::Posted]
        );
    }

    #[tokio::test]
    async fn test_failing_root() {
        let provider = StubSocialProvider::new().failing_root();
        let err = provider.post("acct", "token", &draft(&["a"])).await.unwrap_err();

        assert!(matches!(err, ProviderError::Publish { status: Some(500), .. }));
        assert!(provider.get_published().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_and_refresh() {
        let provider = StubSocialProvider::new();
        let details = provider
            .authenticate(&AuthenticateParams {
                code: "abc".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(details.access_token, "stub-access-abc");

        let refreshed = provider.refresh_token("stub-refresh").await.unwrap();
        assert_eq!(refreshed.id, details.id);
        assert!(provider.refresh_token("other").await.is_err());
    }
}
