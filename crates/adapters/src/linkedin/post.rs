//! Root post and threaded comments

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use social_relay_domain::policy::validate_draft;
use social_relay_domain::{
    PostDraft, PostResult, PostSegment, PostStatus, ProviderError, SocialProvider,
};

use super::LinkedInProvider;
use crate::http::{FetchError, fetch, fetch_json, id_string};

const FEED_URL: &str = "https://www.linkedin.com/feed/update";
const EMBED_FEED_URL: &str = "https://www.linkedin.com/embed/feed/update";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest<'a> {
    author: &'a str,
    commentary: String,
    visibility: &'static str,
    distribution: Distribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<PostContent>,
    lifecycle_state: &'static str,
    is_reshare_disabled_by_author: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Distribution {
    feed_distribution: &'static str,
    target_entities: Vec<String>,
    third_party_distribution_channels: Vec<String>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            feed_distribution: "MAIN_FEED",
            target_entities: vec![],
            third_party_distribution_channels: vec![],
        }
    }
}

#[derive(Debug, Serialize)]
struct MediaId {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum PostContent {
    Media(MediaId),
    MultiImage { images: Vec<MediaId> },
}

impl PostContent {
    fn from_assets(assets: &[String]) -> Option<Self> {
        match assets {
            [] => None,
            [single] => Some(Self::Media(MediaId { id: single.clone() })),
            many => Some(Self::MultiImage {
                images: many.iter().map(|id| MediaId { id: id.clone() }).collect(),
            }),
        }
    }
}

#[derive(Serialize)]
struct CreateCommentRequest<'a> {
    actor: &'a str,
    object: &'a str,
    message: CommentMessage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    content: Vec<CommentContent>,
}

#[derive(Serialize)]
struct CommentMessage {
    text: String,
}

#[derive(Serialize)]
struct CommentContent {
    entity: CommentEntity,
}

#[derive(Serialize)]
struct CommentEntity {
    image: String,
}

/// Path segment for the root post in the comments endpoint
fn encoded_root(root_id: &str) -> String {
    let decoded = percent_decode_str(root_id).decode_utf8_lossy();
    utf8_percent_encode(&decoded, NON_ALPHANUMERIC).to_string()
}

/// Comment id from a create-comment response
fn comment_id(body: &serde_json::Value) -> Option<String> {
    ["$URN", "id", "object"]
        .iter()
        .find_map(|key| body.get(*key).and_then(id_string))
}

fn publish_error(e: FetchError) -> ProviderError {
    ProviderError::Publish {
        status: e.status(),
        body: e.body().to_string(),
    }
}

impl LinkedInProvider {
    /// Upload media, publish the root, then each reply as a comment on it
    pub(super) async fn publish_draft(
        &self,
        account_id: &str,
        access_token: &str,
        draft: &PostDraft,
    ) -> Result<Vec<PostResult>, ProviderError> {
        validate_draft(draft)?;
        let Some((root, replies)) = draft.split_root() else {
            return Ok(vec![]);
        };

        let assets = self.upload_all(account_id, access_token, draft).await?;
        let author = self.owner_urn(account_id);
        let no_assets = Vec::new();

        let root_id = self
            .create_post(
                &author,
                access_token,
                root,
                assets.get(&root.id).unwrap_or(&no_assets),
            )
            .await?;

        tracing::info!(
            provider = self.identifier(),
            account_id = %account_id,
            segment_id = %root.id,
            post_id = %root_id,
            "Published root post"
        );

        let mut results = Vec::with_capacity(draft.segments.len());
        results.push(PostResult::posted(
            &root.id,
            root_id.clone(),
            format!("{}/{}", FEED_URL, root_id),
        ));

        for reply in replies {
            let images = assets.get(&reply.id).unwrap_or(&no_assets);
            let result = match self
                .create_comment(&author, access_token, &root_id, reply, images)
                .await
            {
                Ok(comment_id) => {
                    tracing::info!(
                        account_id = %account_id,
                        segment_id = %reply.id,
                        comment_id = comment_id.as_deref().unwrap_or("unknown"),
                        "Published reply"
                    );
                    // Some responses omit the comment id; the reply is still live
                    PostResult {
                        id: reply.id.clone(),
                        status: PostStatus::Posted,
                        post_id: comment_id,
                        release_url: Some(format!("{}/{}", EMBED_FEED_URL, root_id)),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        account_id = %account_id,
                        segment_id = %reply.id,
                        error = %e,
                        "Reply failed"
                    );
                    PostResult::failed(&reply.id, e.to_string())
                }
            };
            results.push(result);
        }

        Ok(results)
    }

    async fn create_post(
        &self,
        author: &str,
        access_token: &str,
        segment: &PostSegment,
        assets: &[String],
    ) -> Result<String, ProviderError> {
        let body = CreatePostRequest {
            author,
            commentary: self.normalizer.normalize(&segment.message),
            visibility: "PUBLIC",
            distribution: Distribution::default(),
            content: PostContent::from_assets(assets),
            lifecycle_state: "PUBLISHED",
            is_reshare_disabled_by_author: false,
        };

        let response = fetch(
            self.rest(self.client.post(self.api_url("/v2/posts")), access_token)
                .json(&body),
        )
        .await
        .map_err(publish_error)?;

        let status = response.status().as_u16();
        response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Publish {
                status: Some(status),
                body: "Response carried no x-restli-id header".to_string(),
            })
    }

    async fn create_comment(
        &self,
        actor: &str,
        access_token: &str,
        root_id: &str,
        segment: &PostSegment,
        assets: &[String],
    ) -> Result<Option<String>, FetchError> {
        let body = CreateCommentRequest {
            actor,
            object: root_id,
            message: CommentMessage {
                text: self.normalizer.normalize(&segment.message),
            },
            content: assets
                .iter()
                .filter(|urn| urn.starts_with("urn:li:image:"))
                .map(|urn| CommentContent {
                    entity: CommentEntity { image: urn.clone() },
                })
                .collect(),
        };

        let url = self.api_url(&format!(
            "/v2/socialActions/{}/comments",
            encoded_root(root_id)
        ));
        let response: serde_json::Value =
            fetch_json(self.rest(self.client.post(url), access_token).json(&body)).await?;

        Ok(comment_id(&response))
    }
}
