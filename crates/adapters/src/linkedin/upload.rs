//! Chunked media upload
//!
//! Images and videos go through the same three steps: initialize an upload
//! session on the owner, PUT the bytes in fixed-size chunks, and (videos only)
//! finalize with the ordered list of chunk etags.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use social_relay_domain::{MediaLoadError, MediaReference, PostDraft, ProviderError};
use std::collections::HashMap;

use super::LinkedInProvider;
use crate::http::{FetchError, fetch, fetch_json};

/// Size of each uploaded part
pub const CHUNK_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("{0}")]
    Load(#[from] MediaLoadError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("Upload session did not return an asset URN")]
    MissingAsset,
    #[error("Upload session did not return an upload URL")]
    MissingUploadUrl,
    #[error("Part {0} was accepted without an etag")]
    MissingEtag(usize),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeUploadBody {
    initialize_upload_request: InitializeUploadRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeUploadRequest {
    owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_captions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_thumbnail: Option<bool>,
}

#[derive(Deserialize)]
struct InitializeUploadResponse {
    value: UploadSession,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSession {
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    video: Option<String>,
    #[serde(default)]
    upload_instructions: Vec<UploadInstruction>,
    #[serde(default)]
    upload_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadInstruction {
    upload_url: String,
}

impl UploadSession {
    fn asset(&self) -> Option<&str> {
        self.video.as_deref().or(self.image.as_deref())
    }

    /// Target of part `index`; sessions with a single URL take every part there
    fn part_url(&self, index: usize) -> Option<&str> {
        self.upload_instructions
            .get(index)
            .or_else(|| self.upload_instructions.first())
            .map(|i| i.upload_url.as_str())
            .or(self.upload_url.as_deref())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeUploadBody<'a> {
    finalize_upload_request: FinalizeUploadRequest<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeUploadRequest<'a> {
    video: &'a str,
    upload_token: &'a str,
    uploaded_part_ids: &'a [String],
}

/// Asset created by an upload and the etags of its parts
#[derive(Debug)]
pub(super) struct UploadReceipt {
    pub asset: String,
    pub etags: Vec<String>,
}

impl LinkedInProvider {
    /// Upload every media item of the draft concurrently
    ///
    /// Returns asset URNs grouped by segment id, in draft order within each
    /// segment. The first failure aborts the whole draft. Comments only take
    /// images, so videos on replies are skipped without being uploaded.
    pub(super) async fn upload_all(
        &self,
        account_id: &str,
        access_token: &str,
        draft: &PostDraft,
    ) -> Result<HashMap<String, Vec<String>>, ProviderError> {
        let root_id = draft.segments.first().map(|s| s.id.as_str());
        let attachable = draft.media().filter(|(segment_id, media)| {
            if Some(*segment_id) == root_id || !media.is_video() {
                return true;
            }
            tracing::warn!(
                account_id = %account_id,
                segment_id = %segment_id,
                file_name = %media.file_name(),
                "Video on a reply is not supported, skipping"
            );
            false
        });

        let uploads = attachable.map(|(segment_id, media)| async move {
            let receipt = self.upload_media(account_id, access_token, media).await?;
            Ok::<_, ProviderError>((segment_id, receipt.asset))
        });

        let uploaded = try_join_all(uploads).await?;

        let mut by_segment: HashMap<String, Vec<String>> = HashMap::new();
        for (segment_id, asset) in uploaded {
            by_segment
                .entry(segment_id.to_string())
                .or_default()
                .push(asset);
        }
        Ok(by_segment)
    }

    /// Load and upload one media item
    pub(super) async fn upload_media(
        &self,
        account_id: &str,
        access_token: &str,
        media: &MediaReference,
    ) -> Result<UploadReceipt, ProviderError> {
        let result: Result<UploadReceipt, UploadError> = async {
            let bytes = self.media.load(media).await?;
            self.upload_bytes(account_id, access_token, media.is_video(), &bytes)
                .await
        }
        .await;

        result.map_err(|e| {
            tracing::warn!(
                provider = "linkedin",
                account_id = %account_id,
                file_name = %media.file_name(),
                error = %e,
                "Media upload failed"
            );
            ProviderError::MediaUpload {
                file_name: media.file_name().to_string(),
                account_id: account_id.to_string(),
                target: self.target,
                message: e.to_string(),
            }
        })
    }

    async fn upload_bytes(
        &self,
        account_id: &str,
        access_token: &str,
        is_video: bool,
        bytes: &[u8],
    ) -> Result<UploadReceipt, UploadError> {
        let session = self
            .initialize_upload(account_id, access_token, is_video, bytes.len())
            .await?;
        let asset = session.asset().ok_or(UploadError::MissingAsset)?.to_string();

        let mut etags = Vec::with_capacity(bytes.len().div_ceil(CHUNK_SIZE));
        for (index, chunk) in bytes.chunks(CHUNK_SIZE).enumerate() {
            let url = session.part_url(index).ok_or(UploadError::MissingUploadUrl)?;

            let mut request = self.rest(self.client.put(url), access_token);
            if is_video {
                request = request.header("Content-Type", "application/octet-stream");
            }

            let response = fetch(request.body(chunk.to_vec())).await?;
            let etag = response
                .headers()
                .get("etag")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            if is_video && etag.is_empty() {
                return Err(UploadError::MissingEtag(index));
            }
            etags.push(etag);
        }

        if is_video {
            self.finalize_upload(access_token, &asset, &session.upload_token, &etags)
                .await?;
        }

        tracing::debug!(
            account_id = %account_id,
            asset = %asset,
            parts = etags.len(),
            "Uploaded media"
        );

        Ok(UploadReceipt { asset, etags })
    }

    async fn initialize_upload(
        &self,
        account_id: &str,
        access_token: &str,
        is_video: bool,
        size: usize,
    ) -> Result<UploadSession, FetchError> {
        let kind = if is_video { "videos" } else { "images" };
        let body = InitializeUploadBody {
            initialize_upload_request: InitializeUploadRequest {
                owner: self.owner_urn(account_id),
                file_size_bytes: is_video.then_some(size),
                upload_captions: is_video.then_some(false),
                upload_thumbnail: is_video.then_some(false),
            },
        };

        let url = self.api_url(&format!("/rest/{}?action=initializeUpload", kind));
        let response: InitializeUploadResponse =
            fetch_json(self.rest(self.client.post(url), access_token).json(&body)).await?;
        Ok(response.value)
    }

    async fn finalize_upload(
        &self,
        access_token: &str,
        video: &str,
        upload_token: &str,
        etags: &[String],
    ) -> Result<(), FetchError> {
        let body = FinalizeUploadBody {
            finalize_upload_request: FinalizeUploadRequest {
                video,
                upload_token,
                uploaded_part_ids: etags,
            },
        };

        let url = self.api_url("/rest/videos?action=finalizeUpload");
        fetch(self.rest(self.client.post(url), access_token).json(&body)).await?;
        Ok(())
    }
}
