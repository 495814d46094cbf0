//! Post command - publish a draft to a connected account

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use social_relay_adapters::media::media_reference;
use social_relay_domain::usecases::RefreshCredential;
use social_relay_domain::{Clock, PostDraft, PostSegment, SocialProvider, SystemClock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{build_factory, load_credential, open_store};
use crate::args::PostArgs;
use crate::config::AppConfig;

/// Draft file layout; media are plain paths or URLs
#[derive(Debug, Deserialize)]
struct DraftFile {
    segments: Vec<DraftSegment>,
}

#[derive(Debug, Deserialize)]
struct DraftSegment {
    id: String,
    message: String,
    #[serde(default)]
    media: Vec<String>,
}

impl From<DraftFile> for PostDraft {
    fn from(file: DraftFile) -> Self {
        PostDraft::new(
            file.segments
                .into_iter()
                .map(|s| PostSegment {
                    id: s.id,
                    message: s.message,
                    media: s.media.into_iter().map(media_reference).collect(),
                })
                .collect(),
        )
    }
}

fn read_draft(path: &Path) -> Result<PostDraft> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft: {}", path.display()))?;
    let file: DraftFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid draft file: {}", path.display()))?;
    Ok(file.into())
}

pub async fn execute(args: PostArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let draft = read_draft(&args.draft)?;

    let factory = build_factory(&config)?;
    let store = open_store(&config).await?;
    let mut credential = load_credential(&store, &args.account).await?;

    if credential.disabled {
        bail!("Account {} is disabled", credential.internal_id);
    }
    if credential.refresh_needed {
        bail!(
            "Account {} must be reconnected before publishing",
            credential.internal_id
        );
    }

    let provider: Arc<dyn SocialProvider> =
        Arc::from(factory.social_provider(credential.provider)?);

    let clock = Arc::new(SystemClock);
    if credential.is_expired(clock.now()) {
        tracing::info!(credential_id = %credential.id, "Access token expired, refreshing");
        credential = RefreshCredential::new(Arc::clone(&provider), store, clock)
            .execute(&credential)
            .await
            .context("Failed to refresh expired credential")?;
    }

    let results = provider
        .post(&credential.internal_id, &credential.access_token, &draft)
        .await
        .with_context(|| format!("Failed to publish to {}", credential.provider))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            match (&result.release_url, &result.error) {
                (Some(url), _) => println!("✓ {}: {}", result.id, url),
                (None, Some(error)) => println!("✗ {}: {}", result.id, error),
                (None, None) => println!("✗ {}", result.id),
            }
        }
    }

    let failed = results.iter().filter(|r| !r.is_posted()).count();
    if failed > 0 {
        bail!("{} of {} segments failed to publish", failed, results.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_draft_detects_media_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.json");
        fs::write(
            &path,
            r#"{"segments":[
                {"id":"s1","message":"root","media":["./hero.png","https://cdn.example.com/clip.mp4"]},
                {"id":"s2","message":"reply"}
            ]}"#,
        )
        .unwrap();

        let draft = read_draft(&path).unwrap();

        assert_eq!(draft.segments.len(), 2);
        assert_eq!(draft.segments[0].media[0].mime_type, "image/png");
        assert!(draft.segments[0].media[1].is_video());
        assert!(draft.segments[1].media.is_empty());
    }

    #[test]
    fn test_read_draft_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_draft(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid draft file"));
    }
}
