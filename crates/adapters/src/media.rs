//! Media loading for uploads

use async_trait::async_trait;
use reqwest::Client;
use social_relay_domain::{MediaLoadError, MediaLoader, MediaReference};
use std::collections::HashMap;

use crate::http::fetch;

/// Build a media reference, detecting the MIME type from the path
pub fn media_reference(path: impl Into<String>) -> MediaReference {
    let path = path.into();
    let without_query = path.split(['?', '#']).next().unwrap_or(&path);
    let mime_type = mime_guess::from_path(without_query)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    MediaReference { path, mime_type }
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Reads local paths from disk and downloads URLs
pub struct FsHttpMediaLoader {
    client: Client,
}

impl FsHttpMediaLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaLoader for FsHttpMediaLoader {
    async fn load(&self, media: &MediaReference) -> Result<Vec<u8>, MediaLoadError> {
        if is_remote(&media.path) {
            let response = fetch(self.client.get(&media.path))
                .await
                .map_err(|e| MediaLoadError::Fetch(e.to_string()))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| MediaLoadError::Fetch(e.to_string()))?;
            return Ok(bytes.to_vec());
        }

        Ok(tokio::fs::read(&media.path).await?)
    }
}

/// Serves media from memory (for testing/offline mode)
#[derive(Default)]
pub struct InMemoryMediaLoader {
    files: HashMap<String, Vec<u8>>,
}

impl InMemoryMediaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(path.into(), bytes);
        self
    }
}

#[async_trait]
impl MediaLoader for InMemoryMediaLoader {
    async fn load(&self, media: &MediaReference) -> Result<Vec<u8>, MediaLoadError> {
        self.files.get(&media.path).cloned().ok_or_else(|| {
            MediaLoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such media: {}", media.path),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_mime_detection() {
        assert_eq!(media_reference("photo.png").mime_type, "image/png");
        assert_eq!(media_reference("/tmp/clip.mp4").mime_type, "video/mp4");
        assert_eq!(
            media_reference("https://cdn.example.com/a.jpg?w=100").mime_type,
            "image/jpeg"
        );
        assert_eq!(
            media_reference("no-extension").mime_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_loads_local_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"png-bytes").unwrap();

        let loader = FsHttpMediaLoader::new(Client::new());
        let bytes = loader
            .load(&media_reference(file.display().to_string()))
            .await
            .unwrap();

        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn test_loads_remote_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/media/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote".to_vec()))
            .mount(&mock_server)
            .await;

        let loader = FsHttpMediaLoader::new(Client::new());
        let bytes = loader
            .load(&media_reference(format!("{}/media/a.png", mock_server.uri())))
            .await
            .unwrap();

        assert_eq!(bytes, b"remote");
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let loader = FsHttpMediaLoader::new(Client::new());
        let result = loader.load(&media_reference("/definitely/missing.png")).await;

        assert!(matches!(result, Err(MediaLoadError::Io(_))));
    }
}
