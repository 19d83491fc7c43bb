use crate::clients::http::Fetch;
use crate::config::Config;
use crate::db::PosterRef;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Turns scraped poster URLs into catalog poster references, optionally
/// keeping a local copy named after the image's MD5 digest.
#[derive(Clone)]
pub struct PosterStore {
    fetcher: Arc<dyn Fetch>,
    images_dir: PathBuf,
    download: bool,
}

impl PosterStore {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetch>, images_dir: impl Into<PathBuf>, download: bool) -> Self {
        Self {
            fetcher,
            images_dir: images_dir.into(),
            download,
        }
    }

    #[must_use]
    pub fn from_config(fetcher: Arc<dyn Fetch>, config: &Config) -> Self {
        Self::new(
            fetcher,
            &config.general.images_path,
            config.ingest.download_posters,
        )
    }

    /// Poster reference for `url`. Falls back to the remote URL without a
    /// hash when downloading is disabled or fails.
    pub async fn resolve(&self, url: &str) -> PosterRef {
        if !self.download {
            return remote(url);
        }

        match self.persist(url).await {
            Ok(poster) => poster,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to store poster, keeping remote link");
                remote(url)
            }
        }
    }

    /// Downloads the image and stores it as `<md5>.<ext>`, reusing an
    /// existing file with the same digest.
    pub async fn persist(&self, url: &str) -> Result<PosterRef> {
        let bytes = self
            .fetcher
            .get_bytes(url)
            .await
            .with_context(|| format!("Failed to download poster {url}"))?;

        let hash = format!("{:x}", md5::compute(&bytes));
        let file_path = self
            .images_dir
            .join(format!("{hash}.{}", extension_of(url)));

        if file_path.exists() {
            debug!(path = %file_path.display(), "Reusing stored poster");
        } else {
            if !self.images_dir.exists() {
                fs::create_dir_all(&self.images_dir).await?;
            }

            fs::write(&file_path, &bytes)
                .await
                .with_context(|| format!("Failed to write poster to {}", file_path.display()))?;

            info!(url = %url, path = %file_path.display(), "Stored poster");
        }

        Ok(PosterRef {
            link: file_path.to_string_lossy().into_owned(),
            hash: Some(hash),
        })
    }
}

fn remote(url: &str) -> PosterRef {
    PosterRef {
        link: url.to_string(),
        hash: None,
    }
}

fn extension_of(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5)
        .unwrap_or("jpg")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::http::FetchError;
    use async_trait::async_trait;

    struct Image;

    #[async_trait]
    impl Fetch for Image {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }

        async fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(b"poster-bytes".to_vec())
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("https://a/b/c.PNG?w=1"), "png");
        assert_eq!(extension_of("https://a/b/c"), "jpg");
    }

    #[tokio::test]
    async fn test_disabled_keeps_remote_link() {
        let store = PosterStore::new(Arc::new(Image), "unused", false);
        let poster = store.resolve("https://x/p.jpg").await;
        assert_eq!(poster.link, "https://x/p.jpg");
        assert!(poster.hash.is_none());
    }

    #[tokio::test]
    async fn test_same_content_reuses_file() {
        let dir = std::env::temp_dir().join(format!("posters-{}", uuid::Uuid::new_v4()));
        let store = PosterStore::new(Arc::new(Image), &dir, true);

        let first = store.persist("https://x/a.jpg").await.unwrap();
        let second = store.persist("https://x/b.jpg").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.hash.as_deref(),
            Some(format!("{:x}", md5::compute(b"poster-bytes")).as_str())
        );
        assert!(Path::new(&first.link).exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
