use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{TwibbonError, TwibbonResult};
use crate::ingest::pipeline::decode_image;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fetches encoded frame bytes for a campaign's `frame_url`.
pub trait FrameLoader {
    fn load(&self, url: &str) -> impl Future<Output = TwibbonResult<Vec<u8>>> + Send;
}

/// `http(s)://` via reqwest; `file://` and plain paths via the filesystem.
#[derive(Clone, Debug)]
pub struct DefaultFrameLoader {
    http: reqwest::Client,
    base_dir: Option<PathBuf>,
}

impl DefaultFrameLoader {
    pub fn new() -> TwibbonResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TwibbonError::network(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_dir: None,
        })
    }

    /// Resolve relative paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve_path(&self, url: &str) -> PathBuf {
        let raw = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.base_dir {
            Some(base) if raw.is_relative() => base.join(raw),
            _ => raw.to_path_buf(),
        }
    }

    async fn fetch_http(&self, url: &str) -> TwibbonResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TwibbonError::network(format!("GET {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TwibbonError::network(format!("GET {url}: status {status}")));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| TwibbonError::network(format!("read body of {url}: {e}")))?;
        Ok(body.to_vec())
    }
}

impl FrameLoader for DefaultFrameLoader {
    async fn load(&self, url: &str) -> TwibbonResult<Vec<u8>> {
        if is_http(url) {
            return self.fetch_http(url).await;
        }
        let path = self.resolve_path(url);
        tokio::fs::read(&path)
            .await
            .map_err(|e| TwibbonError::network(format!("read frame '{}': {e}", path.display())))
    }
}

fn is_http(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load and decode a frame. An empty body is a network failure, not a decode failure.
#[tracing::instrument(skip(loader))]
pub async fn load_frame<L: FrameLoader>(loader: &L, url: &str) -> TwibbonResult<PixelBuffer> {
    let bytes = loader.load(url).await?;
    if bytes.is_empty() {
        return Err(TwibbonError::network(format!("frame '{url}' is empty")));
    }
    let pixels = tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| TwibbonError::decode(format!("frame decode task failed: {e}")))??;
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(TwibbonError::decode("frame has zero size"));
    }
    tracing::debug!(
        width = pixels.width(),
        height = pixels.height(),
        "loaded frame"
    );
    Ok(pixels)
}

#[cfg(test)]
#[path = "../../tests/unit/campaign/frame.rs"]
mod tests;
