//! Image resolution: loads the pictures image blocks point at.
//!
//! [`ImageResolver`] owns every fetching concern (HTTP, local files, data
//! URIs, caching) so the rasterizer stays synchronous and only ever sees an
//! [`ImageStore`] of decoded pixels.
//!
//! Fetch failures are not fatal. The block renders as a placeholder box and
//! the failure is logged.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::RgbaImage;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::LienzoError;
use crate::model::{Block, BlockKind};
use crate::template::{has_placeholders, FALLBACK_IMAGE_URL};

/// Decoded images keyed by the URL they were loaded from.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: HashMap<String, Arc<RgbaImage>>,
}

impl ImageStore {
    pub fn get(&self, url: &str) -> Option<&RgbaImage> {
        self.images.get(url).map(Arc::as_ref)
    }

    pub fn insert(&mut self, url: impl Into<String>, image: Arc<RgbaImage>) {
        self.images.insert(url.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Image URLs worth loading for `blocks`, deduplicated, in block order.
///
/// Empty URLs, unresolved placeholders and the fallback placeholder URL are
/// skipped.
pub fn image_urls<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for block in blocks {
        if let BlockKind::Image(image) = &block.kind {
            let url = image.url.trim();
            if url.is_empty()
                || url == FALLBACK_IMAGE_URL
                || has_placeholders(url)
                || urls.iter().any(|u| u == url)
            {
                continue;
            }
            urls.push(url.to_string());
        }
    }
    urls
}

/// Decoded images kept by a resolver unless told otherwise.
pub const DEFAULT_CACHE_ENTRIES: usize = 64;

/// Fetches and decodes images, keeping the most recently used ones.
#[derive(Clone)]
pub struct ImageResolver {
    http_client: reqwest::Client,
    cache: Arc<Mutex<LruCache<String, Arc<RgbaImage>>>>,
}

impl ImageResolver {
    pub fn new(timeout: Duration) -> Result<Self, LienzoError> {
        Self::with_capacity(timeout, DEFAULT_CACHE_ENTRIES)
    }

    /// Resolver whose cache holds at most `capacity` decoded images.
    pub fn with_capacity(timeout: Duration, capacity: usize) -> Result<Self, LienzoError> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| LienzoError::Config("Image cache capacity must be at least 1".into()))?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("lienzo/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| LienzoError::Image(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            http_client,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        })
    }

    /// Number of decoded images currently cached.
    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Load every image the blocks reference. Failures are logged and skipped.
    pub async fn resolve<'a>(&self, blocks: impl IntoIterator<Item = &'a Block>) -> ImageStore {
        let mut store = ImageStore::default();
        for url in image_urls(blocks) {
            match self.fetch(&url).await {
                Ok(image) => store.insert(url, image),
                Err(e) => warn!(url = %url, error = %e, "Image unavailable, drawing placeholder"),
            }
        }
        store
    }

    /// Fetch one image, using the cache when possible.
    pub async fn fetch(&self, url: &str) -> Result<Arc<RgbaImage>, LienzoError> {
        if let Some(image) = self.cache.lock().await.get(url) {
            return Ok(image.clone());
        }

        let bytes = self.load_bytes(url).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| LienzoError::Image(format!("Failed to decode {}: {}", short(url), e)))?
            .to_rgba8();
        let image = Arc::new(image);
        debug!(url = %short(url), width = image.width(), height = image.height(), "Loaded image");

        if let Some((evicted, _)) = self.cache.lock().await.push(url.to_string(), image.clone())
            && evicted != url
        {
            debug!(url = %short(&evicted), "Evicted cached image");
        }
        Ok(image)
    }

    async fn load_bytes(&self, url: &str) -> Result<Vec<u8>, LienzoError> {
        if let Some(data) = url.strip_prefix("data:") {
            return decode_data_uri(data);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .http_client
                .get(url)
                .send()
                .await
                .map_err(|e| LienzoError::Image(format!("Failed to download {}: {}", url, e)))?;
            if !response.status().is_success() {
                return Err(LienzoError::Image(format!(
                    "Failed to download {}: HTTP {}",
                    url,
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| LienzoError::Image(format!("Failed to read image data: {}", e)))?;
            return Ok(bytes.to_vec());
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| LienzoError::Image(format!("Failed to read {}: {}", path, e)))
    }
}

/// Decode the part of a data URI after `data:`. Only base64 payloads are
/// accepted.
fn decode_data_uri(data: &str) -> Result<Vec<u8>, LienzoError> {
    let (header, payload) = data
        .split_once(',')
        .ok_or_else(|| LienzoError::Image("Malformed data URI".into()))?;
    if !header.ends_with(";base64") {
        return Err(LienzoError::Image(
            "Only base64 data URIs are supported".into(),
        ));
    }
    BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|e| LienzoError::Image(format!("Invalid base64 image data: {}", e)))
}

/// Data URIs are long; keep log lines readable.
fn short(url: &str) -> &str {
    match url.char_indices().nth(64) {
        Some((i, _)) if url.starts_with("data:") => &url[..i],
        _ => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageBlock, TextBlock};
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn image_block(id: &str, url: &str) -> Block {
        Block::new(
            id,
            BlockKind::Image(ImageBlock {
                url: url.into(),
                ..Default::default()
            }),
        )
    }

    fn png_data_uri() -> String {
        let img = RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64_STANDARD.encode(bytes))
    }

    #[test]
    fn test_image_urls_skips_unloadable() {
        let blocks = vec![
            image_block("a", "https://x.com/a.png"),
            image_block("b", "https://x.com/a.png"),
            image_block("c", FALLBACK_IMAGE_URL),
            image_block("d", "{{photo}}"),
            image_block("e", ""),
            Block::new("t", BlockKind::Text(TextBlock::new("https://x.com/t.png"))),
        ];
        assert_eq!(image_urls(&blocks), vec!["https://x.com/a.png".to_string()]);
    }

    #[test]
    fn test_decode_data_uri_rejects_plain() {
        assert!(decode_data_uri("text/plain,hello").is_err());
        assert!(decode_data_uri("nocomma").is_err());
    }

    #[tokio::test]
    async fn test_fetch_data_uri() {
        let resolver = ImageResolver::new(Duration::from_secs(1)).unwrap();
        let image = resolver.fetch(&png_data_uri()).await.unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    fn tinted_data_uri(shade: u8) -> String {
        let img = RgbaImage::from_pixel(1, 1, Rgba([shade, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64_STANDARD.encode(bytes))
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let resolver = ImageResolver::with_capacity(Duration::from_secs(1), 4).unwrap();
        let uris: Vec<String> = (0..10).map(tinted_data_uri).collect();
        for uri in &uris {
            resolver.fetch(uri).await.unwrap();
        }
        assert_eq!(resolver.cache_len().await, 4);

        // Still served after eviction, just decoded again.
        let first = resolver.fetch(&uris[0]).await.unwrap();
        assert_eq!(first.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(resolver.cache_len().await, 4);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ImageResolver::with_capacity(Duration::from_secs(1), 0),
            Err(LienzoError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let resolver = ImageResolver::new(Duration::from_secs(1)).unwrap();
        let uri = png_data_uri();
        let blocks = vec![
            image_block("a", "file:///nonexistent/lienzo.png"),
            image_block("b", &uri),
        ];
        let store = resolver.resolve(&blocks).await;
        assert_eq!(store.len(), 1);
        assert!(store.get(&uri).is_some());
        assert!(store.get("file:///nonexistent/lienzo.png").is_none());
    }
}
