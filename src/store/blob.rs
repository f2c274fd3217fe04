use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::{OutreachError, Result};

/// Longest edge of an uploaded image after compression.
pub const MAX_IMAGE_DIMENSION: u32 = 1600;
pub const JPEG_QUALITY: u8 = 50;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `path` and returns a URL the image cache can load.
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<String>;
}

/// Blob storage in a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(OutreachError::Blob(format!("invalid blob path {:?}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, bytes: Vec<u8>, path: &str) -> Result<String> {
        let target = self.resolve(path)?;
        let blob_err = |e: std::io::Error| OutreachError::Blob(format!("{}: {}", target.display(), e));

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(blob_err)?;
        }
        tokio::fs::write(&target, &bytes).await.map_err(blob_err)?;
        log::info!("stored {} bytes at {}", bytes.len(), target.display());

        match &self.base_url {
            Some(base) => Ok(format!("{}/{}", base, path)),
            None => {
                let absolute = tokio::fs::canonicalize(&target).await.map_err(blob_err)?;
                Ok(format!("file://{}", absolute.display()))
            }
        }
    }
}

/// Shrinks an image to fit within [`MAX_IMAGE_DIMENSION`] and re-encodes it
/// as JPEG.
pub fn compress_image(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    if width.max(height) > MAX_IMAGE_DIMENSION {
        img = img.resize(MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION, FilterType::Triangle);
    }

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    Ok(out.into_inner())
}

/// Compresses and stores an image. A compressed upload is stored under a
/// `.jpg` extension; if compression fails the original bytes are uploaded
/// unchanged at `path`.
pub async fn upload_image(store: &dyn BlobStore, bytes: Vec<u8>, path: &str) -> Result<String> {
    let (payload, path) = match tokio::task::spawn_blocking({
        let bytes = bytes.clone();
        move || compress_image(&bytes)
    })
    .await
    {
        Ok(Ok(compressed)) => {
            log::debug!("compressed {} -> {} bytes", bytes.len(), compressed.len());
            (compressed, jpeg_path(path))
        }
        Ok(Err(e)) => {
            log::warn!("image compression failed, uploading original: {}", e);
            (bytes, path.to_string())
        }
        Err(e) => {
            log::warn!("image compression task failed, uploading original: {}", e);
            (bytes, path.to_string())
        }
    };
    store.store(payload, &path).await
}

fn jpeg_path(path: &str) -> String {
    Path::new(path).with_extension("jpg").to_string_lossy().into_owned()
}

/// Extension of an uploaded file name, `png` when there is none.
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "png".to_string())
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

pub fn logo_path(company_id: &str, file_name: &str) -> String {
    format!("companies/{}/logo-{}.{}", company_id, timestamp_millis(), file_extension(file_name))
}

pub fn executive_image_path(company_id: &str, executive_id: &str, file_name: &str) -> String {
    format!(
        "companies/{}/executives/{}-{}.{}",
        company_id,
        executive_id,
        timestamp_millis(),
        file_extension(file_name)
    )
}
