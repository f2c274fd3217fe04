use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::mpsc;

use crate::error::{OutreachError, Result};

const CACHE_SIZE: usize = 64;

/// Logos and executive portraits as GPU textures, keyed by URL. Images are
/// fetched on the runtime and uploaded on the UI thread as they arrive.
pub struct ImageCache {
    textures: LruCache<String, egui::TextureHandle>,
    pending: HashSet<String>,
    failed: HashSet<String>,
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
    sender: mpsc::UnboundedSender<(String, Result<egui::ColorImage>)>,
    receiver: mpsc::UnboundedReceiver<(String, Result<egui::ColorImage>)>,
}

impl ImageCache {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            textures: LruCache::new(NonZeroUsize::new(CACHE_SIZE).unwrap_or(NonZeroUsize::MIN)),
            pending: HashSet::new(),
            failed: HashSet::new(),
            client: reqwest::Client::new(),
            runtime,
            sender,
            receiver,
        }
    }

    /// The texture for `url`, or `None` while it loads (or if it cannot).
    pub fn get(&mut self, ctx: &egui::Context, url: &str) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.get(url) {
            return Some(texture.clone());
        }
        if !self.pending.contains(url) && !self.failed.contains(url) {
            self.pending.insert(url.to_string());

            let sender = self.sender.clone();
            let client = self.client.clone();
            let requester = ctx.clone();
            let url = url.to_string();
            self.runtime.spawn(async move {
                let result = fetch_image(&client, &url).await;
                if sender.send((url, result)).is_ok() {
                    requester.request_repaint();
                }
            });
        }
        None
    }

    /// Uploads whatever finished loading since the last frame.
    pub fn process(&mut self, ctx: &egui::Context) {
        while let Ok((url, result)) = self.receiver.try_recv() {
            self.pending.remove(&url);
            match result {
                Ok(image) => {
                    let texture = ctx.load_texture(format!("image:{}", url), image, egui::TextureOptions::LINEAR);
                    self.textures.put(url, texture);
                }
                Err(e) => {
                    log::warn!("could not load image {}: {}", url, e);
                    self.failed.insert(url);
                }
            }
        }
    }
}

async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<egui::ColorImage> {
    let bytes = if let Some(path) = url.strip_prefix("file://") {
        tokio::fs::read(path)
            .await
            .map_err(|e| OutreachError::Blob(format!("{}: {}", path, e)))?
    } else {
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(OutreachError::Blob(format!("{} returned {}", url, response.status())));
        }
        response.bytes().await?.to_vec()
    };

    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| OutreachError::Blob(e.to_string()))?
}

fn decode(bytes: &[u8]) -> Result<egui::ColorImage> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn decodes_into_a_color_image() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img).write_to(&mut png, ImageFormat::Png).unwrap();

        let color = decode(png.get_ref()).unwrap();
        assert_eq!(color.size, [3, 2]);
        assert_eq!(color.pixels[0], egui::Color32::RED);
    }

    #[tokio::test]
    async fn reads_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        DynamicImage::ImageRgba8(img).save(&path).unwrap();

        let client = reqwest::Client::new();
        let color = fetch_image(&client, &format!("file://{}", path.display())).await.unwrap();
        assert_eq!(color.size, [4, 4]);
        assert!(fetch_image(&client, "file:///definitely/missing.png").await.is_err());
    }
}
