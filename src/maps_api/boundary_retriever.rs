use std::io::Read;

use flate2::read::GzDecoder;
use reqwest;

use crate::error::{OutreachError, Result};
use crate::map::boundary::BoundaryDataset;
use crate::map::geometry::WorldGeometry;
use crate::map::projection::MercatorProjection;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Loads the country boundary dataset once per session, from a URL or a
/// local file path.
#[derive(Debug, Clone)]
pub struct BoundaryRetriever {
    client: reqwest::Client,
    source: String,
    name_key: String,
}

impl BoundaryRetriever {
    pub fn new(source: String, name_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            source,
            name_key,
        }
    }

    /// Fetches, decodes and lays out the world. Any failure is reported as
    /// [`OutreachError::DataUnavailable`]; there is no retry.
    pub async fn fetch_world(&self, projection: MercatorProjection) -> Result<WorldGeometry> {
        let bytes = self.fetch_bytes().await?;
        let name_key = self.name_key.clone();

        // Decoding and tessellating a few hundred countries is too slow for
        // an async worker thread.
        tokio::task::spawn_blocking(move || {
            let dataset = decode(&bytes, &name_key)?;
            Ok(WorldGeometry::new(&dataset, projection))
        })
        .await
        .map_err(|e| OutreachError::DataUnavailable(e.to_string()))?
    }

    async fn fetch_bytes(&self) -> Result<Vec<u8>> {
        if self.source.starts_with("http://") || self.source.starts_with("https://") {
            log::info!("Fetching boundary data from {}", self.source);
            let response = self.client.get(&self.source).send().await?;

            if !response.status().is_success() {
                return Err(OutreachError::DataUnavailable(format!(
                    "boundary request failed: {}",
                    response.status()
                )));
            }
            Ok(response.bytes().await?.to_vec())
        } else {
            log::info!("Reading boundary data from {}", self.source);
            tokio::fs::read(&self.source)
                .await
                .map_err(|e| OutreachError::DataUnavailable(format!("{}: {}", self.source, e)))
        }
    }
}

/// Decodes GeoJSON, transparently inflating gzip input.
pub fn decode(bytes: &[u8], name_key: &str) -> Result<BoundaryDataset> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut inflated)
            .map_err(|e| OutreachError::DataUnavailable(format!("corrupt gzip boundary data: {}", e)))?;
        BoundaryDataset::from_geojson(inflated.as_slice(), name_key)
    } else {
        BoundaryDataset::from_geojson(bytes, name_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::boundary::tests::TWO_SQUARES;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn decodes_plain_and_gzipped_geojson() {
        assert_eq!(decode(TWO_SQUARES.as_bytes(), "name").unwrap().len(), 2);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(TWO_SQUARES.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();
        assert_eq!(decode(&gz, "name").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn loads_world_from_a_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.geojson");
        std::fs::write(&path, TWO_SQUARES).unwrap();

        let retriever = BoundaryRetriever::new(path.display().to_string(), "name".to_string());
        let world = retriever.fetch_world(MercatorProjection::default()).await.unwrap();
        assert_eq!(world.countries().len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_data_unavailable() {
        let retriever = BoundaryRetriever::new("/nonexistent/world.geojson".to_string(), "name".to_string());
        let result = retriever.fetch_world(MercatorProjection::default()).await;
        assert!(matches!(result, Err(OutreachError::DataUnavailable(_))));
    }
}
