use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{sort_by_name, CompanyStore};
use crate::error::{OutreachError, Result};
use crate::model::Company;

/// One pretty-printed JSON document per company, `{dir}/{id}.json`.
/// Writes go to a temporary file first and are renamed into place, so a
/// failed save never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| persistence(&dir, e))?;
        log::info!("company store at {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        // Ids become file names.
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(OutreachError::NotFound(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read(path: &Path) -> Result<Company> {
        let bytes = tokio::fs::read(path).await.map_err(|e| persistence(path, e))?;
        let mut company: Company = serde_json::from_slice(&bytes)?;
        company.migrate_legacy();
        Ok(company)
    }
}

fn persistence(path: &Path, e: std::io::Error) -> OutreachError {
    OutreachError::Persistence(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl CompanyStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Company>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| persistence(&self.dir, e))?;

        let mut companies = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| persistence(&self.dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read(&path).await {
                Ok(company) => companies.push(company),
                // One bad document should not hide the rest of the dashboard.
                Err(e) => log::warn!("skipping unreadable record {}: {}", path.display(), e),
            }
        }

        sort_by_name(&mut companies);
        Ok(companies)
    }

    async fn get(&self, id: &str) -> Result<Company> {
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(OutreachError::NotFound(id.to_string()));
        }
        Self::read(&path).await
    }

    async fn put(&self, company: &Company) -> Result<()> {
        let path = self.path_for(&company.id)?;
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(company)?;

        tokio::fs::write(&tmp, json).await.map_err(|e| persistence(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(persistence(&path, e));
        }
        log::debug!("saved {}", path.display());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("deleted company {}", id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OutreachError::NotFound(id.to_string())),
            Err(e) => Err(persistence(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("companies")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn round_trips_a_company_through_disk() {
        let (_dir, store) = store().await;
        let mut company = store.create("Gold Fields").await.unwrap();
        company.add_location();
        company.set_metric(0, "ebitda", "42.5");
        store.put(&company).await.unwrap();

        let loaded = store.get(&company.id).await.unwrap();
        assert_eq!(loaded, company);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn legacy_documents_are_migrated_on_load() {
        let (dir, store) = store().await;
        let legacy = json!({
            "id": "legacy1",
            "name": "Exxaro Resources",
            "productionData": [{"year": "2021", "ebdat": "10"}],
            "axisLabelEbdat": "EBITDA ($M)"
        });
        std::fs::write(
            dir.path().join("companies").join("legacy1.json"),
            serde_json::to_vec(&legacy).unwrap(),
        )
        .unwrap();

        let company = store.get("legacy1").await.unwrap();
        assert_eq!(company.production_data[0].metric("ebitda"), Some(10.0));
        assert_eq!(company.charts.len(), 2);
        assert_eq!(company.charts[0].y_axis_label, "EBITDA (R Billion)");
    }

    #[tokio::test]
    async fn unreadable_documents_are_skipped_in_listings() {
        let (dir, store) = store().await;
        store.create("Eskom").await.unwrap();
        std::fs::write(dir.path().join("companies").join("broken.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("companies").join("notes.txt"), b"ignore me").unwrap();

        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Eskom"]);
    }

    #[tokio::test]
    async fn failed_write_keeps_the_previous_document() {
        let (dir, store) = store().await;
        let company = store.create("Transnet").await.unwrap();

        // A directory squatting on the temp path makes the write fail.
        let tmp = dir.path().join("companies").join(format!("{}.json.tmp", company.id));
        std::fs::create_dir(&tmp).unwrap();

        let mut renamed = company.clone();
        renamed.name = "Transnet SOC".to_string();
        assert!(matches!(store.put(&renamed).await, Err(OutreachError::Persistence(_))));
        assert_eq!(store.get(&company.id).await.unwrap().name, "Transnet");
    }

    #[tokio::test]
    async fn delete_and_missing_ids() {
        let (_dir, store) = store().await;
        let company = store.create("Telkom").await.unwrap();
        store.delete(&company.id).await.unwrap();

        assert!(matches!(store.get(&company.id).await, Err(OutreachError::NotFound(_))));
        assert!(matches!(store.delete(&company.id).await, Err(OutreachError::NotFound(_))));
        assert!(matches!(store.get("../etc/passwd").await, Err(OutreachError::NotFound(_))));
    }
}
