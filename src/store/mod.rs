//! Persistence and blob storage collaborators. Both are traits so the UI can
//! run against files on disk or, in tests, entirely in memory.

pub mod blob;
pub mod json_file;
pub mod memory;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::Result;
use crate::model::Company;

pub use blob::{BlobStore, LocalBlobStore};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// All companies, ordered by name. Legacy records come back migrated.
    async fn list(&self) -> Result<Vec<Company>>;

    async fn get(&self, id: &str) -> Result<Company>;

    /// Full replace of the stored document.
    async fn put(&self, company: &Company) -> Result<()>;

    /// Creates a company with a fresh id and the default profile contents.
    async fn create(&self, name: &str) -> Result<Company> {
        let company = Company::new_default(name);
        self.put(&company).await?;
        log::info!("created company {} ({})", company.name, company.id);
        Ok(company)
    }

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Populates an empty store with default profiles for `names`. Returns how
/// many were created; a store that already holds records is left alone.
pub async fn seed_defaults(store: &dyn CompanyStore, names: &[&str]) -> Result<usize> {
    if !store.list().await?.is_empty() {
        return Ok(0);
    }
    let created = try_join_all(names.iter().map(|name| store.create(name))).await?;
    log::info!("seeded {} companies", created.len());
    Ok(created.len())
}

fn sort_by_name(companies: &mut [Company]) {
    companies.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_only_touches_an_empty_store() {
        let store = MemoryStore::default();
        assert_eq!(seed_defaults(&store, &["Glencore", "Eskom"]).await.unwrap(), 2);
        assert_eq!(seed_defaults(&store, &["Transnet"]).await.unwrap(), 0);

        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Eskom", "Glencore"]);
    }
}
