use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{sort_by_name, CompanyStore};
use crate::error::{OutreachError, Result};
use crate::model::Company;

/// Volatile store, used when no data directory is wanted and in tests.
#[derive(Default)]
pub struct MemoryStore {
    companies: RwLock<HashMap<String, Company>>,
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Company>> {
        let mut companies: Vec<_> = self.companies.read().await.values().cloned().collect();
        for company in &mut companies {
            company.migrate_legacy();
        }
        sort_by_name(&mut companies);
        Ok(companies)
    }

    async fn get(&self, id: &str) -> Result<Company> {
        let mut company = self
            .companies
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| OutreachError::NotFound(id.to_string()))?;
        company.migrate_legacy();
        Ok(company)
    }

    async fn put(&self, company: &Company) -> Result<()> {
        self.companies.write().await.insert(company.id.clone(), company.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.companies
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| OutreachError::NotFound(id.to_string()))
    }
}
