//! Curriculum store
//!
//! Holds the current dataset version. Requests take an `Arc` snapshot once,
//! at the start of normalization, so a concurrent catalogue update never
//! mixes old and new versions inside one recommendation.

use ihw_common::models::ContentItem;
use ihw_common::{Dataset, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CurriculumStore {
    current: Arc<RwLock<Arc<Dataset>>>,
}

impl CurriculumStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(dataset))),
        }
    }

    /// Consistent read-only view of the current version
    pub async fn snapshot(&self) -> Arc<Dataset> {
        self.current.read().await.clone()
    }

    /// Swap in a new catalogue; in-flight snapshots keep the old one
    pub async fn replace_catalogue(&self, catalogue: Vec<ContentItem>) -> Result<()> {
        let mut guard = self.current.write().await;
        let mut next = Dataset::clone(&guard);
        next.catalogue = catalogue;
        next.validate()?;

        info!(items = next.catalogue.len(), "Catalogue replaced");
        *guard = Arc::new(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_survives_catalogue_replacement() {
        let store = CurriculumStore::new(Dataset::demo());
        let before = store.snapshot().await;

        let mut smaller = before.catalogue.clone();
        smaller.truncate(2);
        store.replace_catalogue(smaller).await.unwrap();

        let after = store.snapshot().await;
        assert_eq!(before.catalogue.len(), 6);
        assert_eq!(after.catalogue.len(), 2);
        assert_eq!(after.learners, before.learners);
    }

    #[tokio::test]
    async fn test_invalid_catalogue_is_rejected() {
        let store = CurriculumStore::new(Dataset::demo());
        let mut bad = store.snapshot().await.catalogue.clone();
        bad[0].duration_minutes = 0;

        assert!(store.replace_catalogue(bad).await.is_err());
        assert_eq!(store.snapshot().await.catalogue.len(), 6);
    }
}
