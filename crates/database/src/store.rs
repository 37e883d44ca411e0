use crate::repository::PriceRepository;
use crate::DbError;
use core_types::Dataset;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session-scoped cache in front of `PriceRepository`.
///
/// The dataset is loaded on first access and every later call returns the
/// same `Arc<Dataset>` without touching the database. The cache refreshes
/// only through an explicit `invalidate` call; there is no background or
/// time-based refresh. The `Dataset` behind the `Arc` is immutable, so it is
/// safe to share across concurrent requests.
#[derive(Debug, Clone)]
pub struct PriceStore {
    repository: PriceRepository,
    cached: Arc<RwLock<Option<Arc<Dataset>>>>,
}

impl PriceStore {
    pub fn new(repository: PriceRepository) -> Self {
        Self {
            repository,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the cached dataset, loading it from the database on the first
    /// call of the session.
    ///
    /// A load failure leaves the cache unpopulated and propagates `DbError`;
    /// callers halt the render cycle instead of filtering a dataset that
    /// stands for a failure.
    pub async fn get_or_load(&self) -> Result<Arc<Dataset>, DbError> {
        if let Some(dataset) = self.cached.read().await.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        let mut slot = self.cached.write().await;
        // Another request may have loaded while we waited for the write lock.
        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        let records = self.repository.fetch_all_prices().await?;
        let dataset = Arc::new(Dataset::new(records));
        if dataset.is_empty() {
            tracing::warn!("daily price table is empty");
        } else {
            tracing::info!(rows = dataset.len(), "price dataset cached for session");
        }
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Clears the cached dataset so the next access reloads from the database.
    pub async fn invalidate(&self) {
        let mut slot = self.cached.write().await;
        *slot = None;
        tracing::info!("price dataset cache invalidated");
    }
}
