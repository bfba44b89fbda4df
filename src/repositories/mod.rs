use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ServiceError;
use crate::models::{BomComponent, Part};

pub mod database;
pub mod in_memory;
pub mod scoped;

pub use database::DatabaseBomResolver;
pub use in_memory::{CatalogSeed, InMemoryBomStore};
pub use scoped::ScopedResolver;

/// Read-only access to the Part Catalog and BOM Link Store.
///
/// Implementations are pure data-access adapters. `children_of` must return
/// components in a stable order for a given part so that repeated explosions
/// produce identical trees.
#[async_trait]
pub trait BomNodeResolver: Send + Sync {
    /// Loads a single part, failing with `PartNotFound` if it does not exist.
    async fn part(&self, part_id: &str) -> Result<Part, ServiceError>;

    /// Loads the direct components of `part_id`, each paired with its child part.
    async fn children_of(&self, part_id: &str) -> Result<Vec<BomComponent>, ServiceError>;

    /// Checks that the backing store is reachable
    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[async_trait]
impl<T> BomNodeResolver for Arc<T>
where
    T: BomNodeResolver + ?Sized,
{
    async fn part(&self, part_id: &str) -> Result<Part, ServiceError> {
        (**self).part(part_id).await
    }

    async fn children_of(&self, part_id: &str) -> Result<Vec<BomComponent>, ServiceError> {
        (**self).children_of(part_id).await
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        (**self).health_check().await
    }
}
