use std::collections::HashMap;
use std::sync::Arc;

use super::BomNodeResolver;
use crate::errors::ServiceError;
use crate::models::{BomComponent, Part};

/// Memoising view over a resolver for the lifetime of one explosion.
///
/// A part reused at several positions is fetched once. The cache is owned by
/// the explosion that created it and dropped with it; nothing is shared
/// between calls.
pub struct ScopedResolver {
    inner: Arc<dyn BomNodeResolver>,
    parts: HashMap<String, Part>,
    children: HashMap<String, Vec<BomComponent>>,
    fetches: usize,
}

impl ScopedResolver {
    pub fn new(inner: Arc<dyn BomNodeResolver>) -> Self {
        Self {
            inner,
            parts: HashMap::new(),
            children: HashMap::new(),
            fetches: 0,
        }
    }

    pub async fn part(&mut self, part_id: &str) -> Result<Part, ServiceError> {
        if let Some(part) = self.parts.get(part_id) {
            return Ok(part.clone());
        }
        self.fetches += 1;
        let part = self.inner.part(part_id).await?;
        self.parts.insert(part_id.to_string(), part.clone());
        Ok(part)
    }

    pub async fn children_of(&mut self, part_id: &str) -> Result<Vec<BomComponent>, ServiceError> {
        if let Some(children) = self.children.get(part_id) {
            return Ok(children.clone());
        }
        self.fetches += 1;
        let children = self.inner.children_of(part_id).await?;
        self.children.insert(part_id.to_string(), children.clone());
        Ok(children)
    }

    /// Number of calls that reached the underlying resolver.
    pub fn fetches(&self) -> usize {
        self.fetches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BomLink, PartType};
    use crate::repositories::InMemoryBomStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn repeated_lookups_hit_the_cache() {
        let store = InMemoryBomStore::new();
        store.insert_part(Part::new("sf", "SF", "Bracket", PartType::SemiFinished));
        store.insert_part(Part::new("rm", "RM", "Plate", PartType::RawMaterial));
        store.add_link(BomLink::new("sf", "rm", dec!(2)));

        let mut scoped = ScopedResolver::new(Arc::new(store.clone()));
        let first = scoped.children_of("sf").await.unwrap();
        let second = scoped.children_of("sf").await.unwrap();
        scoped.part("rm").await.unwrap();
        scoped.part("rm").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(scoped.fetches(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let store = InMemoryBomStore::new();
        let mut scoped = ScopedResolver::new(Arc::new(store.clone()));

        assert!(scoped.part("late").await.is_err());
        store.insert_part(Part::new("late", "L", "Late part", PartType::RawMaterial));
        assert!(scoped.part("late").await.is_ok());
        assert_eq!(scoped.fetches(), 2);
    }
}
