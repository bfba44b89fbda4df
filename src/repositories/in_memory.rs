// In-memory catalog used when no database is configured, and by tests

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::BomNodeResolver;
use crate::errors::ServiceError;
use crate::models::{BomComponent, BomLink, Part};

/// Serialized catalog: `{ "parts": [...], "links": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub links: Vec<BomLink>,
}

/// Part catalog and BOM links held in concurrent maps.
///
/// Links keep their insertion order per parent, which is the order
/// `children_of` reports them in.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBomStore {
    parts: Arc<DashMap<String, Part>>,
    links: Arc<DashMap<String, Vec<BomLink>>>,
}

impl InMemoryBomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let store = Self::new();
        for part in seed.parts {
            store.insert_part(part);
        }
        for link in seed.links {
            store.add_link(link);
        }
        store
    }

    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        let seed: CatalogSeed = serde_json::from_str(json)
            .map_err(|e| ServiceError::DataAccess(format!("invalid catalog seed: {}", e)))?;
        Ok(Self::from_seed(seed))
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::DataAccess(format!(
                "failed to read catalog seed {}: {}",
                path.display(),
                e
            ))
        })?;
        let store = Self::from_json(&raw)?;
        info!(
            "Loaded catalog seed from {}: {} parts, {} links",
            path.display(),
            store.part_count(),
            store.link_count()
        );
        Ok(store)
    }

    pub fn insert_part(&self, part: Part) {
        self.parts.insert(part.id.clone(), part);
    }

    pub fn add_link(&self, link: BomLink) {
        self.links
            .entry(link.parent_part_id.clone())
            .or_default()
            .push(link);
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.iter().map(|entry| entry.value().len()).sum()
    }

    fn lookup(&self, part_id: &str) -> Result<Part, ServiceError> {
        self.parts
            .get(part_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::part_not_found(part_id))
    }
}

#[async_trait]
impl BomNodeResolver for InMemoryBomStore {
    async fn part(&self, part_id: &str) -> Result<Part, ServiceError> {
        self.lookup(part_id)
    }

    async fn children_of(&self, part_id: &str) -> Result<Vec<BomComponent>, ServiceError> {
        self.lookup(part_id)?;

        let links = self
            .links
            .get(part_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        links
            .into_iter()
            .map(|link| {
                let part = self.lookup(&link.child_part_id)?;
                Ok(BomComponent { link, part })
            })
            .collect()
    }
}
