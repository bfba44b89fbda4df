#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use bom_explosion::{
    build_router,
    config::AppConfig,
    errors::ServiceError,
    models::{BomComponent, BomLink, Part, PartType},
    repositories::{BomNodeResolver, InMemoryBomStore},
    AppState,
};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

/// FG1 needs 2x SF1; SF1 needs 3x RM1 ($5, 10% scrap).
pub fn cabinet_catalog() -> InMemoryBomStore {
    let store = InMemoryBomStore::new();
    store.insert_part(Part::new("FG1", "FG-1000", "Control cabinet", PartType::Finished));
    store.insert_part(Part::new("SF1", "SF-2100", "Door assembly", PartType::SemiFinished));
    store.insert_part(
        Part::new("RM1", "RM-3001", "Sheet steel", PartType::RawMaterial)
            .with_unit_cost(dec!(5))
            .with_unit_of_measure("KG"),
    );
    store.add_link(BomLink::new("FG1", "SF1", dec!(2)).with_operation("Final assembly"));
    store.add_link(
        BomLink::new("SF1", "RM1", dec!(3))
            .with_scrap_factor(dec!(0.1))
            .with_operation("Laser cutting"),
    );
    store
}

/// A -> B -> A
pub fn cyclic_catalog() -> InMemoryBomStore {
    let store = InMemoryBomStore::new();
    store.insert_part(Part::new("A", "A-1", "Assembly A", PartType::SemiFinished));
    store.insert_part(Part::new("B", "B-1", "Assembly B", PartType::SemiFinished));
    store.add_link(BomLink::new("A", "B", dec!(1)));
    store.add_link(BomLink::new("B", "A", dec!(1)));
    store
}

/// Catalog whose BOM lookups stall for longer than any test deadline
pub struct SlowCatalog(pub InMemoryBomStore);

#[async_trait]
impl BomNodeResolver for SlowCatalog {
    async fn part(&self, part_id: &str) -> Result<Part, ServiceError> {
        self.0.part(part_id).await
    }

    async fn children_of(&self, part_id: &str) -> Result<Vec<BomComponent>, ServiceError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        self.0.children_of(part_id).await
    }
}

/// Catalog that fails every lookup and health check
pub struct UnreachableCatalog;

#[async_trait]
impl BomNodeResolver for UnreachableCatalog {
    async fn part(&self, _part_id: &str) -> Result<Part, ServiceError> {
        Err(ServiceError::DataAccess("catalog offline".into()))
    }

    async fn children_of(&self, _part_id: &str) -> Result<Vec<BomComponent>, ServiceError> {
        Err(ServiceError::DataAccess("catalog offline".into()))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Err(ServiceError::DataAccess("catalog offline".into()))
    }
}

/// Router over a catalog, with default configuration unless given one.
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new(store: InMemoryBomStore) -> Self {
        Self::with_config(store, AppConfig::default())
    }

    pub fn with_config(store: InMemoryBomStore, config: AppConfig) -> Self {
        Self::with_catalog(Arc::new(store), config)
    }

    pub fn with_catalog(catalog: Arc<dyn BomNodeResolver>, config: AppConfig) -> Self {
        let state = AppState::new(config, catalog);
        Self {
            router: build_router(state),
        }
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

/// Reads a response body as JSON.
pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
