// BOM explosion pipeline: engine, aggregation, summary and the request-level service
pub mod bom_explosion;
pub mod bom_summary;
pub mod explosion_service;
pub mod material_requirements;

pub use bom_explosion::{ExplosionEngine, DEFAULT_MAX_NODES};
pub use bom_summary::summarize;
pub use explosion_service::{BomExplosionService, ExplosionRequest, ExplosionResult, ExplosionSettings};
pub use material_requirements::{aggregate, reconcile, CostReconciliation};
