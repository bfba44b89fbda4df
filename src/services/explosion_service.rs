use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    config::AppConfig,
    errors::ServiceError,
    models::{BomComponent, BomLink, BomSummary, ExpandedNode, MaterialRequirement, Part, PartSummary},
    repositories::BomNodeResolver,
    services::{
        bom_explosion::{validate_depth, ExplosionEngine, DEFAULT_MAX_NODES},
        bom_summary::summarize,
        material_requirements::{aggregate, reconcile},
    },
};

/// Limits applied to every explosion request
#[derive(Debug, Clone)]
pub struct ExplosionSettings {
    pub default_max_depth: u32,
    pub max_depth_limit: u32,
    pub max_nodes: usize,
    pub timeout: Duration,
}

impl Default for ExplosionSettings {
    fn default() -> Self {
        Self {
            default_max_depth: 5,
            max_depth_limit: 50,
            max_nodes: DEFAULT_MAX_NODES,
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for ExplosionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_max_depth: config.default_max_depth,
            max_depth_limit: config.max_depth_limit,
            max_nodes: config.max_nodes,
            timeout: Duration::from_millis(config.explosion_timeout_ms),
        }
    }
}

/// Input to an explosion request
#[derive(Debug, Clone)]
pub struct ExplosionRequest {
    pub part_id: String,
    pub quantity: Decimal,
    pub max_depth: Option<i64>,
    pub include_requirements: bool,
}

/// Explosion response: the root part, its exploded components and rollups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplosionResult {
    pub parent_part: PartSummary,
    pub quantity: Decimal,
    pub max_depth: u32,
    pub bom_components: Vec<ExpandedNode>,
    pub summary: BomSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_requirements: Option<Vec<MaterialRequirement>>,
}

/// One direct component of a part, as shown when a UI row is expanded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLine {
    pub link: BomLink,
    pub part: Part,
    pub unit_of_measure: String,
    pub effective_unit_cost: Decimal,
}

impl From<BomComponent> for ComponentLine {
    fn from(component: BomComponent) -> Self {
        Self {
            unit_of_measure: component.unit_of_measure().to_string(),
            effective_unit_cost: component.effective_unit_cost(),
            link: component.link,
            part: component.part,
        }
    }
}

/// Request-level BOM explosion: validates input, explodes, summarises and
/// aggregates material demand under the configured limits.
#[derive(Clone)]
pub struct BomExplosionService {
    engine: ExplosionEngine,
    settings: ExplosionSettings,
}

impl BomExplosionService {
    pub fn new(resolver: Arc<dyn BomNodeResolver>, settings: ExplosionSettings) -> Self {
        let engine = ExplosionEngine::new(resolver).with_max_nodes(settings.max_nodes);
        Self { engine, settings }
    }

    pub fn settings(&self) -> &ExplosionSettings {
        &self.settings
    }

    /// Resolves the depth to display, applying the default and upper limit
    pub fn resolve_depth(&self, max_depth: Option<i64>) -> Result<u32, ServiceError> {
        let depth = validate_depth(max_depth.unwrap_or(i64::from(self.settings.default_max_depth)))?;
        if depth > self.settings.max_depth_limit {
            return Err(ServiceError::InvalidDepth(format!(
                "maxDepth {} exceeds the limit of {}",
                depth, self.settings.max_depth_limit
            )));
        }
        Ok(depth)
    }

    #[instrument(skip(self))]
    pub async fn explode(&self, request: ExplosionRequest) -> Result<ExplosionResult, ServiceError> {
        let max_depth = self.resolve_depth(request.max_depth)?;
        let timeout_ms = self.settings.timeout.as_millis() as u64;

        tokio::time::timeout(self.settings.timeout, self.run(request, max_depth))
            .await
            .map_err(|_| {
                warn!("BOM explosion timed out after {} ms", timeout_ms);
                ServiceError::Timeout(timeout_ms)
            })?
    }

    async fn run(
        &self,
        request: ExplosionRequest,
        max_depth: u32,
    ) -> Result<ExplosionResult, ServiceError> {
        // Material demand and cost are always rolled up over the full
        // structure; the caller's depth only shapes the returned tree.
        let (tree, summary, material_requirements) = if request.include_requirements {
            let full = self
                .engine
                .explode_full(&request.part_id, request.quantity)
                .await?;
            let requirements = aggregate(&full)?;

            let check = reconcile(&full, &requirements)?;
            if !check.balanced {
                warn!(?check, "material requirements do not reconcile with cost rollup");
            }

            let tree = full.truncated(max_depth as usize);
            let summary = BomSummary {
                total_material_cost: check.rollup_cost,
                ..summarize(&tree)?
            };
            (tree, summary, Some(requirements))
        } else {
            let tree = self
                .engine
                .explode(&request.part_id, request.quantity, max_depth)
                .await?;
            let summary = summarize(&tree)?;
            (tree, summary, None)
        };

        info!(
            "BOM explosion served: part={}, components={}, levels={}, material_cost={}",
            tree.part.id, summary.total_components, summary.levels, summary.total_material_cost
        );

        Ok(ExplosionResult {
            parent_part: PartSummary::from(&tree.part),
            quantity: tree.quantity,
            max_depth,
            bom_components: tree.children,
            summary,
            material_requirements,
        })
    }

    /// Direct components of a part, for lazy one-level expansion
    #[instrument(skip(self))]
    pub async fn components(&self, part_id: &str) -> Result<Vec<ComponentLine>, ServiceError> {
        let components = self.engine.resolver().children_of(part_id).await?;
        Ok(components.into_iter().map(ComponentLine::from).collect())
    }
}
