use async_recursion::async_recursion;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    errors::ServiceError,
    models::{BomComponent, ExpandedNode, Part},
    repositories::{BomNodeResolver, ScopedResolver},
};

/// Default per-call node budget
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// How far below the root an explosion descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLimit {
    /// Stop after this many levels; deeper assemblies become leaves.
    Levels(u32),
    /// Descend until every branch ends in a raw material or an empty BOM.
    Unbounded,
}

impl DepthLimit {
    fn exhausted(&self) -> bool {
        matches!(self, DepthLimit::Levels(0))
    }

    fn descend(&self) -> DepthLimit {
        match self {
            DepthLimit::Levels(n) => DepthLimit::Levels(n.saturating_sub(1)),
            DepthLimit::Unbounded => DepthLimit::Unbounded,
        }
    }
}

/// Rejects zero and negative production quantities
pub fn validate_quantity(quantity: Decimal) -> Result<Decimal, ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidQuantity(format!(
            "quantity must be greater than zero, got {}",
            quantity
        )));
    }
    Ok(quantity)
}

/// Accepts caller-supplied depths in `1..=u32::MAX`
pub fn validate_depth(max_depth: i64) -> Result<u32, ServiceError> {
    if max_depth <= 0 {
        return Err(ServiceError::InvalidDepth(format!(
            "maxDepth must be a positive integer, got {}",
            max_depth
        )));
    }
    u32::try_from(max_depth)
        .map_err(|_| ServiceError::InvalidDepth(format!("maxDepth {} is too large", max_depth)))
}

/// `parent_quantity × quantity_per_parent_unit × (1 + scrap_factor)`
pub fn child_quantity(
    parent_quantity: Decimal,
    quantity_per_parent_unit: Decimal,
    scrap_factor: Decimal,
) -> Result<Decimal, ServiceError> {
    Decimal::ONE
        .checked_add(scrap_factor)
        .and_then(|scrap| parent_quantity.checked_mul(quantity_per_parent_unit)?.checked_mul(scrap))
        .ok_or_else(|| {
            ServiceError::ArithmeticOverflow(format!(
                "{} x {} x (1 + {})",
                parent_quantity, quantity_per_parent_unit, scrap_factor
            ))
        })
}

fn component_cost(quantity: Decimal, unit_cost: Decimal) -> Result<Decimal, ServiceError> {
    quantity.checked_mul(unit_cost).ok_or_else(|| {
        ServiceError::ArithmeticOverflow(format!("{} x {}", quantity, unit_cost))
    })
}

fn validate_link(component: &BomComponent) -> Result<(), ServiceError> {
    let link = &component.link;
    if link.quantity_per_parent_unit <= Decimal::ZERO {
        return Err(ServiceError::InvalidBomLink(format!(
            "{} -> {} has non-positive quantity {}",
            link.parent_part_id, link.child_part_id, link.quantity_per_parent_unit
        )));
    }
    if link.scrap_factor < Decimal::ZERO {
        return Err(ServiceError::InvalidBomLink(format!(
            "{} -> {} has negative scrap factor {}",
            link.parent_part_id, link.child_part_id, link.scrap_factor
        )));
    }
    Ok(())
}

/// Per-position attributes that come from the incoming edge rather than the part.
struct Placement {
    unit_cost: Decimal,
    unit_of_measure: String,
    scrap_factor: Decimal,
    operation: Option<String>,
    notes: Option<String>,
}

impl Placement {
    fn root(part: &Part) -> Self {
        Self {
            unit_cost: part.unit_cost.unwrap_or(Decimal::ZERO),
            unit_of_measure: part.unit_of_measure.clone(),
            scrap_factor: Decimal::ZERO,
            operation: None,
            notes: None,
        }
    }

    fn from_component(component: &BomComponent) -> Self {
        Self {
            unit_cost: component.effective_unit_cost(),
            unit_of_measure: component.unit_of_measure().to_string(),
            scrap_factor: component.link.scrap_factor,
            operation: component.link.operation.clone(),
            notes: component.link.notes.clone(),
        }
    }
}

/// State of a single explosion: the request-scoped cache, the active
/// recursion path and the node budget.
struct Walk {
    resolver: ScopedResolver,
    path: Vec<String>,
    on_path: HashSet<String>,
    nodes: usize,
    max_nodes: usize,
}

impl Walk {
    fn new(resolver: Arc<dyn BomNodeResolver>, max_nodes: usize) -> Self {
        Self {
            resolver: ScopedResolver::new(resolver),
            path: Vec::new(),
            on_path: HashSet::new(),
            nodes: 0,
            max_nodes,
        }
    }

    #[async_recursion]
    async fn expand(
        &mut self,
        part: Part,
        quantity: Decimal,
        placement: Placement,
        depth: DepthLimit,
    ) -> Result<ExpandedNode, ServiceError> {
        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return Err(ServiceError::ExplosionLimitExceeded {
                limit: self.max_nodes,
            });
        }

        let cost = component_cost(quantity, placement.unit_cost)?;
        trace!(part_id = %part.id, %quantity, %cost, "expanding node");

        let children = if part.part_type.is_raw_material() || depth.exhausted() {
            Vec::new()
        } else {
            self.expand_children(&part, quantity, depth.descend())
                .await?
        };

        Ok(ExpandedNode {
            part,
            quantity,
            unit_of_measure: placement.unit_of_measure,
            scrap_factor: placement.scrap_factor,
            unit_cost: placement.unit_cost,
            component_cost: cost,
            operation: placement.operation,
            notes: placement.notes,
            children,
        })
    }

    async fn expand_children(
        &mut self,
        parent: &Part,
        parent_quantity: Decimal,
        depth: DepthLimit,
    ) -> Result<Vec<ExpandedNode>, ServiceError> {
        let components = self.resolver.children_of(&parent.id).await?;
        if components.is_empty() {
            return Ok(Vec::new());
        }

        self.path.push(parent.id.clone());
        self.on_path.insert(parent.id.clone());

        let mut children = Vec::with_capacity(components.len());
        for component in components {
            validate_link(&component)?;

            if self.on_path.contains(&component.part.id) {
                let mut path = self.path.clone();
                path.push(component.part.id.clone());
                warn!(part_id = %component.part.id, path = %path.join(" -> "), "cyclic BOM");
                return Err(ServiceError::CyclicBom {
                    part_id: component.part.id,
                    path,
                });
            }

            let quantity = child_quantity(
                parent_quantity,
                component.link.quantity_per_parent_unit,
                component.link.scrap_factor,
            )?;
            let placement = Placement::from_component(&component);
            children.push(
                self.expand(component.part, quantity, placement, depth)
                    .await?,
            );
        }

        self.path.pop();
        self.on_path.remove(&parent.id);
        Ok(children)
    }
}

/// Recursively expands a part into its component tree.
///
/// The engine holds no state between calls; every explosion gets a fresh
/// request-scoped cache over the shared resolver, so concurrent explosions
/// never observe each other.
#[derive(Clone)]
pub struct ExplosionEngine {
    resolver: Arc<dyn BomNodeResolver>,
    max_nodes: usize,
}

impl ExplosionEngine {
    pub fn new(resolver: Arc<dyn BomNodeResolver>) -> Self {
        Self {
            resolver,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    /// Caps the number of nodes a single explosion may produce
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes.max(1);
        self
    }

    pub fn resolver(&self) -> &Arc<dyn BomNodeResolver> {
        &self.resolver
    }

    /// Explodes `root_part_id` for `quantity` units, at most `max_depth` levels deep.
    #[instrument(skip(self))]
    pub async fn explode(
        &self,
        root_part_id: &str,
        quantity: Decimal,
        max_depth: u32,
    ) -> Result<ExpandedNode, ServiceError> {
        if max_depth == 0 {
            return Err(ServiceError::InvalidDepth(
                "maxDepth must be a positive integer, got 0".to_string(),
            ));
        }
        self.run(root_part_id, quantity, DepthLimit::Levels(max_depth))
            .await
    }

    /// Explodes down to every raw material, bounded only by cycle detection
    /// and the node budget.
    #[instrument(skip(self))]
    pub async fn explode_full(
        &self,
        root_part_id: &str,
        quantity: Decimal,
    ) -> Result<ExpandedNode, ServiceError> {
        self.run(root_part_id, quantity, DepthLimit::Unbounded).await
    }

    async fn run(
        &self,
        root_part_id: &str,
        quantity: Decimal,
        depth: DepthLimit,
    ) -> Result<ExpandedNode, ServiceError> {
        let quantity = validate_quantity(quantity)?;

        let mut walk = Walk::new(self.resolver.clone(), self.max_nodes);
        let root = walk.resolver.part(root_part_id).await?;
        let placement = Placement::root(&root);
        let tree = walk.expand(root, quantity, placement, depth).await?;

        debug!(
            fetches = walk.resolver.fetches(),
            nodes = walk.nodes,
            "explosion walk finished"
        );
        info!(
            "BOM exploded: part={}, quantity={}, depth={:?}, components={}",
            root_part_id,
            quantity,
            depth,
            tree.descendant_count()
        );
        Ok(tree)
    }
}
