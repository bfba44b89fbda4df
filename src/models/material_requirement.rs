use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::part::Part;

/// One contributing path into a material requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSource {
    pub from_component_id: String,
    pub from_component_label: String,
    pub quantity: Decimal,
    pub operation: Option<String>,
}

/// Aggregated demand for a single raw material across the whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequirement {
    pub part_id: String,
    pub part: Part,
    pub unit_of_measure: String,
    pub total_quantity_required: Decimal,
    pub total_cost: Decimal,
    pub sources: Vec<RequirementSource>,
}

/// Headline statistics for an exploded tree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomSummary {
    pub total_components: usize,
    pub total_material_cost: Decimal,
    pub levels: usize,
}
