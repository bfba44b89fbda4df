use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::part::Part;

/// Directed parent -> child edge from the BOM Link Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomLink {
    pub parent_part_id: String,
    pub child_part_id: String,
    pub quantity_per_parent_unit: Decimal,
    /// Overrides the child's default display unit when present.
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub scrap_factor: Decimal,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost_override: Option<Decimal>,
}

impl BomLink {
    pub fn new(
        parent_part_id: impl Into<String>,
        child_part_id: impl Into<String>,
        quantity_per_parent_unit: Decimal,
    ) -> Self {
        Self {
            parent_part_id: parent_part_id.into(),
            child_part_id: child_part_id.into(),
            quantity_per_parent_unit,
            unit_of_measure: None,
            scrap_factor: Decimal::ZERO,
            operation: None,
            notes: None,
            cost_override: None,
        }
    }

    pub fn with_scrap_factor(mut self, scrap_factor: Decimal) -> Self {
        self.scrap_factor = scrap_factor;
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_cost_override(mut self, cost_override: Decimal) -> Self {
        self.cost_override = Some(cost_override);
        self
    }

    pub fn with_unit_of_measure(mut self, unit_of_measure: impl Into<String>) -> Self {
        self.unit_of_measure = Some(unit_of_measure.into());
        self
    }
}

/// A BOM link resolved together with the child part it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomComponent {
    pub link: BomLink,
    pub part: Part,
}

impl BomComponent {
    /// Cost override on the link, else the part's catalog cost, else zero.
    pub fn effective_unit_cost(&self) -> Decimal {
        self.link
            .cost_override
            .or(self.part.unit_cost)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn unit_of_measure(&self) -> &str {
        self.link
            .unit_of_measure
            .as_deref()
            .unwrap_or(&self.part.unit_of_measure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::part::PartType;
    use rust_decimal_macros::dec;

    fn bolt() -> Part {
        Part::new("rm-bolt", "RM-BOLT", "M6 bolt", PartType::RawMaterial)
    }

    #[test]
    fn cost_override_wins_over_catalog_cost() {
        let component = BomComponent {
            link: BomLink::new("fg", "rm-bolt", dec!(4)).with_cost_override(dec!(0.12)),
            part: bolt().with_unit_cost(dec!(0.10)),
        };
        assert_eq!(component.effective_unit_cost(), dec!(0.12));
    }

    #[test]
    fn missing_costs_resolve_to_zero() {
        let component = BomComponent {
            link: BomLink::new("fg", "rm-bolt", dec!(4)),
            part: bolt(),
        };
        assert_eq!(component.effective_unit_cost(), Decimal::ZERO);
    }

    #[test]
    fn link_unit_of_measure_overrides_part_default() {
        let mut component = BomComponent {
            link: BomLink::new("fg", "rm-bolt", dec!(4)),
            part: bolt(),
        };
        assert_eq!(component.unit_of_measure(), "EA");

        component.link = component.link.with_unit_of_measure("BOX");
        assert_eq!(component.unit_of_measure(), "BOX");
    }
}
