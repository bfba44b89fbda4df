use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::part::Part;

/// One position in an exploded BOM tree.
///
/// The same part may appear at several positions; each position owns its own
/// node and the children beneath it. Nodes are built once by the explosion
/// engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedNode {
    pub part: Part,
    /// Effective units required at this position, scrap included.
    pub quantity: Decimal,
    pub unit_of_measure: String,
    pub scrap_factor: Decimal,
    pub unit_cost: Decimal,
    pub component_cost: Decimal,
    pub operation: Option<String>,
    pub notes: Option<String>,
    pub children: Vec<ExpandedNode>,
}

impl ExpandedNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn label(&self) -> String {
        self.part.label()
    }

    /// Number of nodes strictly below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Depth of the deepest descendant, with this node at level 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.depth())
            .max()
            .unwrap_or(0)
    }

    /// Copy of this tree with everything below `max_depth` cut away.
    ///
    /// Nodes at the cut keep their own quantity and cost but lose their
    /// children, matching a depth-limited explosion of the same BOM.
    pub fn truncated(&self, max_depth: usize) -> ExpandedNode {
        let children = if max_depth == 0 {
            Vec::new()
        } else {
            self.children
                .iter()
                .map(|child| child.truncated(max_depth - 1))
                .collect()
        };

        ExpandedNode {
            children,
            ..self.clone_without_children()
        }
    }

    fn clone_without_children(&self) -> ExpandedNode {
        ExpandedNode {
            part: self.part.clone(),
            quantity: self.quantity,
            unit_of_measure: self.unit_of_measure.clone(),
            scrap_factor: self.scrap_factor,
            unit_cost: self.unit_cost,
            component_cost: self.component_cost,
            operation: self.operation.clone(),
            notes: self.notes.clone(),
            children: Vec::new(),
        }
    }
}
