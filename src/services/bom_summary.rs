use rust_decimal::Decimal;

use crate::errors::ServiceError;
use crate::models::{BomSummary, ExpandedNode};

/// Headline statistics for a tree. The root is level 0 and is excluded from
/// both the component count and the material cost.
pub fn summarize(root: &ExpandedNode) -> Result<BomSummary, ServiceError> {
    fn fold(
        node: &ExpandedNode,
        level: usize,
        summary: &mut BomSummary,
    ) -> Result<(), ServiceError> {
        for child in &node.children {
            summary.total_components += 1;
            summary.total_material_cost =
                checked_sum(summary.total_material_cost, child.component_cost)?;
            summary.levels = summary.levels.max(level + 1);
            fold(child, level + 1, summary)?;
        }
        Ok(())
    }

    let mut summary = BomSummary {
        total_components: 0,
        total_material_cost: Decimal::ZERO,
        levels: 0,
    };
    fold(root, 0, &mut summary)?;
    Ok(summary)
}

/// `a + b`, reporting overflow instead of panicking
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, ServiceError> {
    a.checked_add(b)
        .ok_or_else(|| ServiceError::ArithmeticOverflow(format!("{} + {}", a, b)))
}
