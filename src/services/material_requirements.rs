use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::errors::ServiceError;
use crate::models::{ExpandedNode, MaterialRequirement, RequirementSource};
use crate::services::bom_summary::checked_sum;

/// Folds every raw-material position below `root` into one requirement per part.
///
/// The root itself is never counted, matching the summary rollup. Results are
/// ordered by descending total cost, then part number, then part id.
pub fn aggregate(root: &ExpandedNode) -> Result<Vec<MaterialRequirement>, ServiceError> {
    let mut by_part: HashMap<String, MaterialRequirement> = HashMap::new();
    collect(root, &mut by_part)?;

    let mut requirements: Vec<MaterialRequirement> = by_part.into_values().collect();
    requirements.sort_by(|a, b| {
        b.total_cost
            .cmp(&a.total_cost)
            .then_with(|| a.part.number.cmp(&b.part.number))
            .then_with(|| a.part_id.cmp(&b.part_id))
    });
    Ok(requirements)
}

fn collect(
    parent: &ExpandedNode,
    by_part: &mut HashMap<String, MaterialRequirement>,
) -> Result<(), ServiceError> {
    for node in &parent.children {
        if node.part.part_type.is_raw_material() {
            fold(parent, node, by_part)?;
        }
        collect(node, by_part)?;
    }
    Ok(())
}

fn fold(
    parent: &ExpandedNode,
    node: &ExpandedNode,
    by_part: &mut HashMap<String, MaterialRequirement>,
) -> Result<(), ServiceError> {
    let source = RequirementSource {
        from_component_id: parent.part.id.clone(),
        from_component_label: parent.label(),
        quantity: node.quantity,
        operation: node.operation.clone(),
    };

    match by_part.get_mut(&node.part.id) {
        Some(requirement) => {
            if requirement.unit_of_measure != node.unit_of_measure {
                warn!(
                    part_id = %node.part.id,
                    expected = %requirement.unit_of_measure,
                    found = %node.unit_of_measure,
                    "mixed units of measure for one material; quantities summed as-is"
                );
            }
            requirement.total_quantity_required =
                checked_sum(requirement.total_quantity_required, node.quantity)?;
            requirement.total_cost = checked_sum(requirement.total_cost, node.component_cost)?;
            requirement.sources.push(source);
        }
        None => {
            by_part.insert(
                node.part.id.clone(),
                MaterialRequirement {
                    part_id: node.part.id.clone(),
                    part: node.part.clone(),
                    unit_of_measure: node.unit_of_measure.clone(),
                    total_quantity_required: node.quantity,
                    total_cost: node.component_cost,
                    sources: vec![source],
                },
            );
        }
    }
    Ok(())
}

/// Cost split used to check aggregation against the bottom-up rollup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReconciliation {
    /// Sum of `total_cost` over the material requirements
    pub raw_material_cost: Decimal,
    /// Own cost of every finished/semi-finished position below the root
    pub assembly_cost: Decimal,
    /// Sum of `component_cost` over every position below the root
    pub rollup_cost: Decimal,
    pub balanced: bool,
}

/// Reconciles `requirements` (as produced by [`aggregate`] for the same tree)
/// with the rollup of `root`.
pub fn reconcile(
    root: &ExpandedNode,
    requirements: &[MaterialRequirement],
) -> Result<CostReconciliation, ServiceError> {
    fn walk(
        node: &ExpandedNode,
        assembly: &mut Decimal,
        rollup: &mut Decimal,
    ) -> Result<(), ServiceError> {
        for child in &node.children {
            *rollup = checked_sum(*rollup, child.component_cost)?;
            if !child.part.part_type.is_raw_material() {
                *assembly = checked_sum(*assembly, child.component_cost)?;
            }
            walk(child, assembly, rollup)?;
        }
        Ok(())
    }

    let mut assembly_cost = Decimal::ZERO;
    let mut rollup_cost = Decimal::ZERO;
    walk(root, &mut assembly_cost, &mut rollup_cost)?;

    let raw_material_cost = requirements
        .iter()
        .try_fold(Decimal::ZERO, |total, r| checked_sum(total, r.total_cost))?;

    Ok(CostReconciliation {
        raw_material_cost,
        assembly_cost,
        rollup_cost,
        balanced: checked_sum(raw_material_cost, assembly_cost)? == rollup_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Part, PartType};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn node(
        id: &str,
        number: &str,
        part_type: PartType,
        quantity: Decimal,
        unit_cost: Decimal,
        children: Vec<ExpandedNode>,
    ) -> ExpandedNode {
        ExpandedNode {
            part: Part::new(id, number, format!("Part {}", number), part_type),
            quantity,
            unit_of_measure: "EA".into(),
            scrap_factor: Decimal::ZERO,
            unit_cost,
            component_cost: quantity * unit_cost,
            operation: Some(format!("op-{}", id)),
            notes: None,
            children,
        }
    }

    fn raw(id: &str, number: &str, quantity: Decimal, unit_cost: Decimal) -> ExpandedNode {
        node(id, number, PartType::RawMaterial, quantity, unit_cost, vec![])
    }

    /// fg -> [sf-a -> [screw x4, plate x1], sf-b -> [screw x6], screw x2]
    fn shared_material_tree() -> ExpandedNode {
        node(
            "fg",
            "FG-1",
            PartType::Finished,
            dec!(1),
            Decimal::ZERO,
            vec![
                node(
                    "sf-a",
                    "SF-A",
                    PartType::SemiFinished,
                    dec!(1),
                    dec!(3),
                    vec![
                        raw("screw", "RM-SCREW", dec!(4), dec!(0.5)),
                        raw("plate", "RM-PLATE", dec!(1), dec!(10)),
                    ],
                ),
                node(
                    "sf-b",
                    "SF-B",
                    PartType::SemiFinished,
                    dec!(2),
                    Decimal::ZERO,
                    vec![raw("screw", "RM-SCREW", dec!(6), dec!(0.5))],
                ),
                raw("screw", "RM-SCREW", dec!(2), dec!(0.5)),
            ],
        )
    }

    #[test]
    fn merges_occurrences_of_the_same_material() {
        let requirements = aggregate(&shared_material_tree()).unwrap();
        assert_eq!(requirements.len(), 2);

        let screw = requirements.iter().find(|r| r.part_id == "screw").unwrap();
        assert_eq!(screw.total_quantity_required, dec!(12));
        assert_eq!(screw.total_cost, dec!(6));
        assert_eq!(screw.sources.len(), 3);

        let labels: Vec<_> = screw
            .sources
            .iter()
            .map(|s| s.from_component_label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["SF-A - Part SF-A", "SF-B - Part SF-B", "FG-1 - Part FG-1"]
        );
        assert_eq!(screw.sources[0].operation.as_deref(), Some("op-screw"));
    }

    #[test]
    fn orders_by_cost_then_part_number() {
        let requirements = aggregate(&shared_material_tree()).unwrap();
        let ids: Vec<_> = requirements.iter().map(|r| r.part_id.as_str()).collect();
        assert_eq!(ids, vec!["plate", "screw"]);

        let tie = node(
            "fg",
            "FG",
            PartType::Finished,
            dec!(1),
            Decimal::ZERO,
            vec![
                raw("b", "RM-B", dec!(1), dec!(5)),
                raw("a", "RM-A", dec!(1), dec!(5)),
            ],
        );
        let ids: Vec<_> = aggregate(&tie).unwrap().into_iter().map(|r| r.part_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn root_only_tree_has_no_requirements() {
        let tree = raw("rm", "RM", dec!(5), dec!(1));
        assert!(aggregate(&tree).unwrap().is_empty());
    }

    #[test]
    fn reconciliation_balances_against_rollup() {
        let tree = shared_material_tree();
        let requirements = aggregate(&tree).unwrap();
        let check = reconcile(&tree, &requirements).unwrap();

        assert_eq!(check.raw_material_cost, dec!(16));
        assert_eq!(check.assembly_cost, dec!(3));
        assert_eq!(check.rollup_cost, dec!(19));
        assert!(check.balanced);
    }

    #[test]
    fn shared_material_overflow_is_an_error() {
        let tree = node(
            "fg",
            "FG",
            PartType::Finished,
            dec!(1),
            Decimal::ZERO,
            vec![
                raw("rm", "RM", dec!(1), Decimal::MAX),
                raw("rm", "RM", dec!(1), Decimal::MAX),
            ],
        );
        assert_matches!(aggregate(&tree), Err(ServiceError::ArithmeticOverflow(_)));
        assert_matches!(reconcile(&tree, &[]), Err(ServiceError::ArithmeticOverflow(_)));
    }
}
