// Domain types shared by the resolver, engine, aggregator and HTTP layer
pub mod bom_link;
pub mod expanded_node;
pub mod material_requirement;
pub mod part;

pub use bom_link::{BomComponent, BomLink};
pub use expanded_node::ExpandedNode;
pub use material_requirement::{BomSummary, MaterialRequirement, RequirementSource};
pub use part::{Part, PartSummary, PartType, DEFAULT_UNIT_OF_MEASURE};
