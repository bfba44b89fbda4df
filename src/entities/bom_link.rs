use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::BomLink;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bom_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub parent_part_id: String,
    pub child_part_id: String,
    /// Ordering of siblings within one parent
    pub sequence: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))")]
    pub quantity_per_parent_unit: Decimal,
    pub unit_of_measure: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))")]
    pub scrap_factor: Decimal,
    pub operation: Option<String>,
    pub notes: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_override: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::ParentPartId",
        to = "super::part::Column::Id"
    )]
    Parent,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BomLink {
    fn from(model: Model) -> Self {
        BomLink {
            parent_part_id: model.parent_part_id,
            child_part_id: model.child_part_id,
            quantity_per_parent_unit: model.quantity_per_parent_unit,
            unit_of_measure: model.unit_of_measure,
            scrap_factor: model.scrap_factor,
            operation: model.operation,
            notes: model.notes,
            cost_override: model.cost_override,
        }
    }
}
