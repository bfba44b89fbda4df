use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ServiceError;
use crate::models::{Part, PartType, DEFAULT_UNIT_OF_MEASURE};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub part_number: String,
    pub name: String,
    pub part_type: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Option<Decimal>,
    pub unit_of_measure: Option<String>,
    pub material_spec: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bom_link::Entity")]
    BomLinks,
}

impl Related<super::bom_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BomLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Part {
    type Error = ServiceError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let part_type = PartType::from_str(&model.part_type).map_err(|_| {
            ServiceError::DataAccess(format!(
                "part {} has unknown type '{}'",
                model.id, model.part_type
            ))
        })?;

        Ok(Part {
            id: model.id,
            number: model.part_number,
            name: model.name,
            part_type,
            unit_cost: model.unit_cost,
            unit_of_measure: model
                .unit_of_measure
                .filter(|uom| !uom.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UNIT_OF_MEASURE.to_string()),
            material_spec: model.material_spec,
        })
    }
}
