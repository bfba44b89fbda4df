use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unit of measure used when neither the part nor the BOM link names one.
pub const DEFAULT_UNIT_OF_MEASURE: &str = "EA";

/// Classification of a part within the product structure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PartType {
    Finished,
    SemiFinished,
    RawMaterial,
}

impl PartType {
    /// Raw materials are always leaves of an explosion.
    pub fn is_raw_material(&self) -> bool {
        matches!(self, PartType::RawMaterial)
    }
}

/// Snapshot of a Part Catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub part_type: PartType,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    #[serde(default = "default_unit_of_measure")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub material_spec: Option<String>,
}

fn default_unit_of_measure() -> String {
    DEFAULT_UNIT_OF_MEASURE.to_string()
}

impl Part {
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
        part_type: PartType,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            name: name.into(),
            part_type,
            unit_cost: None,
            unit_of_measure: default_unit_of_measure(),
            material_spec: None,
        }
    }

    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_unit_of_measure(mut self, unit_of_measure: impl Into<String>) -> Self {
        self.unit_of_measure = unit_of_measure.into();
        self
    }

    pub fn with_material_spec(mut self, material_spec: impl Into<String>) -> Self {
        self.material_spec = Some(material_spec.into());
        self
    }

    /// Human readable label used for provenance ("which parent consumed this").
    pub fn label(&self) -> String {
        format!("{} - {}", self.number, self.name)
    }
}

/// Condensed part view returned at the top of an explosion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartSummary {
    pub id: String,
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub part_type: PartType,
    pub unit_cost: Option<Decimal>,
    pub unit_of_measure: String,
}

impl From<&Part> for PartSummary {
    fn from(part: &Part) -> Self {
        Self {
            id: part.id.clone(),
            number: part.number.clone(),
            name: part.name.clone(),
            part_type: part.part_type,
            unit_cost: part.unit_cost,
            unit_of_measure: part.unit_of_measure.clone(),
        }
    }
}
