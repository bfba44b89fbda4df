use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument};

use super::BomNodeResolver;
use crate::{
    entities::{
        bom_link::{self, Entity as BomLinkEntity},
        part::{self, Entity as PartEntity},
    },
    errors::ServiceError,
    models::{BomComponent, BomLink, Part},
};

/// Resolver backed by the `parts` and `bom_links` tables
#[derive(Debug, Clone)]
pub struct DatabaseBomResolver {
    db: Arc<DatabaseConnection>,
}

impl DatabaseBomResolver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_part(&self, part_id: &str) -> Result<Part, ServiceError> {
        let model = PartEntity::find_by_id(part_id.to_string())
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to load part {}: {}", part_id, e);
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::part_not_found(part_id))?;

        Part::try_from(model)
    }
}

#[async_trait]
impl BomNodeResolver for DatabaseBomResolver {
    #[instrument(skip(self))]
    async fn part(&self, part_id: &str) -> Result<Part, ServiceError> {
        self.find_part(part_id).await
    }

    #[instrument(skip(self))]
    async fn children_of(&self, part_id: &str) -> Result<Vec<BomComponent>, ServiceError> {
        self.find_part(part_id).await?;

        let links = BomLinkEntity::find()
            .filter(bom_link::Column::ParentPartId.eq(part_id))
            .order_by_asc(bom_link::Column::Sequence)
            .order_by_asc(bom_link::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to load BOM links for {}: {}", part_id, e);
                ServiceError::DatabaseError(e)
            })?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let mut child_ids: Vec<String> = links.iter().map(|l| l.child_part_id.clone()).collect();
        child_ids.sort();
        child_ids.dedup();

        let mut parts: HashMap<String, Part> = HashMap::with_capacity(child_ids.len());
        for model in PartEntity::find()
            .filter(part::Column::Id.is_in(child_ids))
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to load components of {}: {}", part_id, e);
                ServiceError::DatabaseError(e)
            })?
        {
            let part = Part::try_from(model)?;
            parts.insert(part.id.clone(), part);
        }

        links
            .into_iter()
            .map(|model| {
                let link = BomLink::from(model);
                let part = parts
                    .get(&link.child_part_id)
                    .cloned()
                    .ok_or_else(|| ServiceError::part_not_found(link.child_part_id.clone()))?;
                Ok(BomComponent { link, part })
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.db.ping().await.map_err(|e| {
            error!("Catalog database ping failed: {}", e);
            ServiceError::DatabaseError(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn part_row(id: &str, part_type: &str, unit_cost: Option<Decimal>) -> part::Model {
        part::Model {
            id: id.to_string(),
            part_number: id.to_uppercase(),
            name: format!("Part {}", id),
            part_type: part_type.to_string(),
            unit_cost,
            unit_of_measure: None,
            material_spec: None,
        }
    }

    fn link_row(id: i64, parent: &str, child: &str, sequence: i32) -> bom_link::Model {
        bom_link::Model {
            id,
            parent_part_id: parent.to_string(),
            child_part_id: child.to_string(),
            sequence,
            quantity_per_parent_unit: dec!(3),
            unit_of_measure: Some("KG".to_string()),
            scrap_factor: dec!(0.1),
            operation: Some("Weld".to_string()),
            notes: None,
            cost_override: None,
        }
    }

    #[tokio::test]
    async fn resolves_children_in_link_order() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![part_row("sf", "SEMI_FINISHED", None)]])
            .append_query_results([vec![
                link_row(1, "sf", "rm-b", 10),
                link_row(2, "sf", "rm-a", 20),
            ]])
            .append_query_results([vec![
                part_row("rm-a", "RAW_MATERIAL", Some(dec!(5))),
                part_row("rm-b", "RAW_MATERIAL", None),
            ]])
            .into_connection();

        let resolver = DatabaseBomResolver::new(Arc::new(db));
        let children = resolver.children_of("sf").await.unwrap();

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].part.id, "rm-b");
        assert_eq!(children[1].part.id, "rm-a");
        assert_eq!(children[1].effective_unit_cost(), dec!(5));
        assert_eq!(children[0].unit_of_measure(), "KG");
        assert_eq!(children[0].part.unit_of_measure, "EA");
    }

    #[tokio::test]
    async fn missing_part_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<part::Model>::new()])
            .into_connection();

        let resolver = DatabaseBomResolver::new(Arc::new(db));
        assert_matches!(
            resolver.part("ghost").await,
            Err(ServiceError::PartNotFound { part_id }) if part_id == "ghost"
        );
    }

    #[tokio::test]
    async fn unknown_part_type_is_a_data_access_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![part_row("x", "GIZMO", None)]])
            .into_connection();

        let resolver = DatabaseBomResolver::new(Arc::new(db));
        assert_matches!(resolver.part("x").await, Err(ServiceError::DataAccess(_)));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_database_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();

        let resolver = DatabaseBomResolver::new(Arc::new(db));
        let err = resolver.children_of("fg").await.unwrap_err();
        assert_matches!(err, ServiceError::DatabaseError(_));
        assert_eq!(err.kind(), "data_access");
    }
}
