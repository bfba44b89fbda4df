use super::common::{map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::explosion_service::ExplosionRequest,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Creates the router for BOM explosion endpoints
pub fn bom_routes() -> Router<AppState> {
    Router::new()
        .route("/bom/explode", post(explode_bom))
        .route("/parts/:id/bom/explosion", get(get_part_explosion))
        .route("/parts/:id/components", get(get_part_components))
}

// Request DTOs

fn default_include_requirements() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExplodeBomRequest {
    #[validate(length(min = 1, max = 128))]
    pub part_id: String,
    pub quantity: Decimal,
    pub max_depth: Option<i64>,
    #[serde(default = "default_include_requirements")]
    pub include_requirements: bool,
}

impl From<ExplodeBomRequest> for ExplosionRequest {
    fn from(payload: ExplodeBomRequest) -> Self {
        Self {
            part_id: payload.part_id,
            quantity: payload.quantity,
            max_depth: payload.max_depth,
            include_requirements: payload.include_requirements,
        }
    }
}

/// Query string for the part-scoped explosion; quantity defaults to one unit
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplosionQuery {
    pub quantity: Option<Decimal>,
    pub max_depth: Option<i64>,
    pub include_requirements: Option<bool>,
}

#[derive(Debug, Validate)]
struct PartPath {
    #[validate(length(min = 1, max = 128))]
    id: String,
}

// Handler functions

/// Explode a part for a production quantity
async fn explode_bom(
    State(state): State<AppState>,
    Json(payload): Json<ExplodeBomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let result = state
        .services
        .bom_explosion
        .explode(payload.into())
        .await
        .map_err(map_service_error)?;

    info!(
        "BOM explosion for part {} returned {} components",
        result.parent_part.id, result.summary.total_components
    );
    Ok(success_response(result))
}

/// Explode a part addressed by path
async fn get_part_explosion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ExplosionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&PartPath { id: id.clone() })?;

    let request = ExplosionRequest {
        part_id: id,
        quantity: query.quantity.unwrap_or(Decimal::ONE),
        max_depth: query.max_depth,
        include_requirements: query
            .include_requirements
            .unwrap_or_else(default_include_requirements),
    };

    let result = state
        .services
        .bom_explosion
        .explode(request)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(result))
}

/// Direct components of a part, one level down
async fn get_part_components(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&PartPath { id: id.clone() })?;

    let components = state
        .services
        .bom_explosion
        .components(&id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(components))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn explode_request_defaults_to_including_requirements() {
        let payload: ExplodeBomRequest =
            serde_json::from_str(r#"{"partId":"FG1","quantity":3}"#).unwrap();
        assert_eq!(payload.quantity, dec!(3));
        assert!(payload.include_requirements);
        assert!(payload.max_depth.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn blank_part_id_fails_validation() {
        let payload: ExplodeBomRequest =
            serde_json::from_str(r#"{"partId":"","quantity":"1.5","maxDepth":2}"#).unwrap();
        assert_eq!(payload.max_depth, Some(2));
        assert!(validate_input(&payload).is_err());
    }
}
