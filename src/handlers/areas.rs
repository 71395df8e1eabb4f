use super::common::{created_response, success_response};
use crate::{
    auth::AuthenticatedUser,
    entities::{area, postcode},
    errors::ServiceError,
    handlers::AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CreateAreaRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAreaRequest {
    pub name: Option<String>,
}

/// Compact shape used by the list endpoint
#[derive(Debug, Serialize)]
pub struct AreaListItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<area::Model> for AreaResponse {
    fn from(model: area::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostcodeListItem {
    pub id: i32,
    pub postcode: String,
}

/// Detail shape: the area plus its postcodes
#[derive(Debug, Serialize)]
pub struct AreaDetailResponse {
    pub id: i32,
    pub name: String,
    pub postcodes: Vec<PostcodeListItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AreaDetailResponse {
    fn new(model: area::Model, postcodes: Vec<postcode::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            postcodes: postcodes
                .into_iter()
                .map(|p| PostcodeListItem {
                    id: p.id,
                    postcode: p.code,
                })
                .collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List all areas
pub async fn list_areas(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let areas = state.services.areas.list_areas().await?;
    let payload: Vec<AreaListItem> = areas
        .into_iter()
        .map(|a| AreaListItem {
            id: a.id,
            name: a.name,
        })
        .collect();
    Ok(success_response(payload))
}

/// Create an area; the weekly slot grid is provisioned with it
pub async fn create_area(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateAreaRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.areas.create_area(&payload.name).await?;
    Ok(created_response(json!({
        "message": "Area created successfully.",
        "area": AreaResponse::from(created),
    })))
}

/// Get area details with all associated postcodes
pub async fn get_area(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(area_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, postcodes) = state.services.areas.get_area(area_id).await?;
    Ok(success_response(AreaDetailResponse::new(found, postcodes)))
}

/// Update an area (PUT and PATCH share the semantics)
pub async fn update_area(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(area_id): Path<i32>,
    Json(payload): Json<UpdateAreaRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .areas
        .update_area(area_id, payload.name.as_deref())
        .await?;
    Ok(success_response(json!({
        "message": "Area updated successfully.",
        "area": AreaResponse::from(updated),
    })))
}

/// Delete an area; refused while postcodes are assigned
pub async fn delete_area(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(area_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.areas.delete_area(area_id).await?;
    Ok(success_response(json!({
        "message": "Area deleted successfully.",
    })))
}

/// Creates the router for area endpoints
pub fn area_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_areas).post(create_area))
        .route(
            "/:id",
            get(get_area)
                .put(update_area)
                .patch(update_area)
                .delete(delete_area),
        )
}
