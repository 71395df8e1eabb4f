use super::common::{created_response, success_response};
use crate::{
    auth::AuthenticatedUser,
    entities::{area, postcode},
    errors::ServiceError,
    handlers::AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CreatePostcodeRequest {
    pub postcode: String,
    pub area: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostcodeRequest {
    pub postcode: Option<String>,
    pub area: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PostcodeListQuery {
    pub area: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PostcodeResponse {
    pub id: i32,
    pub postcode: String,
    pub area: i32,
    pub area_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostcodeResponse {
    fn new(model: postcode::Model, parent: area::Model) -> Self {
        Self {
            id: model.id,
            postcode: model.code,
            area: model.area_id,
            area_name: parent.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List postcodes with optional area filter
pub async fn list_postcodes(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<PostcodeListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.postcodes.list_postcodes(query.area).await?;
    let payload: Vec<PostcodeResponse> = rows
        .into_iter()
        .map(|(model, parent)| PostcodeResponse::new(model, parent))
        .collect();
    Ok(success_response(payload))
}

/// Create a postcode
pub async fn create_postcode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreatePostcodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (created, parent) = state
        .services
        .postcodes
        .create_postcode(&payload.postcode, payload.area)
        .await?;
    Ok(created_response(json!({
        "message": "Postcode created successfully.",
        "postcode": PostcodeResponse::new(created, parent),
    })))
}

/// Get postcode details
pub async fn get_postcode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(postcode_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, parent) = state.services.postcodes.get_postcode(postcode_id).await?;
    Ok(success_response(PostcodeResponse::new(found, parent)))
}

/// Update a postcode (PUT and PATCH share the semantics)
pub async fn update_postcode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(postcode_id): Path<i32>,
    Json(payload): Json<UpdatePostcodeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (updated, parent) = state
        .services
        .postcodes
        .update_postcode(postcode_id, payload.postcode.as_deref(), payload.area)
        .await?;
    Ok(success_response(json!({
        "message": "Postcode updated successfully.",
        "postcode": PostcodeResponse::new(updated, parent),
    })))
}

/// Delete a postcode
pub async fn delete_postcode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(postcode_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.postcodes.delete_postcode(postcode_id).await?;
    Ok(success_response(json!({
        "message": "Postcode deleted successfully.",
    })))
}

/// Creates the router for postcode endpoints
pub fn postcode_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_postcodes).post(create_postcode))
        .route(
            "/:id",
            get(get_postcode)
                .put(update_postcode)
                .patch(update_postcode)
                .delete(delete_postcode),
        )
}
