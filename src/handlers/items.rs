use super::common::{created_response, success_response};
use crate::{
    auth::AuthenticatedUser,
    entities::{category, item},
    errors::ServiceError,
    handlers::AppState,
    services::items::{ItemChanges, NewItem},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub category: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub washing_price: Decimal,
    #[serde(default)]
    pub drycleaning_price: Decimal,
    #[serde(default = "default_pieces")]
    pub pieces: i32,
}

fn default_pieces() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub category: Option<i32>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub description: Option<Option<String>>,
    pub washing_price: Option<Decimal>,
    pub drycleaning_price: Option<Decimal>,
    pub pieces: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    pub category: Option<i32>,
}

/// Compact shape used by list endpoints and category detail
#[derive(Debug, Serialize)]
pub struct ItemListItem {
    pub id: i32,
    pub name: String,
    pub category_name: String,
    pub washing_price: Decimal,
    pub drycleaning_price: Decimal,
    pub pieces: i32,
}

impl ItemListItem {
    pub fn new(model: item::Model, category_name: String) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category_name,
            washing_price: model.washing_price,
            drycleaning_price: model.drycleaning_price,
            pieces: model.pieces,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i32,
    pub category: i32,
    pub category_name: String,
    pub name: String,
    pub description: Option<String>,
    pub washing_price: Decimal,
    pub drycleaning_price: Decimal,
    pub pieces: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemResponse {
    fn new(model: item::Model, parent: category::Model) -> Self {
        Self {
            id: model.id,
            category: model.category_id,
            category_name: parent.name,
            name: model.name,
            description: model.description,
            washing_price: model.washing_price,
            drycleaning_price: model.drycleaning_price,
            pieces: model.pieces,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List items with optional category filter
pub async fn list_items(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state.services.items.list_items(query.category).await?;
    let payload: Vec<ItemListItem> = rows
        .into_iter()
        .map(|(model, parent)| ItemListItem::new(model, parent.name))
        .collect();
    Ok(success_response(payload))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (created, parent) = state
        .services
        .items
        .create_item(NewItem {
            category_id: payload.category,
            name: payload.name,
            description: payload.description,
            washing_price: payload.washing_price,
            drycleaning_price: payload.drycleaning_price,
            pieces: payload.pieces,
        })
        .await?;
    Ok(created_response(json!({
        "message": "Item created successfully.",
        "item": ItemResponse::new(created, parent),
    })))
}

/// Get item details
pub async fn get_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, parent) = state.services.items.get_item(item_id).await?;
    Ok(success_response(ItemResponse::new(found, parent)))
}

/// Update an item (PUT and PATCH share the semantics)
pub async fn update_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(item_id): Path<i32>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (updated, parent) = state
        .services
        .items
        .update_item(
            item_id,
            ItemChanges {
                category_id: payload.category,
                name: payload.name,
                description: payload.description,
                washing_price: payload.washing_price,
                drycleaning_price: payload.drycleaning_price,
                pieces: payload.pieces,
            },
        )
        .await?;
    Ok(success_response(json!({
        "message": "Item updated successfully.",
        "item": ItemResponse::new(updated, parent),
    })))
}

/// Delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(item_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.items.delete_item(item_id).await?;
    Ok(success_response(json!({
        "message": "Item deleted successfully.",
    })))
}

/// Creates the router for item endpoints
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/:id",
            get(get_item)
                .put(update_item)
                .patch(update_item)
                .delete(delete_item),
        )
}
