use super::common::{created_response, success_response};
use super::items::ItemListItem;
use crate::{
    auth::AuthenticatedUser,
    entities::category,
    errors::ServiceError,
    handlers::AppState,
    services::categories::CategoryChanges,
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
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    // Present-but-null clears the description; absent leaves it alone.
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List all categories
pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list_categories().await?;
    let payload: Vec<CategoryListItem> = categories
        .into_iter()
        .map(|c| CategoryListItem {
            id: c.id,
            name: c.name,
        })
        .collect();
    Ok(success_response(payload))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .categories
        .create_category(&payload.name, payload.description)
        .await?;
    Ok(created_response(json!({
        "message": "Category created successfully.",
        "category": CategoryResponse::from(created),
    })))
}

/// Get category details with its items
pub async fn get_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(category_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let (found, items) = state.services.categories.get_category(category_id).await?;
    let category_name = found.name.clone();
    let items: Vec<ItemListItem> = items
        .into_iter()
        .map(|item| ItemListItem::new(item, category_name.clone()))
        .collect();

    let mut body = serde_json::to_value(CategoryResponse::from(found))
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    body["items"] = serde_json::to_value(items)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    Ok(success_response(body))
}

/// Update a category (PUT and PATCH share the semantics)
pub async fn update_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(category_id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .categories
        .update_category(
            category_id,
            CategoryChanges {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    Ok(success_response(json!({
        "message": "Category updated successfully.",
        "category": CategoryResponse::from(updated),
    })))
}

/// Delete a category and its items
pub async fn delete_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(category_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.categories.delete_category(category_id).await?;
    Ok(success_response(json!({
        "message": "Category deleted successfully.",
    })))
}

/// Creates the router for category endpoints
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .patch(update_category)
                .delete(delete_category),
        )
}
