use super::common::success_response;
use crate::{
    auth::AuthenticatedUser,
    entities::time_slot,
    errors::ServiceError,
    handlers::AppState,
    services::time_slots::SlotFilter,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ToggleSlotRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SlotListQuery {
    pub area: Option<i32>,
    pub day_of_week: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TimeSlotResponse {
    pub id: i32,
    pub area: i32,
    pub day_of_week: i32,
    pub day_display: Option<&'static str>,
    pub slot: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<time_slot::Model> for TimeSlotResponse {
    fn from(model: time_slot::Model) -> Self {
        Self {
            id: model.id,
            area: model.area_id,
            day_of_week: model.day_of_week,
            day_display: time_slot::day_name(model.day_of_week),
            slot: model.slot,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List time slots across areas with optional filters
pub async fn list_time_slots(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<SlotListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let slots = state
        .services
        .time_slots
        .list_slots(SlotFilter {
            area_id: query.area,
            day_of_week: query.day_of_week,
            is_active: query.is_active,
        })
        .await?;
    let payload: Vec<TimeSlotResponse> = slots.into_iter().map(Into::into).collect();
    Ok(success_response(payload))
}

/// List the weekly grid of one area
pub async fn list_area_slots(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(area_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let slots = state.services.time_slots.list_area_slots(area_id).await?;
    let payload: Vec<TimeSlotResponse> = slots.into_iter().map(Into::into).collect();
    Ok(success_response(payload))
}

/// Toggle one slot of an area
pub async fn toggle_slot(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((area_id, slot_id)): Path<(i32, i32)>,
    Json(payload): Json<ToggleSlotRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .time_slots
        .set_slot_active(area_id, slot_id, payload.is_active)
        .await?;
    Ok(success_response(json!({
        "message": "Time slot updated successfully.",
        "time_slot": TimeSlotResponse::from(updated),
    })))
}

/// Toggle every slot of one weekday in an area
pub async fn toggle_day(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path((area_id, day_of_week)): Path<(i32, i32)>,
    Json(payload): Json<ToggleSlotRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .time_slots
        .set_day_active(area_id, day_of_week, payload.is_active)
        .await?;
    Ok(success_response(json!({
        "message": format!("Updated {} time slot(s).", updated),
        "updated_count": updated,
        "day_of_week": day_of_week,
        "day_display": time_slot::day_name(day_of_week),
        "is_active": payload.is_active,
    })))
}

/// Slot routes nested under /areas alongside the area CRUD routes
pub fn area_slot_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/time-slots", get(list_area_slots))
        .route("/:id/time-slots/:slot_id", patch(toggle_slot))
        .route("/:id/time-slots/day/:day", patch(toggle_day))
}
