use crate::{
    db::DbPool,
    entities::{area, time_slot},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Optional filters for listing slots
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotFilter {
    pub area_id: Option<i32>,
    pub day_of_week: Option<i32>,
    pub is_active: Option<bool>,
}

/// Service for flipping weekly slots on and off
#[derive(Clone)]
pub struct TimeSlotService {
    db: Arc<DbPool>,
}

impl TimeSlotService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists slots, optionally filtered by area, day, and active flag
    #[instrument(skip(self))]
    pub async fn list_slots(
        &self,
        filter: SlotFilter,
    ) -> Result<Vec<time_slot::Model>, ServiceError> {
        let mut query = time_slot::Entity::find();
        if let Some(area_id) = filter.area_id {
            query = query.filter(time_slot::Column::AreaId.eq(area_id));
        }
        if let Some(day) = filter.day_of_week {
            validate_day(day)?;
            query = query.filter(time_slot::Column::DayOfWeek.eq(day));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(time_slot::Column::IsActive.eq(is_active));
        }

        let slots = query
            .order_by_asc(time_slot::Column::AreaId)
            .order_by_asc(time_slot::Column::DayOfWeek)
            .order_by_asc(time_slot::Column::Slot)
            .all(self.db.as_ref())
            .await?;
        Ok(slots)
    }

    /// Lists the full grid of one area
    #[instrument(skip(self))]
    pub async fn list_area_slots(
        &self,
        area_id: i32,
    ) -> Result<Vec<time_slot::Model>, ServiceError> {
        self.ensure_area_exists(area_id).await?;
        self.list_slots(SlotFilter {
            area_id: Some(area_id),
            ..Default::default()
        })
        .await
    }

    /// Sets the active flag of a single slot. The slot must belong to the
    /// given area; sibling slots are never touched.
    #[instrument(skip(self))]
    pub async fn set_slot_active(
        &self,
        area_id: i32,
        slot_id: i32,
        is_active: bool,
    ) -> Result<time_slot::Model, ServiceError> {
        let found = time_slot::Entity::find_by_id(slot_id)
            .filter(time_slot::Column::AreaId.eq(area_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Time slot {} not found for area {}",
                    slot_id, area_id
                ))
            })?;

        let mut active: time_slot::ActiveModel = found.into();
        active.is_active = Set(is_active);
        let updated = active.update(self.db.as_ref()).await?;

        info!(slot_id, area_id, is_active, "time slot toggled");
        Ok(updated)
    }

    /// Sets the active flag for every slot of one weekday in an area and
    /// returns the exact number of rows updated. Zero matching slots is a
    /// successful no-op.
    #[instrument(skip(self))]
    pub async fn set_day_active(
        &self,
        area_id: i32,
        day_of_week: i32,
        is_active: bool,
    ) -> Result<u64, ServiceError> {
        validate_day(day_of_week)?;
        self.ensure_area_exists(area_id).await?;

        let result = time_slot::Entity::update_many()
            .col_expr(time_slot::Column::IsActive, Expr::value(is_active))
            .col_expr(time_slot::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(time_slot::Column::AreaId.eq(area_id))
            .filter(time_slot::Column::DayOfWeek.eq(day_of_week))
            .exec(self.db.as_ref())
            .await?;

        info!(
            area_id,
            day_of_week,
            is_active,
            updated = result.rows_affected,
            "bulk day toggle"
        );
        Ok(result.rows_affected)
    }

    async fn ensure_area_exists(&self, area_id: i32) -> Result<(), ServiceError> {
        area::Entity::find_by_id(area_id)
            .one(self.db.as_ref())
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("Area {} not found", area_id)))
    }
}

fn validate_day(day: i32) -> Result<(), ServiceError> {
    if !(0..=6).contains(&day) {
        return Err(ServiceError::validation(
            "day_of_week",
            "Day of week must be between 0 (Monday) and 6 (Sunday).",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_range_is_enforced() {
        assert!(validate_day(0).is_ok());
        assert!(validate_day(6).is_ok());
        assert!(validate_day(7).is_err());
        assert!(validate_day(-1).is_err());
    }
}
