use crate::{
    db::DbPool,
    entities::{area, postcode, time_slot},
    errors::{map_unique_violation, ServiceError},
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Service for managing coverage areas and their auto-provisioned slot grids
#[derive(Clone)]
pub struct AreaService {
    db: Arc<DbPool>,
}

impl AreaService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists all areas ordered by name
    #[instrument(skip(self))]
    pub async fn list_areas(&self) -> Result<Vec<area::Model>, ServiceError> {
        let areas = area::Entity::find()
            .order_by_asc(area::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(areas)
    }

    /// Creates an area together with its full weekly slot grid, atomically.
    /// Every generated slot starts inactive.
    #[instrument(skip(self))]
    pub async fn create_area(&self, name: &str) -> Result<area::Model, ServiceError> {
        let name = normalize_name(name)?;
        self.ensure_name_available(&name, None).await?;

        let txn = self.db.begin().await?;

        let created = area::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, "name", duplicate_message(&name)))?;

        // insert_many bypasses ActiveModelBehavior, so timestamps are set here.
        let now = Utc::now();
        let grid: Vec<time_slot::ActiveModel> = time_slot::DAYS_OF_WEEK
            .iter()
            .flat_map(|(day, _)| {
                time_slot::SLOT_BANDS.iter().map(move |band| time_slot::ActiveModel {
                    area_id: Set(created.id),
                    day_of_week: Set(*day),
                    slot: Set((*band).to_string()),
                    is_active: Set(false),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                })
            })
            .collect();

        time_slot::Entity::insert_many(grid).exec(&txn).await?;

        txn.commit().await?;

        info!(
            area_id = created.id,
            slots = time_slot::WEEKLY_SLOT_COUNT,
            "area created with weekly slot grid"
        );
        Ok(created)
    }

    /// Fetches an area with its postcodes
    #[instrument(skip(self))]
    pub async fn get_area(
        &self,
        area_id: i32,
    ) -> Result<(area::Model, Vec<postcode::Model>), ServiceError> {
        let found = self.find_area(area_id).await?;
        let postcodes = found
            .find_related(postcode::Entity)
            .order_by_asc(postcode::Column::Code)
            .all(self.db.as_ref())
            .await?;
        Ok((found, postcodes))
    }

    /// Renames an area; `name = None` (PATCH without the field) is a no-op
    #[instrument(skip(self))]
    pub async fn update_area(
        &self,
        area_id: i32,
        name: Option<&str>,
    ) -> Result<area::Model, ServiceError> {
        let found = self.find_area(area_id).await?;

        let Some(name) = name else {
            return Ok(found);
        };
        let name = normalize_name(name)?;
        self.ensure_name_available(&name, Some(area_id)).await?;

        let mut active: area::ActiveModel = found.into();
        active.name = Set(name.clone());
        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "name", duplicate_message(&name)))?;

        Ok(updated)
    }

    /// Deletes an area and (via cascade) its slot grid. Rejected while any
    /// postcode still references the area.
    #[instrument(skip(self))]
    pub async fn delete_area(&self, area_id: i32) -> Result<(), ServiceError> {
        let found = self.find_area(area_id).await?;

        let assigned = postcode::Entity::find()
            .filter(postcode::Column::AreaId.eq(area_id))
            .count(self.db.as_ref())
            .await?;
        if assigned > 0 {
            return Err(ServiceError::InvalidInput(
                "Cannot delete an area while postcodes are assigned to it.".to_string(),
            ));
        }

        found.delete(self.db.as_ref()).await?;
        info!(area_id, "area deleted");
        Ok(())
    }

    pub(crate) async fn find_area(&self, area_id: i32) -> Result<area::Model, ServiceError> {
        area::Entity::find_by_id(area_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Area {} not found", area_id)))
    }

    async fn ensure_name_available(
        &self,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = area::Entity::find().filter(
            Expr::expr(Func::lower(Expr::col(area::Column::Name))).eq(name.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(area::Column::Id.ne(id));
        }

        if query.count(self.db.as_ref()).await? > 0 {
            return Err(ServiceError::validation("name", duplicate_message(name)));
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("name", "Area name is required."));
    }
    Ok(trimmed.to_string())
}

fn duplicate_message(name: &str) -> String {
    format!("Area '{}' already exists.", name)
}
