use crate::{
    db::DbPool,
    entities::{area, postcode},
    errors::{map_unique_violation, ServiceError},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Service for managing postcodes and their area assignment
#[derive(Clone)]
pub struct PostcodeService {
    db: Arc<DbPool>,
}

impl PostcodeService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists postcodes (optionally for one area) with their areas
    #[instrument(skip(self))]
    pub async fn list_postcodes(
        &self,
        area_id: Option<i32>,
    ) -> Result<Vec<(postcode::Model, area::Model)>, ServiceError> {
        let mut query = postcode::Entity::find();
        if let Some(area_id) = area_id {
            query = query.filter(postcode::Column::AreaId.eq(area_id));
        }

        let rows = query
            .find_also_related(area::Entity)
            .order_by_asc(postcode::Column::Code)
            .all(self.db.as_ref())
            .await?;

        // The FK guarantees the area side; a missing row would mean a broken
        // reference, so surface it instead of skipping.
        rows.into_iter()
            .map(|(code, parent)| {
                parent.map(|parent| (code, parent)).ok_or_else(|| {
                    ServiceError::InternalError("postcode without area".to_string())
                })
            })
            .collect()
    }

    /// Creates a postcode; the code is trimmed and uppercased first
    #[instrument(skip(self))]
    pub async fn create_postcode(
        &self,
        code: &str,
        area_id: i32,
    ) -> Result<(postcode::Model, area::Model), ServiceError> {
        let code = normalize_code(code)?;
        let parent = self.find_parent_area(area_id).await?;
        self.ensure_code_available(&code, None).await?;

        let created = postcode::ActiveModel {
            code: Set(code.clone()),
            area_id: Set(area_id),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| map_unique_violation(e, "postcode", duplicate_message(&code)))?;

        info!(postcode_id = created.id, area_id, "postcode created");
        Ok((created, parent))
    }

    /// Fetches one postcode with its area
    #[instrument(skip(self))]
    pub async fn get_postcode(
        &self,
        postcode_id: i32,
    ) -> Result<(postcode::Model, area::Model), ServiceError> {
        let found = self.find_postcode(postcode_id).await?;
        let parent = found
            .find_related(area::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InternalError("postcode without area".to_string()))?;
        Ok((found, parent))
    }

    /// Updates code and/or area; omitted fields are left unchanged
    #[instrument(skip(self))]
    pub async fn update_postcode(
        &self,
        postcode_id: i32,
        code: Option<&str>,
        area_id: Option<i32>,
    ) -> Result<(postcode::Model, area::Model), ServiceError> {
        let found = self.find_postcode(postcode_id).await?;
        let mut active: postcode::ActiveModel = found.into();

        if let Some(code) = code {
            let code = normalize_code(code)?;
            self.ensure_code_available(&code, Some(postcode_id)).await?;
            active.code = Set(code);
        }
        if let Some(area_id) = area_id {
            self.find_parent_area(area_id).await?;
            active.area_id = Set(area_id);
        }

        let updated = active.update(self.db.as_ref()).await.map_err(|e| {
            map_unique_violation(e, "postcode", "Postcode already exists.".to_string())
        })?;
        let parent = updated
            .find_related(area::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InternalError("postcode without area".to_string()))?;

        Ok((updated, parent))
    }

    /// Deletes a postcode
    #[instrument(skip(self))]
    pub async fn delete_postcode(&self, postcode_id: i32) -> Result<(), ServiceError> {
        let found = self.find_postcode(postcode_id).await?;
        found.delete(self.db.as_ref()).await?;
        info!(postcode_id, "postcode deleted");
        Ok(())
    }

    async fn find_postcode(&self, postcode_id: i32) -> Result<postcode::Model, ServiceError> {
        postcode::Entity::find_by_id(postcode_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Postcode {} not found", postcode_id)))
    }

    async fn find_parent_area(&self, area_id: i32) -> Result<area::Model, ServiceError> {
        area::Entity::find_by_id(area_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::validation("area", "Area does not exist."))
    }

    async fn ensure_code_available(
        &self,
        code: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = postcode::Entity::find().filter(postcode::Column::Code.eq(code));
        if let Some(id) = exclude_id {
            query = query.filter(postcode::Column::Id.ne(id));
        }

        if query.count(self.db.as_ref()).await? > 0 {
            return Err(ServiceError::validation("postcode", duplicate_message(code)));
        }
        Ok(())
    }
}

fn normalize_code(code: &str) -> Result<String, ServiceError> {
    let normalized = code.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(ServiceError::validation("postcode", "Postcode is required."));
    }
    Ok(normalized)
}

fn duplicate_message(code: &str) -> String {
    format!("Postcode '{}' already exists.", code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(normalize_code("  sw1a 1aa ").unwrap(), "SW1A 1AA");
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(normalize_code("   ").is_err());
    }
}
