use crate::{
    db::DbPool,
    entities::{category, item},
    errors::{map_unique_violation, ServiceError},
};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Fields accepted by category update; `None` leaves the field unchanged,
/// `Some(None)` for description clears it.
#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// Service for the category side of the service catalog
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists all categories ordered by name
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(categories)
    }

    /// Creates a category
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<category::Model, ServiceError> {
        let name = normalize_name(name)?;
        self.ensure_name_available(&name, None).await?;

        let created = category::ActiveModel {
            name: Set(name.clone()),
            description: Set(description),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| map_unique_violation(e, "name", duplicate_message(&name)))?;

        info!(category_id = created.id, "category created");
        Ok(created)
    }

    /// Fetches a category with its items
    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: i32,
    ) -> Result<(category::Model, Vec<item::Model>), ServiceError> {
        let found = self.find_category(category_id).await?;
        let items = found
            .find_related(item::Entity)
            .order_by_asc(item::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok((found, items))
    }

    /// Applies partial changes to a category
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        category_id: i32,
        changes: CategoryChanges,
    ) -> Result<category::Model, ServiceError> {
        let found = self.find_category(category_id).await?;
        let mut active: category::ActiveModel = found.into();

        if let Some(name) = changes.name {
            let name = normalize_name(&name)?;
            self.ensure_name_available(&name, Some(category_id)).await?;
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }

        let updated = active.update(self.db.as_ref()).await.map_err(|e| {
            map_unique_violation(e, "name", "Category already exists.".to_string())
        })?;
        Ok(updated)
    }

    /// Deletes a category; its items go with it (FK cascade)
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: i32) -> Result<(), ServiceError> {
        let found = self.find_category(category_id).await?;
        found.delete(self.db.as_ref()).await?;
        info!(category_id, "category deleted");
        Ok(())
    }

    pub(crate) async fn find_category(
        &self,
        category_id: i32,
    ) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    async fn ensure_name_available(
        &self,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(
            Expr::expr(Func::lower(Expr::col(category::Column::Name))).eq(name.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
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
        return Err(ServiceError::validation("name", "Category name is required."));
    }
    Ok(trimmed.to_string())
}

fn duplicate_message(name: &str) -> String {
    format!("Category '{}' already exists.", name)
}
