use crate::{
    db::DbPool,
    entities::{category, item},
    errors::{map_unique_violation, FieldErrors, ServiceError},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Input for creating an item
#[derive(Debug)]
pub struct NewItem {
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub washing_price: Decimal,
    pub drycleaning_price: Decimal,
    pub pieces: i32,
}

/// Fields accepted by item update; `None` leaves the field unchanged.
#[derive(Debug, Default)]
pub struct ItemChanges {
    pub category_id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub washing_price: Option<Decimal>,
    pub drycleaning_price: Option<Decimal>,
    pub pieces: Option<i32>,
}

/// Service for the priced items of the catalog
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DbPool>,
}

impl ItemService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists items (optionally for one category) with their categories
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        category_id: Option<i32>,
    ) -> Result<Vec<(item::Model, category::Model)>, ServiceError> {
        let mut query = item::Entity::find();
        if let Some(category_id) = category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }

        let rows = query
            .find_also_related(category::Entity)
            .order_by_asc(item::Column::CategoryId)
            .order_by_asc(item::Column::Name)
            .all(self.db.as_ref())
            .await?;

        rows.into_iter()
            .map(|(row, parent)| {
                parent.map(|parent| (row, parent)).ok_or_else(|| {
                    ServiceError::InternalError("item without category".to_string())
                })
            })
            .collect()
    }

    /// Creates an item after field and per-category uniqueness checks
    #[instrument(skip(self))]
    pub async fn create_item(
        &self,
        input: NewItem,
    ) -> Result<(item::Model, category::Model), ServiceError> {
        let name = validate_fields(
            &input.name,
            input.washing_price,
            input.drycleaning_price,
            input.pieces,
        )?;
        let parent = self.find_parent_category(input.category_id).await?;
        self.ensure_name_available(input.category_id, &name, None)
            .await?;

        let created = item::ActiveModel {
            category_id: Set(input.category_id),
            name: Set(name.clone()),
            description: Set(input.description),
            washing_price: Set(input.washing_price),
            drycleaning_price: Set(input.drycleaning_price),
            pieces: Set(input.pieces),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| map_unique_violation(e, "name", duplicate_message(&name)))?;

        info!(item_id = created.id, category_id = parent.id, "item created");
        Ok((created, parent))
    }

    /// Fetches one item with its category
    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        item_id: i32,
    ) -> Result<(item::Model, category::Model), ServiceError> {
        let found = self.find_item(item_id).await?;
        let parent = found
            .find_related(category::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InternalError("item without category".to_string()))?;
        Ok((found, parent))
    }

    /// Applies partial changes to an item
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        item_id: i32,
        changes: ItemChanges,
    ) -> Result<(item::Model, category::Model), ServiceError> {
        let found = self.find_item(item_id).await?;

        let target_category = changes.category_id.unwrap_or(found.category_id);
        if changes.category_id.is_some() {
            self.find_parent_category(target_category).await?;
        }

        let target_name = match &changes.name {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(ServiceError::validation("name", "Item name is required."));
                }
                trimmed.to_string()
            }
            None => found.name.clone(),
        };

        let mut errors = FieldErrors::new();
        if let Some(price) = changes.washing_price {
            if price < Decimal::ZERO {
                errors.add("washing_price", "Washing price cannot be negative.");
            }
        }
        if let Some(price) = changes.drycleaning_price {
            if price < Decimal::ZERO {
                errors.add("drycleaning_price", "Drycleaning price cannot be negative.");
            }
        }
        if let Some(pieces) = changes.pieces {
            if pieces < 1 {
                errors.add("pieces", "Pieces must be at least 1.");
            }
        }
        errors.into_result()?;

        if changes.name.is_some() || changes.category_id.is_some() {
            self.ensure_name_available(target_category, &target_name, Some(item_id))
                .await?;
        }

        let mut active: item::ActiveModel = found.into();
        active.category_id = Set(target_category);
        active.name = Set(target_name.clone());
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.washing_price {
            active.washing_price = Set(price);
        }
        if let Some(price) = changes.drycleaning_price {
            active.drycleaning_price = Set(price);
        }
        if let Some(pieces) = changes.pieces {
            active.pieces = Set(pieces);
        }

        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, "name", duplicate_message(&target_name)))?;
        let parent = updated
            .find_related(category::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InternalError("item without category".to_string()))?;

        Ok((updated, parent))
    }

    /// Deletes an item
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: i32) -> Result<(), ServiceError> {
        let found = self.find_item(item_id).await?;
        found.delete(self.db.as_ref()).await?;
        info!(item_id, "item deleted");
        Ok(())
    }

    async fn find_item(&self, item_id: i32) -> Result<item::Model, ServiceError> {
        item::Entity::find_by_id(item_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
    }

    async fn find_parent_category(
        &self,
        category_id: i32,
    ) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::validation("category", "Category does not exist."))
    }

    async fn ensure_name_available(
        &self,
        category_id: i32,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = item::Entity::find()
            .filter(item::Column::CategoryId.eq(category_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(item::Column::Name))).eq(name.to_lowercase()),
            );
        if let Some(id) = exclude_id {
            query = query.filter(item::Column::Id.ne(id));
        }

        if query.count(self.db.as_ref()).await? > 0 {
            return Err(ServiceError::validation("name", duplicate_message(name)));
        }
        Ok(())
    }
}

fn validate_fields(
    name: &str,
    washing_price: Decimal,
    drycleaning_price: Decimal,
    pieces: i32,
) -> Result<String, ServiceError> {
    let mut errors = FieldErrors::new();

    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.add("name", "Item name is required.");
    }
    if washing_price < Decimal::ZERO {
        errors.add("washing_price", "Washing price cannot be negative.");
    }
    if drycleaning_price < Decimal::ZERO {
        errors.add("drycleaning_price", "Drycleaning price cannot be negative.");
    }
    if pieces < 1 {
        errors.add("pieces", "Pieces must be at least 1.");
    }

    errors.into_result()?;
    Ok(trimmed.to_string())
}

fn duplicate_message(name: &str) -> String {
    format!("Item '{}' already exists.", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn field_checks_accumulate_per_field() {
        let err = validate_fields("  ", dec!(-1), dec!(-2), 0).unwrap_err();
        match err {
            ServiceError::Validation(fields) => {
                assert!(fields.0.contains_key("name"));
                assert!(fields.0.contains_key("washing_price"));
                assert!(fields.0.contains_key("drycleaning_price"));
                assert!(fields.0.contains_key("pieces"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_fields_pass_and_trim() {
        let name = validate_fields(" Shirt ", dec!(2.50), dec!(0), 1).unwrap();
        assert_eq!(name, "Shirt");
    }
}
