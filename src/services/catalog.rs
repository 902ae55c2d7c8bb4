use crate::{
    entities::{
        category::{self, ActiveModel as CategoryActiveModel, Entity as CategoryEntity},
        item::{self, Entity as ItemEntity},
    },
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters"))]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    /// Only items of this category
    pub category_id: Option<i32>,
}

/// Read access to items and categories, plus category maintenance
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: ItemFilter) -> Result<Vec<item::Model>, ServiceError> {
        let mut query = ItemEntity::find().order_by_asc(item::Column::Id);
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<item::Model, ServiceError> {
        ItemEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(CategoryEntity::find()
            .order_by_asc(category::Column::Value)
            .all(&*self.db)
            .await?)
    }

    async fn ensure_unique_name(&self, value: &str, except: Option<i32>) -> Result<(), ServiceError> {
        let mut query = CategoryEntity::find().filter(category::Column::Value.eq(value));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category {} already exists",
                value
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        request: CategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;
        let value = request.value.trim().to_string();
        self.ensure_unique_name(&value, None).await?;

        let created = CategoryActiveModel {
            value: Set(value),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = created.id, "Category created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: i32,
        request: CategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;
        let value = request.value.trim().to_string();

        let existing = CategoryEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))?;
        self.ensure_unique_name(&value, Some(id)).await?;

        let mut active = existing.into_active_model();
        active.value = Set(value);
        let updated = active.update(&*self.db).await?;

        info!(category_id = id, "Category updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        let existing = CategoryEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))?;
        existing.delete(&*self.db).await?;

        info!(category_id = id, "Category deleted");
        Ok(())
    }
}
