//! Database queries for activity categories.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr};

use crate::entity::category::{self as category, ActiveModel, Entity as CategoryEntity};
use crate::error::{AppError, AppResult};
use crate::models::Category;

use super::DbPool;

impl DbPool {
    /// All categories ordered by name.
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list categories: {}", e)))?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: i32) -> AppResult<Option<Category>> {
        let result = CategoryEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get category: {}", e)))?;

        Ok(result.map(Category::from))
    }

    /// Get a category by exact name.
    pub async fn get_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        let result = CategoryEntity::find()
            .filter(category::Column::Name.eq(name))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get category: {}", e)))?;

        Ok(result.map(Category::from))
    }

    /// Insert a category. Names are unique.
    pub async fn create_category(&self, name: &str) -> AppResult<Category> {
        let model = ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = model.insert(self.connection()).await.map_err(|e| {
            if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
                AppError::InvalidInput(format!("Category '{}' already exists", name))
            } else {
                AppError::Database(format!("Failed to insert category: {}", e))
            }
        })?;

        Ok(result.into())
    }

    /// Delete a category. Activities filed under it keep existing without one.
    ///
    /// Returns `false` when no category had that ID.
    pub async fn delete_category(&self, id: i32) -> AppResult<bool> {
        let result = CategoryEntity::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete category: {}", e)))?;

        Ok(result.rows_affected > 0)
    }
}
