//! Database queries for service order photos.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::service_photo::{self, ActiveModel, Entity as ServicePhoto};
use crate::error::{AppError, AppResult};
use crate::models::PhotoCategory;

use super::DbPool;

impl DbPool {
    pub async fn insert_photo(
        &self,
        service_order_id: i32,
        file_key: String,
        category: PhotoCategory,
    ) -> AppResult<service_photo::Model> {
        let now = Utc::now();
        let model = ActiveModel {
            service_order_id: Set(service_order_id),
            file_key: Set(file_key),
            category: Set(category.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert photo: {}", e)))
    }

    pub async fn find_photo(&self, id: i32) -> AppResult<Option<service_photo::Model>> {
        ServicePhoto::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get photo: {}", e)))
    }

    /// Photos of an order, most recent first.
    pub async fn list_photos(&self, service_order_id: i32) -> AppResult<Vec<service_photo::Model>> {
        ServicePhoto::find()
            .filter(service_photo::Column::ServiceOrderId.eq(service_order_id))
            .order_by_desc(service_photo::Column::CreatedAt)
            .order_by_desc(service_photo::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list photos: {}", e)))
    }

    pub async fn delete_photo_row(&self, id: i32) -> AppResult<()> {
        ServicePhoto::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete photo: {}", e)))?;
        Ok(())
    }
}
