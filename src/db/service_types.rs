//! Database queries for service types.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::service_order;
use crate::entity::service_type::{self, ActiveModel, Entity as ServiceType};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// All service types ordered by name.
    pub async fn list_service_types(&self) -> AppResult<Vec<service_type::Model>> {
        ServiceType::find()
            .order_by_asc(service_type::Column::Name)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list service types: {}", e)))
    }

    pub async fn find_service_type(&self, id: i32) -> AppResult<Option<service_type::Model>> {
        ServiceType::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get service type: {}", e)))
    }

    pub async fn insert_service_type(
        &self,
        name: String,
        description: Option<String>,
    ) -> AppResult<service_type::Model> {
        let now = Utc::now();
        let model = ActiveModel {
            name: Set(name),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert service type: {}", e)))
    }

    pub async fn update_service_type(
        &self,
        existing: service_type::Model,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<service_type::Model> {
        let mut model: ActiveModel = existing.into();
        if let Some(name) = name {
            model.name = Set(name);
        }
        if let Some(description) = description {
            model.description = Set(Some(description));
        }
        model.updated_at = Set(Utc::now());

        model
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update service type: {}", e)))
    }

    pub async fn delete_service_type(&self, id: i32) -> AppResult<u64> {
        let result = ServiceType::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete service type: {}", e)))?;
        Ok(result.rows_affected)
    }

    /// Whether another service type already uses `name` (case-insensitive).
    pub async fn service_type_name_exists(
        &self,
        name: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let mut query = ServiceType::find().filter(
            Expr::expr(Func::lower(Expr::col(service_type::Column::Name)))
                .eq(name.trim().to_lowercase()),
        );
        if let Some(exclude_id) = exclude_id {
            query = query.filter(service_type::Column::Id.ne(exclude_id));
        }

        let count = query
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check service type: {}", e)))?;
        Ok(count > 0)
    }

    pub async fn count_orders_with_service_type(&self, id: i32) -> AppResult<u64> {
        service_order::Entity::find()
            .filter(service_order::Column::ServiceTypeId.eq(id))
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count service orders: {}", e)))
    }
}
