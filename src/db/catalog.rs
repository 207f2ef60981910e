//! Lookups over the catalog tables (clients, branches, equipment, technicians, users).
//!
//! Catalog CRUD lives outside this service; only the reads the order
//! lifecycle and document composer need are here.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::entity::{brand, branch, client, equipment, technician, user};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Equipment row with its brand, as shown on orders and documents.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentWithBrand {
    pub equipment: equipment::Model,
    pub brand: Option<brand::Model>,
}

impl DbPool {
    pub async fn find_client(&self, id: i32) -> AppResult<Option<client::Model>> {
        client::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get client: {}", e)))
    }

    pub async fn find_branch(&self, id: i32) -> AppResult<Option<branch::Model>> {
        branch::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get branch: {}", e)))
    }

    pub async fn find_equipment(&self, id: i32) -> AppResult<Option<equipment::Model>> {
        equipment::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get equipment: {}", e)))
    }

    pub async fn find_technician(&self, id: i32) -> AppResult<Option<technician::Model>> {
        technician::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get technician: {}", e)))
    }

    pub async fn find_user(&self, id: i32) -> AppResult<Option<user::Model>> {
        user::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))
    }

    /// Set or clear a technician's profile-level signature key.
    pub async fn set_technician_signature(
        &self,
        id: i32,
        signature_key: Option<String>,
    ) -> AppResult<technician::Model> {
        let model = technician::ActiveModel {
            id: Set(id),
            signature_key: Set(signature_key),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        model
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update technician: {}", e)))
    }

    /// Load equipment rows (with brands) keyed by id.
    pub async fn equipment_by_ids(
        &self,
        ids: &[i32],
    ) -> AppResult<HashMap<i32, EquipmentWithBrand>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = equipment::Entity::find()
            .filter(equipment::Column::Id.is_in(ids.to_vec()))
            .find_also_related(brand::Entity)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load equipment: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(equipment, brand)| (equipment.id, EquipmentWithBrand { equipment, brand }))
            .collect())
    }

    pub async fn clients_by_ids(&self, ids: &[i32]) -> AppResult<HashMap<i32, client::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = client::Entity::find()
            .filter(client::Column::Id.is_in(ids.to_vec()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load clients: {}", e)))?;
        Ok(rows.into_iter().map(|m| (m.id, m)).collect())
    }

    pub async fn branches_by_ids(&self, ids: &[i32]) -> AppResult<HashMap<i32, branch::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = branch::Entity::find()
            .filter(branch::Column::Id.is_in(ids.to_vec()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load branches: {}", e)))?;
        Ok(rows.into_iter().map(|m| (m.id, m)).collect())
    }

    pub async fn technicians_by_ids(
        &self,
        ids: &[i32],
    ) -> AppResult<HashMap<i32, technician::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = technician::Entity::find()
            .filter(technician::Column::Id.is_in(ids.to_vec()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load technicians: {}", e)))?;
        Ok(rows.into_iter().map(|m| (m.id, m)).collect())
    }
}
