//! Service type catalog (maintenance, installation, repair...).

use tracing::info;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CreateServiceType, NameCheck, ServiceType, UpdateServiceType};

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct ServiceTypeService {
    pool: DbPool,
}

impl ServiceTypeService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All types, by name.
    pub async fn list(&self) -> AppResult<Vec<ServiceType>> {
        Ok(self
            .pool
            .list_service_types()
            .await?
            .into_iter()
            .map(ServiceType::from)
            .collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<ServiceType> {
        self.pool
            .find_service_type(id)
            .await?
            .map(ServiceType::from)
            .ok_or_else(|| AppError::NotFound(format!("Service type {}", id)))
    }

    pub async fn create(&self, input: CreateServiceType) -> AppResult<ServiceType> {
        let name = clean_name(&input.name)?;
        if self.pool.service_type_name_exists(&name, None).await? {
            return Err(AppError::Conflict(format!(
                "Service type '{}' already exists",
                name
            )));
        }

        let created = self.pool.insert_service_type(name, input.description).await?;
        info!(service_type_id = created.id, "Service type created");
        Ok(created.into())
    }

    pub async fn update(&self, id: i32, input: UpdateServiceType) -> AppResult<ServiceType> {
        let existing = self
            .pool
            .find_service_type(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service type {}", id)))?;

        let name = input.name.as_deref().map(clean_name).transpose()?;
        if let Some(name) = &name
            && self.pool.service_type_name_exists(name, Some(id)).await?
        {
            return Err(AppError::Conflict(format!(
                "Service type '{}' already exists",
                name
            )));
        }

        let updated = self
            .pool
            .update_service_type(existing, name, input.description)
            .await?;
        Ok(updated.into())
    }

    /// Refused while any order still uses the type.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if self.pool.find_service_type(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Service type {}", id)));
        }

        let count = self.pool.count_orders_with_service_type(id).await?;
        if count > 0 {
            return Err(AppError::HasDependents {
                entity: format!("service type {}", id),
                count,
            });
        }

        self.pool.delete_service_type(id).await?;
        info!(service_type_id = id, "Service type deleted");
        Ok(())
    }

    pub async fn check_name(&self, name: &str, exclude_id: Option<i32>) -> AppResult<NameCheck> {
        Ok(NameCheck {
            exists: self.pool.service_type_name_exists(name, exclude_id).await?,
        })
    }
}
