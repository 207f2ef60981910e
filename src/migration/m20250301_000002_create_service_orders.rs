//! Migration: service orders and their photos.
//!
//! `folio` carries a unique index; concurrent allocations that collide are
//! retried by the order service instead of producing duplicates.

use sea_orm_migration::prelude::*;

use super::{create_stmt, drop_stmt};
use crate::entity::{service_order, service_photo};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(create_stmt(manager, service_order::Entity))
            .await?;
        manager
            .create_table(create_stmt(manager, service_photo::Entity))
            .await?;

        let indexes = vec![
            Index::create()
                .name("idx_service_orders_service_date")
                .table(service_order::Entity)
                .col(service_order::Column::ServiceDate)
                .to_owned(),
            Index::create()
                .name("idx_service_orders_status")
                .table(service_order::Entity)
                .col(service_order::Column::Status)
                .to_owned(),
            Index::create()
                .name("idx_service_orders_equipment_id")
                .table(service_order::Entity)
                .col(service_order::Column::EquipmentId)
                .to_owned(),
            Index::create()
                .name("idx_service_photos_order_id")
                .table(service_photo::Entity)
                .col(service_photo::Column::ServiceOrderId)
                .to_owned(),
        ];

        for index in indexes {
            manager.create_index(index).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(drop_stmt(service_photo::Entity)).await?;
        manager.drop_table(drop_stmt(service_order::Entity)).await?;
        Ok(())
    }
}
