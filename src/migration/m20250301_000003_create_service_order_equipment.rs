//! Migration: many-to-many equipment assignments.
//!
//! Backfills one assignment per historical order from the legacy
//! `service_orders.equipment_id` column.

use sea_orm_migration::prelude::*;

use super::{create_stmt, drop_stmt};
use crate::entity::service_order_equipment;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(create_stmt(manager, service_order_equipment::Entity))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("unique_service_order_equipment")
                    .table(service_order_equipment::Entity)
                    .col(service_order_equipment::Column::ServiceOrderId)
                    .col(service_order_equipment::Column::EquipmentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_order_equipment_equipment_id")
                    .table(service_order_equipment::Entity)
                    .col(service_order_equipment::Column::EquipmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                INSERT INTO service_order_equipment (service_order_id, equipment_id, created_at)
                SELECT id, equipment_id, created_at
                FROM service_orders
                WHERE equipment_id IS NOT NULL
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(drop_stmt(service_order_equipment::Entity))
            .await?;
        Ok(())
    }
}
