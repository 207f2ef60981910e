//! Migration: catalog tables referenced by service orders.

use sea_orm_migration::prelude::*;

use super::{create_stmt, drop_stmt};
use crate::entity::{brand, branch, client, equipment, service_type, technician, user};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let stmts = vec![
            create_stmt(manager, user::Entity),
            create_stmt(manager, client::Entity),
            create_stmt(manager, branch::Entity),
            create_stmt(manager, brand::Entity),
            create_stmt(manager, equipment::Entity),
            create_stmt(manager, technician::Entity),
            create_stmt(manager, service_type::Entity),
        ];

        for stmt in stmts {
            manager.create_table(stmt).await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_branches_client_id")
                    .table(branch::Entity)
                    .col(branch::Column::ClientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let stmts = vec![
            drop_stmt(service_type::Entity),
            drop_stmt(technician::Entity),
            drop_stmt(equipment::Entity),
            drop_stmt(brand::Entity),
            drop_stmt(branch::Entity),
            drop_stmt(client::Entity),
            drop_stmt(user::Entity),
        ];

        for stmt in stmts {
            manager.drop_table(stmt).await?;
        }

        Ok(())
    }
}
