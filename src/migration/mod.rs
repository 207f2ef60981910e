//! SeaORM database migrations.
//!
//! Tables are generated from the entity definitions so the same migrations run
//! against PostgreSQL in production and SQLite in tests.

pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

mod m20250301_000001_create_catalog;
mod m20250301_000002_create_service_orders;
mod m20250301_000003_create_service_order_equipment;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_catalog::Migration),
            Box::new(m20250301_000002_create_service_orders::Migration),
            Box::new(m20250301_000003_create_service_order_equipment::Migration),
        ]
    }
}

fn create_stmt<E: EntityTrait>(manager: &SchemaManager, entity: E) -> TableCreateStatement {
    let schema = Schema::new(manager.get_database_backend());
    schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned()
}

fn drop_stmt<E: EntityTrait>(entity: E) -> TableDropStatement {
    Table::drop().table(entity).if_exists().to_owned()
}
