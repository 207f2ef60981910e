//! Shared fixtures: an in-memory database, a temp-dir blob store and catalog rows.

use std::sync::Arc;

use actix_web::{App, dev::ServiceResponse, test};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, Utc};
use icemas_fsm_lib::api::AppServices;
use icemas_fsm_lib::auth::TokenVerifier;
use icemas_fsm_lib::config::{AuthSettings, DocumentSettings};
use icemas_fsm_lib::db::DbPool;
use icemas_fsm_lib::entity::{
    branch, brand, client, equipment, service_type, technician, user,
};
use icemas_fsm_lib::models::{CreateServiceOrder, OrderStatus};
use icemas_fsm_lib::services::LocalStorage;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use secrecy::SecretString;
use tempfile::TempDir;

/// 1x1 opaque PNG.
pub const TINY_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

pub fn tiny_png() -> Vec<u8> {
    BASE64.decode(TINY_PNG_B64).unwrap()
}

/// 1x1 lossless WebP.
pub const TINY_WEBP_B64: &str = "UklGRhoAAABXRUJQVlA4TA0AAAAvAAAAEAcQERGIiP4HAA==";

pub fn tiny_webp() -> Vec<u8> {
    BASE64.decode(TINY_WEBP_B64).unwrap()
}

pub fn png_data_uri() -> String {
    format!("data:image/png;base64,{}", TINY_PNG_B64)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Catalog rows every order needs.
#[derive(Debug, Clone, Copy)]
pub struct Fixtures {
    pub user_id: i32,
    pub client_id: i32,
    pub branch_id: i32,
    pub technician_id: i32,
    pub service_type_id: i32,
    /// Three equipment items owned by the client
    pub equipment: [i32; 3],
}

impl Fixtures {
    pub fn order(&self) -> CreateServiceOrder {
        CreateServiceOrder {
            client_id: self.client_id,
            branch_id: Some(self.branch_id),
            equipment_id: None,
            equipment_ids: None,
            technician_id: self.technician_id,
            service_type_id: self.service_type_id,
            service_date: date(2025, 1, 15),
            order_type: Some("Correctivo".to_string()),
            description: Some("Cámara fría no enfría".to_string()),
            work_performed: None,
            folio: None,
            status: OrderStatus::Pending,
        }
    }
}

/// Database, storage and services wired the same way as the server.
pub struct TestContext {
    pub pool: DbPool,
    pub services: AppServices,
    pub fixtures: Fixtures,
    // Keeps the blob directory alive for the test's duration.
    _uploads: TempDir,
}

pub const TEST_SECRET: &str = "lifecycle-test-secret";

pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(&AuthSettings {
        jwt_secret: SecretString::from(TEST_SECRET),
        issuer: None,
    })
}

/// Fresh in-memory database with migrations applied.
pub async fn create_test_pool() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A single connection keeps every query on the same in-memory database.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let conn = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    let pool = DbPool::from_connection(conn);
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

pub async fn create_context() -> TestContext {
    let pool = create_test_pool().await;
    let uploads = tempfile::tempdir().unwrap();
    let store = LocalStorage::new(uploads.path()).await.unwrap();

    let services = AppServices::new(
        pool.clone(),
        Arc::new(store),
        verifier(),
        DocumentSettings::default(),
        10 * 1024 * 1024,
    );
    let fixtures = seed_catalog(&pool).await;

    TestContext {
        pool,
        services,
        fixtures,
        _uploads: uploads,
    }
}

/// Build the `/api/v1` app around a context.
pub async fn create_test_app(
    ctx: &TestContext,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    let services = ctx.services.clone();
    test::init_service(
        App::new().service(
            actix_web::web::scope("/api/v1").configure(move |cfg| services.configure(cfg)),
        ),
    )
    .await
}

pub fn bearer(ctx: &TestContext) -> String {
    let token = verifier()
        .issue(ctx.fixtures.user_id, "administrador", 3600)
        .unwrap();
    format!("Bearer {}", token)
}

async fn seed_catalog(pool: &DbPool) -> Fixtures {
    let conn = pool.connection();
    let now = Utc::now();

    let user = user::ActiveModel {
        name: Set("Admin ICEMAS".to_string()),
        email: Set("admin@icemas.test".to_string()),
        role: Set("administrador".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap();

    let client = client::ActiveModel {
        name: Set("Juan Pérez".to_string()),
        company: Set(Some("Abarrotes del Centro".to_string())),
        phone: Set(Some("555-0101".to_string())),
        email: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap();

    let branch = branch::ActiveModel {
        client_id: Set(client.id),
        name: Set("Sucursal Norte".to_string()),
        address: Set(Some("Av. Juárez 120".to_string())),
        phone: Set(None),
        contact: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap();

    let brand = brand::ActiveModel {
        name: Set("Carrier".to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap();

    let technician = technician::ActiveModel {
        name: Set("Luis Ramírez".to_string()),
        phone: Set(None),
        email: Set(None),
        specialty: Set(Some("Refrigeración".to_string())),
        active: Set(true),
        signature_key: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap();

    let service_type = service_type::ActiveModel {
        name: Set("Mantenimiento".to_string()),
        description: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap();

    let mut equipment_ids = [0; 3];
    for (slot, name) in equipment_ids
        .iter_mut()
        .zip(["Cámara fría", "Vitrina", "Minisplit"])
    {
        let item = equipment::ActiveModel {
            name: Set(name.to_string()),
            model: Set(Some("XR-200".to_string())),
            serial: Set(Some(format!("SN-{}", name.len()))),
            description: Set(None),
            brand_id: Set(Some(brand.id)),
            client_id: Set(Some(client.id)),
            branch_id: Set(Some(branch.id)),
            status: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .unwrap();
        *slot = item.id;
    }

    Fixtures {
        user_id: user.id,
        client_id: client.id,
        branch_id: branch.id,
        technician_id: technician.id,
        service_type_id: service_type.id,
        equipment: equipment_ids,
    }
}
