//! API endpoint modules.

pub mod equipment;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod service_orders;
pub mod service_types;
pub mod technicians;

use actix_web::web;

use crate::auth::TokenVerifier;
use crate::config::DocumentSettings;
use crate::db::DbPool;
use crate::services::{
    AttachmentManager, DocumentComposer, OrderService, ServiceTypeService, SharedBlobStore,
};

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Largest accepted photo, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// Everything handlers pull from app data, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub pool: DbPool,
    pub store: SharedBlobStore,
    pub orders: OrderService,
    pub service_types: ServiceTypeService,
    pub composer: DocumentComposer,
    pub verifier: TokenVerifier,
    pub upload_limit: UploadLimit,
}

impl AppServices {
    pub fn new(
        pool: DbPool,
        store: SharedBlobStore,
        verifier: TokenVerifier,
        documents: DocumentSettings,
        max_upload_size: usize,
    ) -> Self {
        let attachments = AttachmentManager::new(pool.clone(), store.clone());
        let orders = OrderService::new(pool.clone(), attachments);
        Self {
            service_types: ServiceTypeService::new(pool.clone()),
            composer: DocumentComposer::new(orders.clone(), documents),
            orders,
            pool,
            store,
            verifier,
            upload_limit: UploadLimit(max_upload_size),
        }
    }

    /// Register shared state and every `/api/v1` route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.pool.clone()))
            .app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.orders.clone()))
            .app_data(web::Data::new(self.service_types.clone()))
            .app_data(web::Data::new(self.composer.clone()))
            .app_data(web::Data::new(self.verifier.clone()))
            .app_data(web::Data::new(self.upload_limit))
            .configure(configure_health_routes)
            .configure(service_orders::configure_routes)
            .configure(equipment::configure_routes)
            .configure(technicians::configure_routes)
            .configure(service_types::configure_routes)
            .configure(reports::configure_routes);
    }
}
