//! ICEMAS field-service server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use icemas_fsm_lib::api::{self, AppServices};
use icemas_fsm_lib::auth::TokenVerifier;
use icemas_fsm_lib::config::Config;
use icemas_fsm_lib::db::DbPool;
use icemas_fsm_lib::middleware::RequestLogger;
use icemas_fsm_lib::services::storage;

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::other(format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging (RUST_LOG overrides the default level)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| std::io::Error::other(format!("Failed to set tracing subscriber: {}", e)))?;

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and FSM_JWT_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  ICEMAS Field Service Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = DbPool::new(&config.database)
        .await
        .map_err(|e| startup_error("Failed to initialize database", e))?;
    pool.run_migrations()
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;
    info!("Database migrations complete");

    let store = storage::connect(&config.storage)
        .await
        .map_err(|e| startup_error("Failed to initialize storage", e))?;
    info!(backend = ?config.storage.backend, "Blob storage ready");

    let services = AppServices::new(
        pool,
        store,
        TokenVerifier::new(&config.auth),
        config.documents.clone(),
        config.max_upload_size,
    );

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let max_upload_size = config.max_upload_size;

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    info!(
        "Starting server at http://{} ({} workers), docs at /swagger-ui/",
        bind_address, worker_count
    );

    HttpServer::new(move || {
        let origins = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_origin("http://localhost:5173")
        } else {
            // Same-origin only in production
            Cors::default()
        };
        let cors = origins
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);

        let services = services.clone();
        App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            // Signatures arrive as base64 JSON; leave room for a large data URI
            .app_data(web::JsonConfig::default().limit(max_upload_size))
            .service(web::scope("/api/v1").configure(move |cfg| services.configure(cfg)))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
