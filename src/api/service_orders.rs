//! Service order endpoints: CRUD, lookups, signatures, photos and the order PDF.

use actix_multipart::Multipart;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use tracing::debug;

use super::UploadLimit;
use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::models::{
    AutocompleteItem, AutocompleteParams, CreateServiceOrder, FolioCheck, FolioCheckParams,
    OrderFilter, OrderStatus, PhotoCategory, PhotoView, ServiceOrderDetail, ServiceOrderSummary,
    SignatureRequest, SignatureRole, SignatureSaved, UpdateServiceOrder,
};
use crate::services::{DocumentComposer, OrderService};

fn parse_role(role: &str) -> AppResult<SignatureRole> {
    match role {
        "client" | "cliente" => Ok(SignatureRole::Client),
        "technician" | "tecnico" => Ok(SignatureRole::Technician),
        other => Err(AppError::InvalidInput(format!(
            "Unknown signature role '{}': expected client or technician",
            other
        ))),
    }
}

pub(crate) fn pdf_response(bytes: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "application/pdf"))
        .insert_header((
            CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", filename),
        ))
        .body(bytes)
}

/// List service orders.
///
/// All filters are optional and combine with AND. Newest service date first, at most 1000 rows.
#[utoipa::path(
    get,
    path = "/api/v1/service-orders",
    tag = "Service Orders",
    params(OrderFilter),
    responses(
        (status = 200, description = "Matching orders", body = Vec<ServiceOrderSummary>),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_service_orders(
    _identity: Identity,
    orders: web::Data<OrderService>,
    filter: web::Query<OrderFilter>,
) -> AppResult<HttpResponse> {
    let summaries = orders.list(&filter.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// Create a service order.
///
/// A folio is allocated when none is supplied.
#[utoipa::path(
    post,
    path = "/api/v1/service-orders",
    tag = "Service Orders",
    request_body = CreateServiceOrder,
    responses(
        (status = 201, description = "Order created", body = ServiceOrderDetail),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 404, description = "Referenced record not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Folio already exists", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_service_order(
    identity: Identity,
    orders: web::Data<OrderService>,
    body: web::Json<CreateServiceOrder>,
) -> AppResult<HttpResponse> {
    let detail = orders.create(body.into_inner(), identity.user_id).await?;
    Ok(HttpResponse::Created().json(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/{id}",
    tag = "Service Orders",
    params(("id" = i32, Path, description = "Service order id")),
    responses(
        (status = 200, description = "Hydrated order", body = ServiceOrderDetail),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_service_order(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let detail = orders.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Update a service order.
///
/// Absent fields are left alone. `equipment_ids` replaces the assignment set; an empty list clears it.
#[utoipa::path(
    put,
    path = "/api/v1/service-orders/{id}",
    tag = "Service Orders",
    params(("id" = i32, Path, description = "Service order id")),
    request_body = UpdateServiceOrder,
    responses(
        (status = 200, description = "Updated order", body = ServiceOrderDetail),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Order or referenced record not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Folio already exists", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_service_order(
    identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
    body: web::Json<UpdateServiceOrder>,
) -> AppResult<HttpResponse> {
    let detail = orders
        .update(path.into_inner(), body.into_inner(), identity.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-orders/{id}",
    tag = "Service Orders",
    params(("id" = i32, Path, description = "Service order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_service_order(
    identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    orders.delete(id).await?;
    debug!(order_id = id, user_id = identity.user_id, "Order removed by user");
    Ok(HttpResponse::NoContent().finish())
}

/// Latest 50 orders in a status.
///
/// Accepts the status label (`En Proceso`) or its slug (`en-proceso`).
#[utoipa::path(
    get,
    path = "/api/v1/service-orders/status/{status}",
    tag = "Service Orders",
    params(("status" = String, Path, description = "Pendiente, En Proceso, Completado or Cancelado")),
    responses(
        (status = 200, description = "Orders in the status", body = Vec<ServiceOrderSummary>),
        (status = 400, description = "Unknown status", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_by_status(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let raw = path.into_inner();
    let status = OrderStatus::parse(&raw)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown status '{}'", raw)))?;
    Ok(HttpResponse::Ok().json(orders.list_by_status(status).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/check-folio",
    tag = "Service Orders",
    params(FolioCheckParams),
    responses((status = 200, description = "Whether the folio is taken", body = FolioCheck)),
    security(("bearer_auth" = []))
)]
pub async fn check_folio(
    _identity: Identity,
    orders: web::Data<OrderService>,
    query: web::Query<FolioCheckParams>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    Ok(HttpResponse::Ok().json(orders.check_folio(&query.folio, query.exclude_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/autocomplete",
    tag = "Service Orders",
    params(AutocompleteParams),
    responses((status = 200, description = "Up to 10 suggestions", body = Vec<AutocompleteItem>)),
    security(("bearer_auth" = []))
)]
pub async fn autocomplete(
    _identity: Identity,
    orders: web::Data<OrderService>,
    query: web::Query<AutocompleteParams>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(orders.autocomplete(&query.term).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/autocomplete/cliente",
    tag = "Service Orders",
    params(AutocompleteParams),
    responses((status = 200, description = "Up to 10 distinct client names", body = Vec<String>)),
    security(("bearer_auth" = []))
)]
pub async fn autocomplete_clients(
    _identity: Identity,
    orders: web::Data<OrderService>,
    query: web::Query<AutocompleteParams>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(orders.autocomplete_clients(&query.term).await?))
}

/// Capture a signature.
///
/// `role` is `client` or `technician`; the body carries a `data:image/png;base64,` URI.
#[utoipa::path(
    post,
    path = "/api/v1/service-orders/{id}/signatures/{role}",
    tag = "Attachments",
    params(
        ("id" = i32, Path, description = "Service order id"),
        ("role" = String, Path, description = "client or technician"),
    ),
    request_body = SignatureRequest,
    responses(
        (status = 200, description = "Signature stored", body = SignatureSaved),
        (status = 400, description = "Not a PNG data URI", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_signature(
    identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<(i32, String)>,
    body: web::Json<SignatureRequest>,
) -> AppResult<HttpResponse> {
    let (id, role) = path.into_inner();
    let role = parse_role(&role)?;
    let saved = orders
        .attachments()
        .save_order_signature(id, &body.signature, role, Some(identity.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-orders/{id}/photos",
    tag = "Attachments",
    params(("id" = i32, Path, description = "Service order id")),
    responses(
        (status = 200, description = "Photos, most recent first", body = Vec<PhotoView>),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_photos(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(orders.attachments().list_photos(path.into_inner()).await?))
}

/// Upload a photo.
///
/// Multipart form with a `file` part (JPEG, PNG or WebP) and an optional
/// `category` part (`antes` or `despues`, default `antes`).
#[utoipa::path(
    post,
    path = "/api/v1/service-orders/{id}/photos",
    tag = "Attachments",
    params(("id" = i32, Path, description = "Service order id")),
    responses(
        (status = 201, description = "Photo stored", body = PhotoView),
        (status = 400, description = "Missing file, unsupported type or too large", body = crate::error::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_photo(
    _identity: Identity,
    orders: web::Data<OrderService>,
    limit: web::Data<UploadLimit>,
    path: web::Path<i32>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let order_id = path.into_inner();
    let mut file: Option<(Vec<u8>, String, Option<String>)> = None;
    let mut category = PhotoCategory::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        let mime = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
            if data.len() + chunk.len() > limit.0 {
                return Err(AppError::InvalidInput(format!(
                    "File exceeds the maximum size of {} bytes",
                    limit.0
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => file = Some((data, mime, filename)),
            "category" => {
                category = PhotoCategory::parse_or_default(String::from_utf8_lossy(&data).trim())
            }
            _ => {}
        }
    }

    let (data, mime, filename) =
        file.ok_or_else(|| AppError::InvalidInput("Missing 'file' part".to_string()))?;

    let photo = orders
        .attachments()
        .add_photo(order_id, data, &mime, filename.as_deref(), category)
        .await?;
    Ok(HttpResponse::Created().json(photo))
}

#[utoipa::path(
    delete,
    path = "/api/v1/photos/{id}",
    tag = "Attachments",
    params(("id" = i32, Path, description = "Photo id")),
    responses(
        (status = 204, description = "Photo deleted"),
        (status = 404, description = "Photo not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_photo(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    orders.attachments().delete_photo(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Printable service sheet.
#[utoipa::path(
    get,
    path = "/api/v1/service-orders/{id}/pdf",
    tag = "Documents",
    params(("id" = i32, Path, description = "Service order id")),
    responses(
        (status = 200, description = "PDF document (application/pdf)"),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn service_order_pdf(
    _identity: Identity,
    composer: web::Data<DocumentComposer>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let bytes = composer.render_order(id).await?;
    Ok(pdf_response(bytes, &format!("servicio_{}.pdf", id)))
}

/// Configure service order routes. Literal segments are registered before `{id}`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/service-orders")
            .route(web::get().to(list_service_orders))
            .route(web::post().to(create_service_order)),
    )
    .service(web::resource("/service-orders/check-folio").route(web::get().to(check_folio)))
    .service(web::resource("/service-orders/autocomplete").route(web::get().to(autocomplete)))
    .service(
        web::resource("/service-orders/autocomplete/cliente")
            .route(web::get().to(autocomplete_clients)),
    )
    .service(web::resource("/service-orders/status/{status}").route(web::get().to(list_by_status)))
    .service(
        web::resource("/service-orders/{id:\\d+}")
            .route(web::get().to(get_service_order))
            .route(web::put().to(update_service_order))
            .route(web::delete().to(delete_service_order)),
    )
    .service(
        web::resource("/service-orders/{id:\\d+}/signatures/{role}")
            .route(web::post().to(save_signature)),
    )
    .service(
        web::resource("/service-orders/{id:\\d+}/photos")
            .route(web::get().to(list_photos))
            .route(web::post().to(upload_photo)),
    )
    .service(web::resource("/service-orders/{id:\\d+}/pdf").route(web::get().to(service_order_pdf)))
    .service(web::resource("/photos/{id:\\d+}").route(web::delete().to(delete_photo)));
}
