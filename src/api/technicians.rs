//! Technician profile signature endpoints.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Identity;
use crate::error::AppResult;
use crate::models::{SignatureRequest, SignatureSaved};
use crate::services::OrderService;

/// A technician's stored signature.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TechnicianSignature {
    pub technician_id: i32,
    /// `data:image/png;base64,...`
    pub signature: String,
}

/// Save a technician's profile signature, used on PDFs when an order has none of its own.
#[utoipa::path(
    post,
    path = "/api/v1/technicians/{id}/signature",
    tag = "Technicians",
    params(("id" = i32, Path, description = "Technician id")),
    request_body = SignatureRequest,
    responses(
        (status = 200, description = "Signature stored", body = SignatureSaved),
        (status = 400, description = "Not a PNG data URI", body = crate::error::ErrorResponse),
        (status = 404, description = "Technician not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_signature(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
    body: web::Json<SignatureRequest>,
) -> AppResult<HttpResponse> {
    let saved = orders
        .attachments()
        .save_technician_signature(path.into_inner(), &body.signature)
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians/{id}/signature",
    tag = "Technicians",
    params(("id" = i32, Path, description = "Technician id")),
    responses(
        (status = 200, description = "Stored signature", body = TechnicianSignature),
        (status = 404, description = "Technician or signature not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_signature(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let technician_id = path.into_inner();
    let signature = orders.attachments().technician_signature(technician_id).await?;
    Ok(HttpResponse::Ok().json(TechnicianSignature {
        technician_id,
        signature,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/technicians/{id}/signature",
    tag = "Technicians",
    params(("id" = i32, Path, description = "Technician id")),
    responses(
        (status = 204, description = "Signature removed"),
        (status = 404, description = "Technician not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_signature(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    orders
        .attachments()
        .delete_technician_signature(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/technicians/{id:\\d+}/signature")
            .route(web::get().to(get_signature))
            .route(web::post().to(save_signature))
            .route(web::delete().to(delete_signature)),
    );
}
