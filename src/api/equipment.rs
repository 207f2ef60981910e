//! Equipment deletion and service history endpoints.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::Identity;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{DependentOrders, EquipmentDeleteParams, EquipmentDeletion, ServiceOrderSummary};
use crate::services::{OrderService, SharedBlobStore, assignments};

/// Delete an equipment item.
///
/// Refused with 409 while service orders reference it, unless `force=true`,
/// in which case those orders are deleted with it.
#[utoipa::path(
    delete,
    path = "/api/v1/equipment/{id}",
    tag = "Equipment",
    params(("id" = i32, Path, description = "Equipment id"), EquipmentDeleteParams),
    responses(
        (status = 200, description = "Equipment deleted", body = EquipmentDeletion),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Equipment has dependent service orders", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_equipment(
    identity: Identity,
    pool: web::Data<DbPool>,
    store: web::Data<SharedBlobStore>,
    path: web::Path<i32>,
    query: web::Query<EquipmentDeleteParams>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let removed = assignments::delete_equipment(&pool, store.get_ref().as_ref(), id, query.force).await?;

    info!(
        equipment_id = id,
        user_id = identity.user_id,
        force = query.force,
        service_orders_deleted = removed,
        "Equipment removed by user"
    );
    Ok(HttpResponse::Ok().json(EquipmentDeletion {
        deleted: true,
        service_orders_deleted: removed,
    }))
}

/// Orders that a forced deletion would remove.
#[utoipa::path(
    get,
    path = "/api/v1/equipment/{id}/dependents",
    tag = "Equipment",
    params(("id" = i32, Path, description = "Equipment id")),
    responses(
        (status = 200, description = "Dependent orders", body = DependentOrders),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn equipment_dependents(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(orders.equipment_dependents(path.into_inner()).await?))
}

/// Service history of an equipment item, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/equipment/{id}/service-orders",
    tag = "Equipment",
    params(("id" = i32, Path, description = "Equipment id")),
    responses(
        (status = 200, description = "Orders referencing the equipment", body = Vec<ServiceOrderSummary>),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn equipment_history(
    _identity: Identity,
    orders: web::Data<OrderService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(orders.equipment_history(path.into_inner()).await?))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/equipment/{id:\\d+}").route(web::delete().to(delete_equipment)))
        .service(
            web::resource("/equipment/{id:\\d+}/dependents").route(web::get().to(equipment_dependents)),
        )
        .service(
            web::resource("/equipment/{id:\\d+}/service-orders").route(web::get().to(equipment_history)),
        );
}
