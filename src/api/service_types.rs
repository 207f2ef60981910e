//! Service type catalog endpoints.

use actix_web::{HttpResponse, web};

use crate::auth::Identity;
use crate::error::AppResult;
use crate::models::{CreateServiceType, NameCheck, NameCheckParams, ServiceType, UpdateServiceType};
use crate::services::ServiceTypeService;

#[utoipa::path(
    get,
    path = "/api/v1/service-types",
    tag = "Service Types",
    responses((status = 200, description = "All service types by name", body = Vec<ServiceType>)),
    security(("bearer_auth" = []))
)]
pub async fn list_service_types(
    _identity: Identity,
    types: web::Data<ServiceTypeService>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(types.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-types",
    tag = "Service Types",
    request_body = CreateServiceType,
    responses(
        (status = 201, description = "Service type created", body = ServiceType),
        (status = 400, description = "Empty name", body = crate::error::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_service_type(
    _identity: Identity,
    types: web::Data<ServiceTypeService>,
    body: web::Json<CreateServiceType>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Created().json(types.create(body.into_inner()).await?))
}

/// Whether a name is taken (case-insensitive), optionally ignoring one id.
#[utoipa::path(
    get,
    path = "/api/v1/service-types/check-name",
    tag = "Service Types",
    params(NameCheckParams),
    responses((status = 200, description = "Whether the name is taken", body = NameCheck)),
    security(("bearer_auth" = []))
)]
pub async fn check_name(
    _identity: Identity,
    types: web::Data<ServiceTypeService>,
    query: web::Query<NameCheckParams>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    Ok(HttpResponse::Ok().json(types.check_name(&query.name, query.exclude_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-types/{id}",
    tag = "Service Types",
    params(("id" = i32, Path, description = "Service type id")),
    responses(
        (status = 200, description = "Service type", body = ServiceType),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_service_type(
    _identity: Identity,
    types: web::Data<ServiceTypeService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(types.get(path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/service-types/{id}",
    tag = "Service Types",
    params(("id" = i32, Path, description = "Service type id")),
    request_body = UpdateServiceType,
    responses(
        (status = 200, description = "Service type updated", body = ServiceType),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_service_type(
    _identity: Identity,
    types: web::Data<ServiceTypeService>,
    path: web::Path<i32>,
    body: web::Json<UpdateServiceType>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(types.update(path.into_inner(), body.into_inner()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-types/{id}",
    tag = "Service Types",
    params(("id" = i32, Path, description = "Service type id")),
    responses(
        (status = 204, description = "Service type deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Still used by service orders", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_service_type(
    _identity: Identity,
    types: web::Data<ServiceTypeService>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    types.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/service-types")
            .route(web::get().to(list_service_types))
            .route(web::post().to(create_service_type)),
    )
    .service(web::resource("/service-types/check-name").route(web::get().to(check_name)))
    .service(
        web::resource("/service-types/{id:\\d+}")
            .route(web::get().to(get_service_type))
            .route(web::put().to(update_service_type))
            .route(web::delete().to(delete_service_type)),
    );
}
