//! Date-range report endpoint.

use actix_web::{HttpResponse, web};

use super::service_orders::pdf_response;
use crate::auth::Identity;
use crate::error::AppResult;
use crate::models::ReportParams;
use crate::services::DocumentComposer;

/// Report of every order whose service date falls in the inclusive range.
#[utoipa::path(
    get,
    path = "/api/v1/reports/service-orders/pdf",
    tag = "Documents",
    params(ReportParams),
    responses(
        (status = 200, description = "PDF document (application/pdf)"),
        (status = 400, description = "start_date after end_date", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn service_orders_report(
    _identity: Identity,
    composer: web::Data<DocumentComposer>,
    query: web::Query<ReportParams>,
) -> AppResult<HttpResponse> {
    let ReportParams { start_date, end_date } = query.into_inner();
    let bytes = composer.render_report(start_date, end_date).await?;
    Ok(pdf_response(
        bytes,
        &format!(
            "reporte_servicios_{}_{}.pdf",
            start_date.format("%Y%m%d"),
            end_date.format("%Y%m%d")
        ),
    ))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reports/service-orders/pdf").route(web::get().to(service_orders_report)),
    );
}
