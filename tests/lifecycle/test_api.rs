//! HTTP surface: authentication, order routes and error bodies.

use actix_web::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::test;
use serde_json::{Value, json};

use super::helpers::*;

fn order_body(ctx: &TestContext) -> Value {
    json!({
        "client_id": ctx.fixtures.client_id,
        "branch_id": ctx.fixtures.branch_id,
        "equipment_ids": [ctx.fixtures.equipment[0], ctx.fixtures.equipment[1]],
        "technician_id": ctx.fixtures.technician_id,
        "service_type_id": ctx.fixtures.service_type_id,
        "service_date": "2025-01-15",
        "description": "Fuga de refrigerante",
        "status": "Pendiente"
    })
}

#[actix_rt::test]
async fn test_requests_without_token_are_rejected() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/service-orders")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");

    let req = test::TestRequest::get()
        .uri("/api/v1/service-orders")
        .insert_header((AUTHORIZATION, "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // Health stays public.
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_create_get_and_list_by_status() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;
    let auth = bearer(&ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/service-orders")
        .insert_header((AUTHORIZATION, auth.clone()))
        .set_json(order_body(&ctx))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["equipment_list"].as_array().unwrap().len(), 2);
    assert_eq!(created["last_modified_by"]["id"], ctx.fixtures.user_id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/service-orders/{}", id))
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["folio"], created["folio"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/service-orders/status/pendiente")
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let listed: Value = test::read_body_json(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/service-orders/status/cerrado")
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_invalid_status_in_body_is_rejected() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;

    let mut body = order_body(&ctx);
    body["status"] = json!("Abierto");

    let req = test::TestRequest::post()
        .uri("/api/v1/service-orders")
        .insert_header((AUTHORIZATION, bearer(&ctx)))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_signature_route_and_pdf_download() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;
    let auth = bearer(&ctx);

    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/service-orders/{}/signatures/cliente", order.id))
        .insert_header((AUTHORIZATION, auth.clone()))
        .set_json(json!({ "signature": png_data_uri() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let saved: Value = test::read_body_json(resp).await;
    assert_eq!(saved["success"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/service-orders/{}/pdf", order.id))
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let disposition = resp
        .headers()
        .get(CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("servicio_{}.pdf", order.id)));
    let bytes = test::read_body(resp).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[actix_rt::test]
async fn test_equipment_delete_conflict_body() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;
    let auth = bearer(&ctx);
    let equipment_id = ctx.fixtures.equipment[0];

    let mut input = ctx.fixtures.order();
    input.equipment_ids = Some(vec![equipment_id]);
    ctx.services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/equipment/{}", equipment_id))
        .insert_header((AUTHORIZATION, auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "HAS_DEPENDENTS");
    assert_eq!(body["details"]["dependent_count"], 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/equipment/{}?force=true", equipment_id))
        .insert_header((AUTHORIZATION, auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["deleted"], true);
    assert_eq!(body["service_orders_deleted"], 1);
}

#[actix_rt::test]
async fn test_client_autocomplete_route() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;
    ctx.services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/service-orders/autocomplete/cliente?term=Juan")
        .insert_header((AUTHORIZATION, bearer(&ctx)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let names: Value = test::read_body_json(resp).await;
    assert_eq!(names, json!(["Juan Pérez"]));
}

#[actix_rt::test]
async fn test_report_with_inverted_range_is_rejected() {
    let ctx = create_context().await;
    let app = create_test_app(&ctx).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/reports/service-orders/pdf?start_date=2025-02-01&end_date=2025-01-01")
        .insert_header((AUTHORIZATION, bearer(&ctx)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_INPUT");
}
