//! PDF rendering of service sheets and reports.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use icemas_fsm_lib::error::AppError;
use icemas_fsm_lib::models::{PhotoCategory, SignatureRole, UpdateServiceOrder};
use icemas_fsm_lib::services::BlobStore;

use super::helpers::*;

#[actix_rt::test]
async fn test_render_order_with_attachments() {
    let ctx = create_context().await;
    let mut input = ctx.fixtures.order();
    input.equipment_ids = Some(ctx.fixtures.equipment.to_vec());
    let order = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    ctx.services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                work_performed: Some("Recarga de gas y limpieza de condensador".to_string()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();

    let attachments = ctx.services.orders.attachments();
    attachments
        .save_order_signature(order.id, &png_data_uri(), SignatureRole::Client, None)
        .await
        .unwrap();
    attachments
        .save_technician_signature(ctx.fixtures.technician_id, &png_data_uri())
        .await
        .unwrap();
    attachments
        .add_photo(order.id, tiny_png(), "image/png", None, PhotoCategory::Antes)
        .await
        .unwrap();
    attachments
        .add_photo(order.id, tiny_webp(), "image/webp", Some("equipo.webp"), PhotoCategory::Despues)
        .await
        .unwrap();
    // Undecodable photo is skipped, not fatal.
    attachments
        .add_photo(order.id, vec![0, 1, 2, 3], "image/jpeg", None, PhotoCategory::Despues)
        .await
        .unwrap();

    let bytes = ctx.services.composer.render_order(order.id).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

fn signature_uri(payload: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(payload))
}

#[actix_rt::test]
async fn test_order_technician_signature_wins_over_profile() {
    let ctx = create_context().await;
    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();
    let attachments = ctx.services.orders.attachments();
    let composer = &ctx.services.composer;

    // No signature anywhere.
    let hydrated = ctx.services.orders.hydrate(order.id).await.unwrap();
    assert_eq!(composer.technician_signature(&hydrated).await, None);

    attachments
        .save_technician_signature(ctx.fixtures.technician_id, &signature_uri(b"profile"))
        .await
        .unwrap();
    let hydrated = ctx.services.orders.hydrate(order.id).await.unwrap();
    assert_eq!(
        composer.technician_signature(&hydrated).await.as_deref(),
        Some(&b"profile"[..])
    );

    let saved = attachments
        .save_order_signature(order.id, &signature_uri(b"order"), SignatureRole::Technician, None)
        .await
        .unwrap();
    let hydrated = ctx.services.orders.hydrate(order.id).await.unwrap();
    assert_eq!(
        composer.technician_signature(&hydrated).await.as_deref(),
        Some(&b"order"[..])
    );

    // Order-level file gone: fall back to the profile.
    ctx.services.store.delete(&saved.filename).await.unwrap();
    let hydrated = ctx.services.orders.hydrate(order.id).await.unwrap();
    assert_eq!(hydrated.order.technician_signature.as_deref(), Some(saved.filename.as_str()));
    assert_eq!(
        composer.technician_signature(&hydrated).await.as_deref(),
        Some(&b"profile"[..])
    );
}

#[actix_rt::test]
async fn test_render_missing_order_is_not_found() {
    let ctx = create_context().await;
    let err = ctx.services.composer.render_order(4242).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_render_report_empty_and_populated() {
    let ctx = create_context().await;

    let empty = ctx
        .services
        .composer
        .render_report(date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();
    assert!(empty.starts_with(b"%PDF"));

    for _ in 0..3 {
        ctx.services
            .orders
            .create(ctx.fixtures.order(), ctx.fixtures.user_id)
            .await
            .unwrap();
    }
    let populated = ctx
        .services
        .composer
        .render_report(date(2025, 1, 1), date(2025, 1, 31))
        .await
        .unwrap();
    assert!(populated.starts_with(b"%PDF"));

    let err = ctx
        .services
        .composer
        .render_report(date(2025, 2, 1), date(2025, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}
