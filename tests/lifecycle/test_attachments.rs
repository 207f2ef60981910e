//! Signatures and photos through the attachment manager.

use icemas_fsm_lib::error::AppError;
use icemas_fsm_lib::models::{PhotoCategory, SignatureRole, UpdateServiceOrder};

use super::helpers::*;

#[actix_rt::test]
async fn test_order_signature_round_trips_as_data_uri() {
    let ctx = create_context().await;
    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let saved = ctx
        .services
        .orders
        .attachments()
        .save_order_signature(order.id, &png_data_uri(), SignatureRole::Client, None)
        .await
        .unwrap();
    assert!(saved.success);
    assert!(saved.filename.starts_with(&format!("firma_{}_", order.id)));

    let order = ctx.services.orders.get(order.id).await.unwrap();
    assert_eq!(order.client_signature.as_deref(), Some(png_data_uri().as_str()));
    assert!(order.technician_signature.is_none());
}

#[actix_rt::test]
async fn test_signature_validation() {
    let ctx = create_context().await;
    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();
    let attachments = ctx.services.orders.attachments();

    for payload in [
        "not-a-data-uri",
        "data:image/jpeg;base64,AAAA",
        "data:image/png;base64,",
    ] {
        let err = attachments
            .save_order_signature(order.id, payload, SignatureRole::Technician, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "{}: {:?}", payload, err);
    }

    let err = attachments
        .save_order_signature(9999, &png_data_uri(), SignatureRole::Client, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // A bad signature in an update is rejected before the order changes.
    let err = ctx
        .services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                work_performed: Some("no debe guardarse".to_string()),
                client_signature: Some("data:image/png;base64,@@@".to_string()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    let unchanged = ctx.services.orders.get(order.id).await.unwrap();
    assert!(unchanged.work_performed.is_none());
}

#[actix_rt::test]
async fn test_signature_through_update() {
    let ctx = create_context().await;
    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let order = ctx
        .services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                technician_signature: Some(png_data_uri()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();
    assert_eq!(
        order.technician_signature.as_deref(),
        Some(png_data_uri().as_str())
    );
}

#[actix_rt::test]
async fn test_technician_profile_signature() {
    let ctx = create_context().await;
    let attachments = ctx.services.orders.attachments();
    let technician_id = ctx.fixtures.technician_id;

    let err = attachments
        .technician_signature(technician_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let saved = attachments
        .save_technician_signature(technician_id, &png_data_uri())
        .await
        .unwrap();
    assert!(
        saved
            .filename
            .starts_with(&format!("firma_perfil_tecnico_{}_", technician_id))
    );
    assert_eq!(
        attachments.technician_signature(technician_id).await.unwrap(),
        png_data_uri()
    );

    attachments
        .delete_technician_signature(technician_id)
        .await
        .unwrap();
    assert!(attachments.technician_signature(technician_id).await.is_err());
}

#[actix_rt::test]
async fn test_photo_upload_list_and_delete() {
    let ctx = create_context().await;
    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();
    let attachments = ctx.services.orders.attachments();

    let before = attachments
        .add_photo(
            order.id,
            tiny_png(),
            "image/png",
            Some("antes.png"),
            PhotoCategory::Antes,
        )
        .await
        .unwrap();
    assert!(before.file_key.starts_with(&format!("foto_{}_", order.id)));
    assert!(before.image.starts_with("data:image/png;base64,"));

    let after = attachments
        .add_photo(order.id, vec![0xFF, 0xD8, 0xFF], "image/jpeg", None, PhotoCategory::Despues)
        .await
        .unwrap();
    assert!(after.file_key.ends_with(".jpg"));

    let photos = attachments.list_photos(order.id).await.unwrap();
    assert_eq!(photos.len(), 2);

    attachments.delete_photo(before.id).await.unwrap();
    let photos = attachments.list_photos(order.id).await.unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].category, PhotoCategory::Despues);

    let err = attachments.delete_photo(before.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_photo_rejects_unsupported_type_and_empty_file() {
    let ctx = create_context().await;
    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();
    let attachments = ctx.services.orders.attachments();

    let err = attachments
        .add_photo(order.id, vec![1, 2, 3], "image/gif", Some("a.gif"), PhotoCategory::Antes)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = attachments
        .add_photo(order.id, Vec::new(), "image/png", None, PhotoCategory::Antes)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    assert!(attachments.list_photos(order.id).await.unwrap().is_empty());
}
