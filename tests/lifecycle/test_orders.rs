//! Create, update, read, list and delete of service orders.

use chrono::Utc;
use icemas_fsm_lib::entity::client;
use icemas_fsm_lib::error::AppError;
use icemas_fsm_lib::models::{OrderFilter, OrderStatus, UpdateServiceOrder};
use sea_orm::{ActiveModelTrait, Set};

use super::helpers::*;

#[actix_rt::test]
async fn test_create_hydrates_relations() {
    let ctx = create_context().await;
    let [cold_room, showcase, _] = ctx.fixtures.equipment;

    let mut input = ctx.fixtures.order();
    input.equipment_ids = Some(vec![cold_room, showcase, cold_room]);
    let order = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    assert_eq!(order.status, "Pendiente");
    assert_eq!(order.client.as_ref().unwrap().name, "Juan Pérez");
    assert_eq!(order.branch.as_ref().unwrap().name, "Sucursal Norte");
    assert_eq!(order.technician.as_ref().unwrap().name, "Luis Ramírez");
    assert_eq!(order.service_type.as_ref().unwrap().name, "Mantenimiento");
    assert_eq!(order.last_modified_by.as_ref().unwrap().id, ctx.fixtures.user_id);

    let ids: Vec<i32> = order.equipment_list.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![cold_room, showcase]);
    assert_eq!(order.equipment_list[0].brand.as_deref(), Some("Carrier"));
    assert!(order.equipment.is_none(), "legacy link is only written when supplied");
    assert!(order.photos.is_empty());
}

#[actix_rt::test]
async fn test_create_rejects_unknown_references() {
    let ctx = create_context().await;

    let mut input = ctx.fixtures.order();
    input.client_id = 9999;
    let err = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let mut input = ctx.fixtures.order();
    input.equipment_ids = Some(vec![ctx.fixtures.equipment[0], 4242]);
    let err = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let err = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), 777)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn test_update_changes_only_supplied_fields() {
    let ctx = create_context().await;
    let created = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let updated = ctx
        .services
        .orders
        .update(
            created.id,
            UpdateServiceOrder {
                status: Some(OrderStatus::Completed),
                work_performed: Some("Cambio de compresor".to_string()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();

    assert_eq!(updated.status, "Completado");
    assert_eq!(updated.work_performed.as_deref(), Some("Cambio de compresor"));
    assert_eq!(updated.folio, created.folio);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.service_date, created.service_date);
}

#[actix_rt::test]
async fn test_repeated_update_is_idempotent() {
    let ctx = create_context().await;
    let created = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let change = UpdateServiceOrder {
        status: Some(OrderStatus::InProgress),
        equipment_ids: Some(vec![ctx.fixtures.equipment[2]]),
        ..Default::default()
    };

    let first = ctx
        .services
        .orders
        .update(created.id, change.clone(), ctx.fixtures.user_id)
        .await
        .unwrap();
    let second = ctx
        .services
        .orders
        .update(created.id, change, ctx.fixtures.user_id)
        .await
        .unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.folio, second.folio);
    let ids = |list: &[icemas_fsm_lib::models::EquipmentRef]| -> Vec<i32> {
        list.iter().map(|e| e.id).collect()
    };
    assert_eq!(ids(&first.equipment_list), ids(&second.equipment_list));
}

#[actix_rt::test]
async fn test_update_folio_to_taken_value_conflicts() {
    let ctx = create_context().await;
    let a = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();
    let b = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let err = ctx
        .services
        .orders
        .update(
            b.id,
            UpdateServiceOrder {
                folio: Some(a.folio.clone()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    // Keeping its own folio is not a conflict.
    ctx.services
        .orders
        .update(
            b.id,
            UpdateServiceOrder {
                folio: Some(b.folio.clone()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();
}

#[actix_rt::test]
async fn test_list_filters_and_status_lookup() {
    let ctx = create_context().await;

    let mut early = ctx.fixtures.order();
    early.service_date = date(2025, 1, 5);
    early.equipment_ids = Some(vec![ctx.fixtures.equipment[0]]);
    let early = ctx
        .services
        .orders
        .create(early, ctx.fixtures.user_id)
        .await
        .unwrap();

    let mut late = ctx.fixtures.order();
    late.service_date = date(2025, 3, 10);
    late.status = OrderStatus::Completed;
    let late = ctx
        .services
        .orders
        .create(late, ctx.fixtures.user_id)
        .await
        .unwrap();

    let all = ctx
        .services
        .orders
        .list(&OrderFilter::default())
        .await
        .unwrap();
    assert_eq!(
        all.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![late.id, early.id],
        "newest service date first"
    );

    let january = ctx
        .services
        .orders
        .list(&OrderFilter {
            start_date: Some(date(2025, 1, 1)),
            end_date: Some(date(2025, 1, 31)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].id, early.id);
    assert_eq!(january[0].equipment[0].name, "Cámara fría");

    let completed = ctx
        .services
        .orders
        .list_by_status(OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, late.id);

    let err = ctx
        .services
        .orders
        .list(&OrderFilter {
            start_date: Some(date(2025, 2, 1)),
            end_date: Some(date(2025, 1, 1)),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[actix_rt::test]
async fn test_autocomplete_labels_and_short_terms() {
    let ctx = create_context().await;
    let mut input = ctx.fixtures.order();
    input.folio = Some("SRV-2501-042".to_string());
    ctx.services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    assert!(ctx.services.orders.autocomplete("S").await.unwrap().is_empty());

    let items = ctx.services.orders.autocomplete("042").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "#SRV-2501-042 - Juan Pérez");
}

#[actix_rt::test]
async fn test_autocomplete_matches_id_digits() {
    let ctx = create_context().await;

    let mut last = None;
    for n in 0.. {
        let mut input = ctx.fixtures.order();
        input.folio = Some(format!("MANUAL-{}", char::from(b'a' + n as u8)));
        let order = ctx
            .services
            .orders
            .create(input, ctx.fixtures.user_id)
            .await
            .unwrap();
        if order.id >= 10 {
            last = Some(order.id);
            break;
        }
    }
    let id = last.unwrap();

    let term = id.to_string();
    let items = ctx.services.orders.autocomplete(&term).await.unwrap();
    assert!(items.iter().any(|item| item.id == id));
    assert!(items.iter().all(|item| item.id.to_string().contains(&term)));
}

#[actix_rt::test]
async fn test_autocomplete_client_names() {
    let ctx = create_context().await;
    for _ in 0..2 {
        ctx.services
            .orders
            .create(ctx.fixtures.order(), ctx.fixtures.user_id)
            .await
            .unwrap();
    }

    // Client without orders is not suggested.
    let now = Utc::now();
    client::ActiveModel {
        name: Set("Juana Ríos".to_string()),
        company: Set(None),
        phone: Set(None),
        email: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(ctx.pool.connection())
    .await
    .unwrap();

    let orders = &ctx.services.orders;
    assert_eq!(orders.autocomplete_clients("ju").await.unwrap(), vec!["Juan Pérez"]);
    assert_eq!(orders.autocomplete_clients("an p").await.unwrap(), vec!["Juan Pérez"]);
    assert!(orders.autocomplete_clients("J").await.unwrap().is_empty());
    assert!(orders.autocomplete_clients("Ríos").await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_delete_removes_order() {
    let ctx = create_context().await;
    let mut input = ctx.fixtures.order();
    input.equipment_ids = Some(vec![ctx.fixtures.equipment[0]]);
    let order = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    ctx.services.orders.delete(order.id).await.unwrap();

    let err = ctx.services.orders.get(order.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx.services.orders.delete(order.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
