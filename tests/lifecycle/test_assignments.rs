//! Equipment assignment reconciliation and equipment deletion.

use icemas_fsm_lib::entity::service_order;
use icemas_fsm_lib::error::AppError;
use icemas_fsm_lib::models::UpdateServiceOrder;
use icemas_fsm_lib::services::assignments::{delete_equipment, dependent_order_ids};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use super::helpers::*;

fn ids(order: &icemas_fsm_lib::models::ServiceOrderDetail) -> Vec<i32> {
    order.equipment_list.iter().map(|e| e.id).collect()
}

#[actix_rt::test]
async fn test_update_replaces_clears_or_keeps_assignments() {
    let ctx = create_context().await;
    let [a, b, c] = ctx.fixtures.equipment;

    let mut input = ctx.fixtures.order();
    input.equipment_ids = Some(vec![a, b]);
    let order = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();
    assert_eq!(ids(&order), vec![a, b]);

    // Full replace
    let order = ctx
        .services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                equipment_ids: Some(vec![c]),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();
    assert_eq!(ids(&order), vec![c]);

    // Absent list leaves the set untouched
    let order = ctx
        .services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                description: Some("Revisión general".to_string()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();
    assert_eq!(ids(&order), vec![c]);

    // Empty list clears it
    let order = ctx
        .services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                equipment_ids: Some(Vec::new()),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();
    assert!(order.equipment_list.is_empty());
}

#[actix_rt::test]
async fn test_legacy_link_is_fallback_for_reads() {
    let ctx = create_context().await;
    let [a, b, _] = ctx.fixtures.equipment;

    let mut input = ctx.fixtures.order();
    input.equipment_id = Some(a);
    let order = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();
    assert_eq!(order.equipment.as_ref().unwrap().id, a);
    assert_eq!(ids(&order), vec![a]);

    // Assignment rows take precedence once present; the legacy link stays readable.
    let order = ctx
        .services
        .orders
        .update(
            order.id,
            UpdateServiceOrder {
                equipment_ids: Some(vec![b]),
                ..Default::default()
            },
            ctx.fixtures.user_id,
        )
        .await
        .unwrap();
    assert_eq!(ids(&order), vec![b]);
    assert_eq!(order.equipment.as_ref().unwrap().id, a);
}

#[actix_rt::test]
async fn test_delete_equipment_without_dependents() {
    let ctx = create_context().await;
    let [_, _, spare] = ctx.fixtures.equipment;

    let removed = delete_equipment(&ctx.pool, ctx.services.store.as_ref(), spare, false)
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert!(ctx.pool.find_equipment(spare).await.unwrap().is_none());

    let err = delete_equipment(&ctx.pool, ctx.services.store.as_ref(), spare, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_delete_equipment_with_dependents_requires_force() {
    let ctx = create_context().await;
    let [a, b, _] = ctx.fixtures.equipment;

    // One order through the join table, one through the legacy link.
    let mut assigned = ctx.fixtures.order();
    assigned.equipment_ids = Some(vec![a, b]);
    let assigned = ctx
        .services
        .orders
        .create(assigned, ctx.fixtures.user_id)
        .await
        .unwrap();

    let mut legacy = ctx.fixtures.order();
    legacy.equipment_id = Some(a);
    let legacy = ctx
        .services
        .orders
        .create(legacy, ctx.fixtures.user_id)
        .await
        .unwrap();

    let unrelated = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let mut expected = vec![assigned.id, legacy.id];
    expected.sort();
    assert_eq!(
        dependent_order_ids(ctx.pool.connection(), a).await.unwrap(),
        expected
    );

    let preview = ctx.services.orders.equipment_dependents(a).await.unwrap();
    assert_eq!(preview.count, 2);

    let err = delete_equipment(&ctx.pool, ctx.services.store.as_ref(), a, false)
        .await
        .unwrap_err();
    match err {
        AppError::HasDependents { count, .. } => assert_eq!(count, 2),
        other => panic!("expected HasDependents, got {:?}", other),
    }
    assert!(ctx.pool.find_equipment(a).await.unwrap().is_some());

    let removed = delete_equipment(&ctx.pool, ctx.services.store.as_ref(), a, true)
        .await
        .unwrap();
    assert_eq!(removed, 2);

    assert!(ctx.pool.find_equipment(a).await.unwrap().is_none());
    assert!(ctx.pool.find_service_order(assigned.id).await.unwrap().is_none());
    assert!(ctx.pool.find_service_order(legacy.id).await.unwrap().is_none());
    assert!(ctx.pool.find_service_order(unrelated.id).await.unwrap().is_some());
    // Equipment shared with a removed order survives.
    assert!(ctx.pool.find_equipment(b).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_dependents_count_each_order_once() {
    let ctx = create_context().await;
    let [a, b, _] = ctx.fixtures.equipment;

    // Linked both ways: legacy field and an assignment row.
    let mut both = ctx.fixtures.order();
    both.equipment_id = Some(a);
    both.equipment_ids = Some(vec![a]);
    let both = ctx
        .services
        .orders
        .create(both, ctx.fixtures.user_id)
        .await
        .unwrap();

    let mut assigned = ctx.fixtures.order();
    assigned.equipment_ids = Some(vec![b, a]);
    let assigned = ctx
        .services
        .orders
        .create(assigned, ctx.fixtures.user_id)
        .await
        .unwrap();

    let mut legacy = ctx.fixtures.order();
    legacy.equipment_id = Some(a);
    let legacy = ctx
        .services
        .orders
        .create(legacy, ctx.fixtures.user_id)
        .await
        .unwrap();

    let mut expected = vec![both.id, assigned.id, legacy.id];
    expected.sort();
    assert_eq!(
        dependent_order_ids(ctx.pool.connection(), a).await.unwrap(),
        expected
    );
    assert_eq!(ctx.services.orders.equipment_dependents(a).await.unwrap().count, 3);

    let err = delete_equipment(&ctx.pool, ctx.services.store.as_ref(), a, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::HasDependents { count: 3, .. }));

    let removed = delete_equipment(&ctx.pool, ctx.services.store.as_ref(), a, true)
        .await
        .unwrap();
    assert_eq!(removed, 3);
    for id in expected {
        assert!(ctx.pool.find_service_order(id).await.unwrap().is_none());
    }
    assert!(ctx.pool.find_equipment(a).await.unwrap().is_none());
    assert!(ctx.pool.find_equipment(b).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_history_includes_legacy_only_orders() {
    let ctx = create_context().await;
    let [a, _, _] = ctx.fixtures.equipment;

    let order = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    // Historical row written before assignments existed.
    let model = service_order::Entity::find_by_id(order.id)
        .one(ctx.pool.connection())
        .await
        .unwrap()
        .unwrap();
    let mut active: service_order::ActiveModel = model.into();
    active.equipment_id = Set(Some(a));
    active.update(ctx.pool.connection()).await.unwrap();

    let history = ctx.services.orders.equipment_history(a).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].equipment[0].id, a);
}
