//! Folio allocation against a real table.

use icemas_fsm_lib::error::AppError;
use icemas_fsm_lib::services::folio::{allocate_folio, folio_prefix};

use super::helpers::*;

#[actix_rt::test]
async fn test_allocation_follows_existing_folios() {
    let ctx = create_context().await;
    let jan = date(2025, 1, 20);

    let first = allocate_folio(ctx.pool.connection(), jan).await.unwrap();
    assert_eq!(first, "SRV-2501-001");

    let mut input = ctx.fixtures.order();
    input.folio = Some(first);
    ctx.services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    let second = allocate_folio(ctx.pool.connection(), jan).await.unwrap();
    assert_eq!(second, "SRV-2501-002");

    // Other buckets are unaffected.
    let feb = allocate_folio(ctx.pool.connection(), date(2025, 2, 1))
        .await
        .unwrap();
    assert_eq!(feb, "SRV-2502-001");
}

#[actix_rt::test]
async fn test_wider_sequence_sorts_above_narrower() {
    let ctx = create_context().await;

    for folio in ["SRV-2501-999", "SRV-2501-1000"] {
        let mut input = ctx.fixtures.order();
        input.folio = Some(folio.to_string());
        ctx.services
            .orders
            .create(input, ctx.fixtures.user_id)
            .await
            .unwrap();
    }

    let next = allocate_folio(ctx.pool.connection(), date(2025, 1, 2))
        .await
        .unwrap();
    assert_eq!(next, "SRV-2501-1001");
}

#[actix_rt::test]
async fn test_non_numeric_folio_in_bucket_is_skipped() {
    let ctx = create_context().await;
    let prefix = folio_prefix(chrono::Local::now().date_naive());

    for suffix in ["001", "ZZZ"] {
        let mut input = ctx.fixtures.order();
        input.folio = Some(format!("{}{}", prefix, suffix));
        ctx.services
            .orders
            .create(input, ctx.fixtures.user_id)
            .await
            .unwrap();
    }

    let created = ctx
        .services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();
    assert_eq!(created.folio, format!("{}002", prefix));
}

#[actix_rt::test]
async fn test_exhausted_bucket_is_reported() {
    let ctx = create_context().await;

    let mut input = ctx.fixtures.order();
    input.folio = Some(format!("SRV-2501-{}", u64::MAX));
    ctx.services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap();

    let err = allocate_folio(ctx.pool.connection(), date(2025, 1, 9))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn test_auto_folios_are_distinct_and_sequential() {
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

    let prefix = folio_prefix(chrono::Local::now().date_naive());
    assert_eq!(a.folio, format!("{}001", prefix));
    assert_eq!(b.folio, format!("{}002", prefix));
}

#[actix_rt::test]
async fn test_duplicate_supplied_folio_conflicts() {
    let ctx = create_context().await;

    let mut input = ctx.fixtures.order();
    input.folio = Some("MANUAL-1".to_string());
    ctx.services
        .orders
        .create(input.clone(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let err = ctx
        .services
        .orders
        .create(input, ctx.fixtures.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let check = ctx
        .services
        .orders
        .check_folio("MANUAL-1", None)
        .await
        .unwrap();
    assert!(check.exists);
}
