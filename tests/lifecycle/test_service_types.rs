//! Service type catalog.

use icemas_fsm_lib::error::AppError;
use icemas_fsm_lib::models::{CreateServiceType, UpdateServiceType};

use super::helpers::*;

#[actix_rt::test]
async fn test_create_rename_and_duplicate_names() {
    let ctx = create_context().await;
    let types = &ctx.services.service_types;

    let created = types
        .create(CreateServiceType {
            name: "  Instalación ".to_string(),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(created.name, "Instalación");

    let err = types
        .create(CreateServiceType {
            name: "Mantenimiento".to_string(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = types
        .update(
            created.id,
            UpdateServiceType {
                name: Some("Mantenimiento".to_string()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let renamed = types
        .update(
            created.id,
            UpdateServiceType {
                name: Some("Instalación nueva".to_string()),
                description: Some("Equipo nuevo".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Instalación nueva");
    assert_eq!(renamed.description.as_deref(), Some("Equipo nuevo"));

    assert!(types.check_name("Instalación nueva", None).await.unwrap().exists);
    assert!(!types.check_name("Instalación nueva", Some(created.id)).await.unwrap().exists);
}

#[actix_rt::test]
async fn test_delete_refused_while_in_use() {
    let ctx = create_context().await;
    let types = &ctx.services.service_types;
    let in_use = ctx.fixtures.service_type_id;

    ctx.services
        .orders
        .create(ctx.fixtures.order(), ctx.fixtures.user_id)
        .await
        .unwrap();

    let err = types.delete(in_use).await.unwrap_err();
    assert!(matches!(err, AppError::HasDependents { count: 1, .. }));

    let spare = types
        .create(CreateServiceType {
            name: "Diagnóstico".to_string(),
            description: None,
        })
        .await
        .unwrap();
    types.delete(spare.id).await.unwrap();
    assert!(matches!(types.get(spare.id).await, Err(AppError::NotFound(_))));
}
