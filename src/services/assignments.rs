//! Equipment assignment reconciliation.
//!
//! An order's equipment lives in two places: the legacy
//! `service_orders.equipment_id` column and the `service_order_equipment`
//! join table. Writes go to the join table; reads go through
//! [`resolve_effective`] so historical single-equipment orders still show
//! their equipment.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, warn};

use crate::db::DbPool;
use crate::entity::{equipment, service_order, service_order_equipment, service_photo};
use crate::error::{AppError, AppResult};
use crate::services::storage::BlobStore;

/// Assignment rows win when present; otherwise the legacy link; otherwise nothing.
pub fn resolve_effective<T>(assigned: Vec<T>, legacy: Option<T>) -> Vec<T> {
    if !assigned.is_empty() {
        assigned
    } else {
        legacy.into_iter().collect()
    }
}

/// Drop repeated ids, keeping first-seen order.
pub fn dedupe_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Insert one assignment row per distinct id. No-op for an empty list.
pub async fn insert_assignments<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    equipment_ids: &[i32],
) -> AppResult<()> {
    let ids = dedupe_ids(equipment_ids);
    if ids.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let rows = ids.into_iter().map(|equipment_id| service_order_equipment::ActiveModel {
        service_order_id: Set(order_id),
        equipment_id: Set(equipment_id),
        created_at: Set(now),
        ..Default::default()
    });

    service_order_equipment::Entity::insert_many(rows)
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert equipment assignments: {}", e)))?;

    Ok(())
}

/// Full replace: the given set becomes the order's assignments. An empty set clears them.
pub async fn replace_assignments<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    equipment_ids: &[i32],
) -> AppResult<()> {
    service_order_equipment::Entity::delete_many()
        .filter(service_order_equipment::Column::ServiceOrderId.eq(order_id))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to clear equipment assignments: {}", e)))?;

    insert_assignments(conn, order_id, equipment_ids).await
}

/// Equipment ids assigned to each of `order_ids`, in assignment order.
pub async fn assigned_equipment_ids<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[i32],
) -> AppResult<HashMap<i32, Vec<i32>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = service_order_equipment::Entity::find()
        .filter(service_order_equipment::Column::ServiceOrderId.is_in(order_ids.to_vec()))
        .order_by_asc(service_order_equipment::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load equipment assignments: {}", e)))?;

    let mut by_order: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in rows {
        by_order
            .entry(row.service_order_id)
            .or_default()
            .push(row.equipment_id);
    }
    Ok(by_order)
}

/// Effective equipment ids for one order.
pub async fn effective_equipment_ids<C: ConnectionTrait>(
    conn: &C,
    order: &service_order::Model,
) -> AppResult<Vec<i32>> {
    let mut assigned = assigned_equipment_ids(conn, &[order.id]).await?;
    Ok(resolve_effective(
        assigned.remove(&order.id).unwrap_or_default(),
        order.equipment_id,
    ))
}

/// Orders referencing the equipment by legacy link or assignment, deduplicated and sorted.
pub async fn dependent_order_ids<C: ConnectionTrait>(
    conn: &C,
    equipment_id: i32,
) -> AppResult<Vec<i32>> {
    let legacy: Vec<i32> = service_order::Entity::find()
        .select_only()
        .column(service_order::Column::Id)
        .filter(service_order::Column::EquipmentId.eq(equipment_id))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to find dependent orders: {}", e)))?;

    let assigned: Vec<i32> = service_order_equipment::Entity::find()
        .select_only()
        .column(service_order_equipment::Column::ServiceOrderId)
        .filter(service_order_equipment::Column::EquipmentId.eq(equipment_id))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to find dependent orders: {}", e)))?;

    let ids: BTreeSet<i32> = legacy.into_iter().chain(assigned).collect();
    Ok(ids.into_iter().collect())
}

/// Delete an equipment item.
///
/// Without `force`, any dependent order makes this fail with
/// [`AppError::HasDependents`]. With `force`, every dependent order (and, by
/// cascade, its assignment and photo rows) is removed in the same transaction
/// as the equipment row. Stored blobs of the removed orders are deleted
/// afterwards, best-effort. Returns the number of orders removed.
pub async fn delete_equipment(
    pool: &DbPool,
    store: &dyn BlobStore,
    equipment_id: i32,
    force: bool,
) -> AppResult<u64> {
    if pool.find_equipment(equipment_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Equipment {}", equipment_id)));
    }

    let txn = pool.begin().await?;

    let dependents = dependent_order_ids(&txn, equipment_id).await?;

    if !dependents.is_empty() && !force {
        return Err(AppError::HasDependents {
            entity: format!("equipment {}", equipment_id),
            count: dependents.len() as u64,
        });
    }

    let mut orphaned_keys = Vec::new();

    if !dependents.is_empty() {
        let photo_keys: Vec<String> = service_photo::Entity::find()
            .select_only()
            .column(service_photo::Column::FileKey)
            .filter(service_photo::Column::ServiceOrderId.is_in(dependents.clone()))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load photos: {}", e)))?;
        orphaned_keys.extend(photo_keys);

        let orders = service_order::Entity::find()
            .filter(service_order::Column::Id.is_in(dependents.clone()))
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to load dependent orders: {}", e)))?;
        for order in orders {
            orphaned_keys.extend(order.client_signature);
            orphaned_keys.extend(order.technician_signature);
        }

        service_order_equipment::Entity::delete_many()
            .filter(service_order_equipment::Column::ServiceOrderId.is_in(dependents.clone()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete assignments: {}", e)))?;

        service_photo::Entity::delete_many()
            .filter(service_photo::Column::ServiceOrderId.is_in(dependents.clone()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete photos: {}", e)))?;

        service_order::Entity::delete_many()
            .filter(service_order::Column::Id.is_in(dependents.clone()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete dependent orders: {}", e)))?;
    }

    equipment::Entity::delete_by_id(equipment_id)
        .exec(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete equipment: {}", e)))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Database(format!("Failed to commit transaction: {}", e)))?;

    for key in orphaned_keys {
        if let Err(e) = store.delete(&key).await {
            warn!(key = %key, error = %e, "Failed to remove blob of deleted order");
        }
    }

    info!(
        equipment_id,
        orders_deleted = dependents.len(),
        "Equipment deleted"
    );

    Ok(dependents.len() as u64)
}
