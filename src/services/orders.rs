//! Service order lifecycle: create, update, hydrated reads, listing and deletion.
//!
//! The acting user is an explicit parameter on every write and is stamped
//! into `last_modified_by`.

use std::collections::{BTreeSet, HashMap};

use chrono::{Local, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::{debug, info, warn};

use crate::db::DbPool;
use crate::db::catalog::EquipmentWithBrand;
use crate::entity::{
    branch, client, service_order, service_order_equipment, service_photo, service_type,
    technician, user,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AutocompleteItem, BranchRef, ClientRef, CreateServiceOrder, DependentOrder, DependentOrders,
    EquipmentRef, FolioCheck, NamedRef, OrderFilter, OrderStatus, ServiceOrderDetail,
    ServiceOrderSummary, SignatureRole, UpdateServiceOrder,
};
use crate::services::assignments::{
    assigned_equipment_ids, dedupe_ids, dependent_order_ids, insert_assignments,
    replace_assignments, resolve_effective,
};
use crate::services::attachments::{AttachmentManager, decode_png_data_uri};
use crate::services::folio::allocate_folio;

/// Attempts at inserting an order with an auto-allocated folio before giving up.
const MAX_FOLIO_ATTEMPTS: usize = 5;

/// Minimum term length for autocomplete.
const AUTOCOMPLETE_MIN_CHARS: usize = 2;

/// An order with every relation loaded. Attachment fields still hold storage keys.
#[derive(Debug, Clone)]
pub struct HydratedOrder {
    pub order: service_order::Model,
    pub client: Option<client::Model>,
    pub branch: Option<branch::Model>,
    pub legacy_equipment: Option<EquipmentWithBrand>,
    /// Effective equipment list
    pub equipment: Vec<EquipmentWithBrand>,
    pub technician: Option<technician::Model>,
    pub service_type: Option<service_type::Model>,
    pub last_modified_by: Option<user::Model>,
    /// Most recent first
    pub photos: Vec<service_photo::Model>,
}

pub fn equipment_ref(item: &EquipmentWithBrand) -> EquipmentRef {
    EquipmentRef {
        id: item.equipment.id,
        name: item.equipment.name.clone(),
        model: item.equipment.model.clone(),
        serial: item.equipment.serial.clone(),
        brand: item.brand.as_ref().map(|b| b.name.clone()),
    }
}

fn client_ref(model: &client::Model) -> ClientRef {
    ClientRef {
        id: model.id,
        name: model.name.clone(),
        company: model.company.clone(),
        phone: model.phone.clone(),
        email: model.email.clone(),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn clean_folio(folio: &str) -> AppResult<String> {
    let folio = folio.trim();
    if folio.is_empty() {
        return Err(AppError::InvalidInput("Folio cannot be empty".to_string()));
    }
    Ok(folio.to_string())
}

/// Orchestrates order persistence across the relational store, the folio
/// allocator, the assignment reconciler and the attachment manager.
#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
    attachments: AttachmentManager,
}

impl OrderService {
    pub fn new(pool: DbPool, attachments: AttachmentManager) -> Self {
        Self { pool, attachments }
    }

    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    /// Create an order, allocating a folio when none is supplied.
    ///
    /// The order row and its assignments are written in one transaction. A
    /// collision on an auto-allocated folio is retried with a fresh
    /// allocation; a collision on a caller-supplied folio is a conflict.
    pub async fn create(
        &self,
        input: CreateServiceOrder,
        acting_user_id: i32,
    ) -> AppResult<ServiceOrderDetail> {
        self.ensure_user(acting_user_id).await?;
        self.ensure_client(input.client_id).await?;
        if let Some(branch_id) = input.branch_id {
            self.ensure_branch(branch_id).await?;
        }
        self.ensure_technician(input.technician_id).await?;
        self.ensure_service_type(input.service_type_id).await?;

        let equipment_ids = dedupe_ids(input.equipment_ids.as_deref().unwrap_or_default());
        let legacy: Vec<i32> = input.equipment_id.into_iter().collect();
        self.ensure_equipment(&legacy).await?;
        self.ensure_equipment(&equipment_ids).await?;

        let requested = input.folio.as_deref().map(clean_folio).transpose()?;
        let today = Local::now().date_naive();

        for attempt in 1..=MAX_FOLIO_ATTEMPTS {
            let txn = self.pool.begin().await?;

            let folio = match &requested {
                Some(folio) => folio.clone(),
                None => allocate_folio(&txn, today).await?,
            };

            let now = Utc::now();
            let row = service_order::ActiveModel {
                folio: Set(folio.clone()),
                client_id: Set(input.client_id),
                branch_id: Set(input.branch_id),
                equipment_id: Set(input.equipment_id),
                technician_id: Set(input.technician_id),
                service_type_id: Set(input.service_type_id),
                service_date: Set(input.service_date),
                order_type: Set(input.order_type.clone()),
                description: Set(input.description.clone()),
                work_performed: Set(input.work_performed.clone()),
                status: Set(input.status.as_str().to_string()),
                client_signature: Set(None),
                technician_signature: Set(None),
                last_modified_by: Set(Some(acting_user_id)),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match row.insert(&txn).await {
                Ok(order) => {
                    insert_assignments(&txn, order.id, &equipment_ids).await?;
                    txn.commit().await.map_err(|e| {
                        AppError::Database(format!("Failed to commit service order: {}", e))
                    })?;

                    info!(order_id = order.id, folio = %order.folio, "Service order created");
                    return self.get(order.id).await;
                }
                Err(e) if is_unique_violation(&e) => {
                    if requested.is_some() {
                        return Err(AppError::Conflict(format!("Folio {} already exists", folio)));
                    }
                    warn!(folio = %folio, attempt, "Folio collision, retrying allocation");
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Failed to insert service order: {}",
                        e
                    )));
                }
            }
        }

        Err(AppError::Conflict(format!(
            "Could not allocate a unique folio after {} attempts",
            MAX_FOLIO_ATTEMPTS
        )))
    }

    /// Partial update.
    ///
    /// `equipment_ids` replaces the assignment set when present (empty clears
    /// it) and leaves it untouched when absent. Signature fields are stored
    /// through the attachment manager after the scalar fields are committed.
    pub async fn update(
        &self,
        id: i32,
        input: UpdateServiceOrder,
        acting_user_id: i32,
    ) -> AppResult<ServiceOrderDetail> {
        let order = self.pool.get_service_order(id).await?;
        self.ensure_user(acting_user_id).await?;

        if let Some(client_id) = input.client_id {
            self.ensure_client(client_id).await?;
        }
        if let Some(branch_id) = input.branch_id {
            self.ensure_branch(branch_id).await?;
        }
        if let Some(technician_id) = input.technician_id {
            self.ensure_technician(technician_id).await?;
        }
        if let Some(service_type_id) = input.service_type_id {
            self.ensure_service_type(service_type_id).await?;
        }
        if let Some(equipment_id) = input.equipment_id {
            self.ensure_equipment(&[equipment_id]).await?;
        }
        let equipment_ids = input.equipment_ids.as_deref().map(dedupe_ids);
        if let Some(ids) = &equipment_ids {
            self.ensure_equipment(ids).await?;
        }

        // Reject bad signatures before anything is written.
        for payload in [&input.client_signature, &input.technician_signature]
            .into_iter()
            .flatten()
        {
            decode_png_data_uri(payload)?;
        }

        let folio = input.folio.as_deref().map(clean_folio).transpose()?;
        if let Some(folio) = &folio
            && *folio != order.folio
            && self.pool.folio_exists(folio, Some(id)).await?
        {
            return Err(AppError::Conflict(format!("Folio {} already exists", folio)));
        }

        let mut model: service_order::ActiveModel = order.into();
        if let Some(v) = input.client_id {
            model.client_id = Set(v);
        }
        if let Some(v) = input.branch_id {
            model.branch_id = Set(Some(v));
        }
        if let Some(v) = input.equipment_id {
            model.equipment_id = Set(Some(v));
        }
        if let Some(v) = input.technician_id {
            model.technician_id = Set(v);
        }
        if let Some(v) = input.service_type_id {
            model.service_type_id = Set(v);
        }
        if let Some(v) = input.service_date {
            model.service_date = Set(v);
        }
        if let Some(v) = input.order_type {
            model.order_type = Set(Some(v));
        }
        if let Some(v) = input.description {
            model.description = Set(Some(v));
        }
        if let Some(v) = input.work_performed {
            model.work_performed = Set(Some(v));
        }
        if let Some(v) = folio {
            model.folio = Set(v);
        }
        if let Some(v) = input.status {
            model.status = Set(v.as_str().to_string());
        }
        model.last_modified_by = Set(Some(acting_user_id));
        model.updated_at = Set(Utc::now());

        let txn = self.pool.begin().await?;
        model.update(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Folio already exists".to_string())
            } else {
                AppError::Database(format!("Failed to update service order: {}", e))
            }
        })?;
        if let Some(ids) = &equipment_ids {
            replace_assignments(&txn, id, ids).await?;
        }
        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit service order: {}", e)))?;

        if let Some(payload) = &input.client_signature {
            self.attachments
                .save_order_signature(id, payload, SignatureRole::Client, Some(acting_user_id))
                .await?;
        }
        if let Some(payload) = &input.technician_signature {
            self.attachments
                .save_order_signature(id, payload, SignatureRole::Technician, Some(acting_user_id))
                .await?;
        }

        info!(order_id = id, user_id = acting_user_id, "Service order updated");
        self.get(id).await
    }

    /// Load an order and all of its relations.
    pub async fn hydrate(&self, id: i32) -> AppResult<HydratedOrder> {
        let order = self.pool.get_service_order(id).await?;
        let conn = self.pool.connection();

        let client = self.pool.find_client(order.client_id).await?;
        let branch = match order.branch_id {
            Some(branch_id) => self.pool.find_branch(branch_id).await?,
            None => None,
        };
        let technician = self.pool.find_technician(order.technician_id).await?;
        let service_type = self.pool.find_service_type(order.service_type_id).await?;
        let last_modified_by = match order.last_modified_by {
            Some(user_id) => self.pool.find_user(user_id).await?,
            None => None,
        };
        let photos = self.pool.list_photos(order.id).await?;

        let assigned = assigned_equipment_ids(conn, &[order.id])
            .await?
            .remove(&order.id)
            .unwrap_or_default();
        let effective_ids = resolve_effective(assigned, order.equipment_id);

        let mut wanted = effective_ids.clone();
        wanted.extend(order.equipment_id);
        let mut catalog = self.pool.equipment_by_ids(&dedupe_ids(&wanted)).await?;

        let legacy_equipment = order.equipment_id.and_then(|eid| catalog.get(&eid).cloned());
        let equipment = effective_ids
            .iter()
            .filter_map(|eid| catalog.remove(eid))
            .collect();

        Ok(HydratedOrder {
            order,
            client,
            branch,
            legacy_equipment,
            equipment,
            technician,
            service_type,
            last_modified_by,
            photos,
        })
    }

    /// Hydrated order with attachments materialized as data URIs where the files exist.
    pub async fn get(&self, id: i32) -> AppResult<ServiceOrderDetail> {
        let hydrated = self.hydrate(id).await?;

        let client_signature = match &hydrated.order.client_signature {
            Some(key) => Some(self.attachments.materialize(key).await),
            None => None,
        };
        let technician_signature = match &hydrated.order.technician_signature {
            Some(key) => Some(self.attachments.materialize(key).await),
            None => None,
        };

        let mut photos = Vec::with_capacity(hydrated.photos.len());
        for photo in hydrated.photos.iter().cloned() {
            photos.push(self.attachments.photo_view(photo).await);
        }

        let order = hydrated.order;
        Ok(ServiceOrderDetail {
            id: order.id,
            folio: order.folio,
            status: order.status,
            service_date: order.service_date,
            order_type: order.order_type,
            description: order.description,
            work_performed: order.work_performed,
            client: hydrated.client.as_ref().map(client_ref),
            branch: hydrated.branch.map(|b| BranchRef {
                id: b.id,
                name: b.name,
                address: b.address,
            }),
            equipment: hydrated.legacy_equipment.as_ref().map(equipment_ref),
            equipment_list: hydrated.equipment.iter().map(equipment_ref).collect(),
            technician: hydrated.technician.map(|t| NamedRef {
                id: t.id,
                name: t.name,
            }),
            service_type: hydrated.service_type.map(|t| NamedRef {
                id: t.id,
                name: t.name,
            }),
            last_modified_by: hydrated.last_modified_by.map(|u| NamedRef {
                id: u.id,
                name: u.name,
            }),
            client_signature,
            technician_signature,
            photos,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }

    /// Filtered listing, newest first, capped at 1000 rows.
    pub async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<ServiceOrderSummary>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
            && start > end
        {
            return Err(AppError::InvalidInput(
                "start_date must not be after end_date".to_string(),
            ));
        }
        let orders = self.pool.search_service_orders(filter).await?;
        self.summarize(orders).await
    }

    /// Latest 50 orders in a status.
    pub async fn list_by_status(&self, status: OrderStatus) -> AppResult<Vec<ServiceOrderSummary>> {
        let orders = self.pool.list_service_orders_by_status(status).await?;
        self.summarize(orders).await
    }

    /// Every order in the inclusive date range, newest first.
    pub async fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<ServiceOrderSummary>> {
        if start > end {
            return Err(AppError::InvalidInput(
                "start_date must not be after end_date".to_string(),
            ));
        }
        let orders = self.pool.list_service_orders_in_range(start, end).await?;
        self.summarize(orders).await
    }

    /// Remove an order with its assignments and photos, then its stored files.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let order = self.pool.get_service_order(id).await?;
        let photos = self.pool.list_photos(id).await?;

        let txn = self.pool.begin().await?;
        service_order_equipment::Entity::delete_many()
            .filter(service_order_equipment::Column::ServiceOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete assignments: {}", e)))?;
        service_photo::Entity::delete_many()
            .filter(service_photo::Column::ServiceOrderId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete photos: {}", e)))?;
        service_order::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete service order: {}", e)))?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit deletion: {}", e)))?;

        let keys = photos
            .into_iter()
            .map(|p| p.file_key)
            .chain(order.client_signature)
            .chain(order.technician_signature);
        self.attachments.discard_all(keys).await;

        info!(order_id = id, folio = %order.folio, "Service order deleted");
        Ok(())
    }

    pub async fn check_folio(&self, folio: &str, exclude_id: Option<i32>) -> AppResult<FolioCheck> {
        Ok(FolioCheck {
            exists: self.pool.folio_exists(folio, exclude_id).await?,
        })
    }

    /// Up to 10 suggestions labelled `#<folio> - <client>`. Terms shorter than 2 chars yield none.
    pub async fn autocomplete(&self, term: &str) -> AppResult<Vec<AutocompleteItem>> {
        if term.trim().chars().count() < AUTOCOMPLETE_MIN_CHARS {
            return Ok(Vec::new());
        }

        let orders = self.pool.autocomplete_service_orders(term).await?;
        let summaries = self.summarize(orders).await?;

        Ok(summaries
            .into_iter()
            .map(|s| AutocompleteItem {
                id: s.id,
                label: format!(
                    "#{} - {}",
                    s.folio,
                    s.client.as_ref().map(|c| c.name.as_str()).unwrap_or("Sin cliente")
                ),
                subtitle: s
                    .equipment
                    .first()
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| s.status.clone()),
            })
            .collect())
    }

    /// Up to 10 distinct client names among clients with orders.
    pub async fn autocomplete_clients(&self, term: &str) -> AppResult<Vec<String>> {
        if term.trim().chars().count() < AUTOCOMPLETE_MIN_CHARS {
            return Ok(Vec::new());
        }
        self.pool.autocomplete_client_names(term).await
    }

    /// Orders referencing an equipment item, newest first.
    pub async fn equipment_history(&self, equipment_id: i32) -> AppResult<Vec<ServiceOrderSummary>> {
        if self.pool.find_equipment(equipment_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Equipment {}", equipment_id)));
        }
        let orders = self.dependent_orders(equipment_id).await?;
        self.summarize(orders).await
    }

    /// Preview of what a forced equipment deletion would remove.
    pub async fn equipment_dependents(&self, equipment_id: i32) -> AppResult<DependentOrders> {
        if self.pool.find_equipment(equipment_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Equipment {}", equipment_id)));
        }
        let summaries = self
            .summarize(self.dependent_orders(equipment_id).await?)
            .await?;

        Ok(DependentOrders {
            count: summaries.len() as u64,
            service_orders: summaries
                .into_iter()
                .map(|s| DependentOrder {
                    id: s.id,
                    folio: s.folio,
                    service_date: s.service_date,
                    status: s.status,
                    client: s.client.map(|c| c.name),
                    branch: s.branch_name,
                    technician: s.technician_name,
                })
                .collect(),
        })
    }

    async fn dependent_orders(&self, equipment_id: i32) -> AppResult<Vec<service_order::Model>> {
        let ids = dependent_order_ids(self.pool.connection(), equipment_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        service_order::Entity::find()
            .filter(service_order::Column::Id.is_in(ids))
            .order_by_desc(service_order::Column::ServiceDate)
            .order_by_desc(service_order::Column::Id)
            .all(self.pool.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load service orders: {}", e)))
    }

    /// Attach display names and effective equipment to a batch of orders.
    pub async fn summarize(
        &self,
        orders: Vec<service_order::Model>,
    ) -> AppResult<Vec<ServiceOrderSummary>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let client_ids: Vec<i32> = unique(orders.iter().map(|o| o.client_id));
        let branch_ids: Vec<i32> = unique(orders.iter().filter_map(|o| o.branch_id));
        let technician_ids: Vec<i32> = unique(orders.iter().map(|o| o.technician_id));

        let clients = self.pool.clients_by_ids(&client_ids).await?;
        let branches = self.pool.branches_by_ids(&branch_ids).await?;
        let technicians = self.pool.technicians_by_ids(&technician_ids).await?;
        let service_types: HashMap<i32, String> = self
            .pool
            .list_service_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let mut assigned = assigned_equipment_ids(self.pool.connection(), &order_ids).await?;
        let effective: HashMap<i32, Vec<i32>> = orders
            .iter()
            .map(|o| {
                (
                    o.id,
                    resolve_effective(assigned.remove(&o.id).unwrap_or_default(), o.equipment_id),
                )
            })
            .collect();
        let equipment_ids = unique(effective.values().flatten().copied());
        let catalog = self.pool.equipment_by_ids(&equipment_ids).await?;

        debug!(count = orders.len(), "Summarizing service orders");

        Ok(orders
            .into_iter()
            .map(|order| {
                let equipment = effective
                    .get(&order.id)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|eid| catalog.get(eid))
                            .map(equipment_ref)
                            .collect()
                    })
                    .unwrap_or_default();

                ServiceOrderSummary {
                    id: order.id,
                    client: clients.get(&order.client_id).map(client_ref),
                    branch_name: order
                        .branch_id
                        .and_then(|bid| branches.get(&bid))
                        .map(|b| b.name.clone()),
                    technician_name: technicians.get(&order.technician_id).map(|t| t.name.clone()),
                    service_type_name: service_types.get(&order.service_type_id).cloned(),
                    equipment,
                    folio: order.folio,
                    status: order.status,
                    service_date: order.service_date,
                    work_performed: order.work_performed,
                }
            })
            .collect())
    }

    async fn ensure_user(&self, id: i32) -> AppResult<()> {
        match self.pool.find_user(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Unauthorized(format!("Unknown user {}", id))),
        }
    }

    async fn ensure_client(&self, id: i32) -> AppResult<()> {
        match self.pool.find_client(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Client {}", id))),
        }
    }

    async fn ensure_branch(&self, id: i32) -> AppResult<()> {
        match self.pool.find_branch(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Branch {}", id))),
        }
    }

    async fn ensure_technician(&self, id: i32) -> AppResult<()> {
        match self.pool.find_technician(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Technician {}", id))),
        }
    }

    async fn ensure_service_type(&self, id: i32) -> AppResult<()> {
        match self.pool.find_service_type(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Service type {}", id))),
        }
    }

    async fn ensure_equipment(&self, ids: &[i32]) -> AppResult<()> {
        let found = self.pool.equipment_by_ids(ids).await?;
        match ids.iter().find(|id| !found.contains_key(id)) {
            Some(missing) => Err(AppError::NotFound(format!("Equipment {}", missing))),
            None => Ok(()),
        }
    }
}

fn unique(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}
