//! Database queries for service orders.

use chrono::NaiveDate;
use sea_orm::sea_query::{Alias, Expr, Func, IntoColumnRef, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entity::service_order::{self, Entity as ServiceOrder};
use crate::entity::{branch, client, equipment, service_order_equipment};
use crate::error::{AppError, AppResult};
use crate::models::{OrderFilter, OrderStatus};

use super::DbPool;

/// Row cap for filtered listings.
pub const LIST_LIMIT: u64 = 1000;

/// Row cap for per-status listings.
pub const STATUS_LIST_LIMIT: u64 = 50;

pub const AUTOCOMPLETE_LIMIT: u64 = 10;

/// Case-insensitive substring match.
fn contains_ci<C: IntoColumnRef>(col: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(format!("%{}%", needle.trim().to_lowercase()))
}

fn client_ids_named(needle: &str) -> SelectStatement {
    Query::select()
        .column(client::Column::Id)
        .from(client::Entity)
        .and_where(contains_ci(client::Column::Name, needle))
        .to_owned()
}

fn branch_ids_named(needle: &str) -> SelectStatement {
    Query::select()
        .column(branch::Column::Id)
        .from(branch::Entity)
        .and_where(contains_ci(branch::Column::Name, needle))
        .to_owned()
}

fn equipment_ids_matching(col: equipment::Column, needle: &str) -> SelectStatement {
    Query::select()
        .column(equipment::Column::Id)
        .from(equipment::Entity)
        .and_where(contains_ci(col, needle))
        .to_owned()
}

/// Orders whose legacy link or assignment rows point at equipment matching `needle` on `col`.
fn equipment_condition(col: equipment::Column, needle: &str) -> Condition {
    let assigned = Query::select()
        .column(service_order_equipment::Column::ServiceOrderId)
        .from(service_order_equipment::Entity)
        .and_where(
            service_order_equipment::Column::EquipmentId
                .in_subquery(equipment_ids_matching(col, needle)),
        )
        .to_owned();

    Condition::any()
        .add(service_order::Column::EquipmentId.in_subquery(equipment_ids_matching(col, needle)))
        .add(service_order::Column::Id.in_subquery(assigned))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Translate list filters into a single condition.
fn filter_condition(filter: &OrderFilter) -> Condition {
    let mut cond = Condition::all();

    if let Some(id) = filter.id {
        cond = cond.add(service_order::Column::Id.eq(id));
    }

    match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) => {
            cond = cond.add(service_order::Column::ServiceDate.between(start, end));
        }
        (Some(start), None) => cond = cond.add(service_order::Column::ServiceDate.gte(start)),
        (None, Some(end)) => cond = cond.add(service_order::Column::ServiceDate.lte(end)),
        (None, None) => {}
    }

    if let Some(name) = non_blank(&filter.client) {
        cond = cond.add(service_order::Column::ClientId.in_subquery(client_ids_named(name)));
    }

    if let Some(name) = non_blank(&filter.equipment) {
        cond = cond.add(equipment_condition(equipment::Column::Name, name));
    }

    if let Some(serial) = non_blank(&filter.serial) {
        cond = cond.add(equipment_condition(equipment::Column::Serial, serial));
    }

    if let Some(status) = filter.status {
        cond = cond.add(service_order::Column::Status.eq(status.as_str()));
    }

    if let Some(term) = non_blank(&filter.search) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(service_order::Column::Folio, term))
                .add(service_order::Column::ClientId.in_subquery(client_ids_named(term)))
                .add(service_order::Column::BranchId.in_subquery(branch_ids_named(term)))
                .add(equipment_condition(equipment::Column::Name, term))
                .add(equipment_condition(equipment::Column::Serial, term))
                .add(contains_ci(service_order::Column::WorkPerformed, term)),
        );
    }

    cond
}

impl DbPool {
    pub async fn find_service_order(&self, id: i32) -> AppResult<Option<service_order::Model>> {
        ServiceOrder::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get service order: {}", e)))
    }

    /// Like [`find_service_order`](Self::find_service_order) but missing rows are `NotFound`.
    pub async fn get_service_order(&self, id: i32) -> AppResult<service_order::Model> {
        self.find_service_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service order {}", id)))
    }

    /// Filtered listing, newest service date first, capped at [`LIST_LIMIT`].
    pub async fn search_service_orders(
        &self,
        filter: &OrderFilter,
    ) -> AppResult<Vec<service_order::Model>> {
        ServiceOrder::find()
            .filter(filter_condition(filter))
            .order_by_desc(service_order::Column::ServiceDate)
            .order_by_desc(service_order::Column::Id)
            .limit(LIST_LIMIT)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list service orders: {}", e)))
    }

    pub async fn list_service_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> AppResult<Vec<service_order::Model>> {
        ServiceOrder::find()
            .filter(service_order::Column::Status.eq(status.as_str()))
            .order_by_desc(service_order::Column::ServiceDate)
            .order_by_desc(service_order::Column::Id)
            .limit(STATUS_LIST_LIMIT)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list service orders: {}", e)))
    }

    /// Every order with a service date inside the inclusive range. Uncapped.
    pub async fn list_service_orders_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<service_order::Model>> {
        ServiceOrder::find()
            .filter(service_order::Column::ServiceDate.between(start, end))
            .order_by_desc(service_order::Column::ServiceDate)
            .order_by_desc(service_order::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list service orders: {}", e)))
    }

    pub async fn folio_exists(&self, folio: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let mut query = ServiceOrder::find().filter(service_order::Column::Folio.eq(folio.trim()));
        if let Some(exclude_id) = exclude_id {
            query = query.filter(service_order::Column::Id.ne(exclude_id));
        }

        let count = query
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check folio: {}", e)))?;
        Ok(count > 0)
    }

    /// Orders matching `term` by folio, id digits, client name or equipment name.
    pub async fn autocomplete_service_orders(
        &self,
        term: &str,
    ) -> AppResult<Vec<service_order::Model>> {
        let term = term.trim();
        let mut cond = Condition::any()
            .add(contains_ci(service_order::Column::Folio, term))
            .add(service_order::Column::ClientId.in_subquery(client_ids_named(term)))
            .add(equipment_condition(equipment::Column::Name, term));

        if !term.is_empty() && term.bytes().all(|b| b.is_ascii_digit()) {
            cond = cond.add(
                Expr::expr(Expr::col(service_order::Column::Id).cast_as(Alias::new("TEXT")))
                    .like(format!("%{}%", term)),
            );
        }

        ServiceOrder::find()
            .filter(cond)
            .order_by_desc(service_order::Column::ServiceDate)
            .order_by_desc(service_order::Column::Id)
            .limit(AUTOCOMPLETE_LIMIT)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to search service orders: {}", e)))
    }

    /// Distinct names of clients that have orders, matching `term`.
    pub async fn autocomplete_client_names(&self, term: &str) -> AppResult<Vec<String>> {
        let with_orders = Query::select()
            .column(service_order::Column::ClientId)
            .from(ServiceOrder)
            .to_owned();

        client::Entity::find()
            .select_only()
            .column(client::Column::Name)
            .distinct()
            .filter(contains_ci(client::Column::Name, term))
            .filter(client::Column::Id.in_subquery(with_orders))
            .order_by_asc(client::Column::Name)
            .limit(AUTOCOMPLETE_LIMIT)
            .into_tuple()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to search client names: {}", e)))
    }
}
