//! Equipment deletion DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EquipmentDeleteParams {
    /// Also delete every dependent service order
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentDeletion {
    pub deleted: bool,
    pub service_orders_deleted: u64,
}

/// An order that references an equipment item, by legacy link or assignment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DependentOrder {
    pub id: i32,
    pub folio: String,
    pub service_date: NaiveDate,
    pub status: String,
    pub client: Option<String>,
    pub branch: Option<String>,
    pub technician: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DependentOrders {
    pub count: u64,
    pub service_orders: Vec<DependentOrder>,
}
