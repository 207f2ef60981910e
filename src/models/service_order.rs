//! Service order domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::attachment::PhotoView;

/// Work order status.
///
/// Transitions are not enforced; any of the four values may be set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Proceso")]
    InProgress,
    #[serde(rename = "Completado")]
    Completed,
    #[serde(rename = "Cancelado")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Proceso",
            Self::Completed => "Completado",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Parse the stored/display form. Also accepts the URL-friendly
    /// `en-proceso` spelling used by the status routes.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == normalized)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for creating a service order.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateServiceOrder {
    pub client_id: i32,
    #[serde(default)]
    pub branch_id: Option<i32>,
    /// Legacy single-equipment link
    #[serde(default)]
    pub equipment_id: Option<i32>,
    /// Equipment present on the order
    #[serde(default)]
    pub equipment_ids: Option<Vec<i32>>,
    pub technician_id: i32,
    pub service_type_id: i32,
    pub service_date: NaiveDate,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub work_performed: Option<String>,
    /// Allocated automatically when absent
    #[serde(default)]
    pub folio: Option<String>,
    pub status: OrderStatus,
}

/// Request body for a partial update.
///
/// `equipment_ids` distinguishes "absent" (leave assignments alone) from
/// an empty list (clear all assignments). Signature fields must be PNG data URIs.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateServiceOrder {
    pub client_id: Option<i32>,
    pub branch_id: Option<i32>,
    pub equipment_id: Option<i32>,
    pub equipment_ids: Option<Vec<i32>>,
    pub technician_id: Option<i32>,
    pub service_type_id: Option<i32>,
    pub service_date: Option<NaiveDate>,
    pub order_type: Option<String>,
    pub description: Option<String>,
    pub work_performed: Option<String>,
    pub folio: Option<String>,
    pub status: Option<OrderStatus>,
    pub client_signature: Option<String>,
    pub technician_signature: Option<String>,
}

/// Query filters for listing orders. Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Client name
    pub client: Option<String>,
    /// Equipment name
    pub equipment: Option<String>,
    /// Equipment serial number
    pub serial: Option<String>,
    pub status: Option<OrderStatus>,
    /// Free text over folio, client, branch, equipment and work narrative
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FolioCheckParams {
    pub folio: String,
    pub exclude_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FolioCheck {
    pub exists: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AutocompleteParams {
    pub term: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutocompleteItem {
    pub id: i32,
    pub label: String,
    pub subtitle: String,
}

/// Inclusive date range for the tabular report.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientRef {
    pub id: i32,
    pub name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BranchRef {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentRef {
    pub id: i32,
    pub name: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub brand: Option<String>,
}

/// Fully hydrated order. Signature and photo fields carry a base64 data URI
/// when the stored file exists, otherwise the bare storage key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceOrderDetail {
    pub id: i32,
    pub folio: String,
    pub status: String,
    pub service_date: NaiveDate,
    pub order_type: Option<String>,
    pub description: Option<String>,
    pub work_performed: Option<String>,
    pub client: Option<ClientRef>,
    pub branch: Option<BranchRef>,
    /// Legacy single-equipment link
    pub equipment: Option<EquipmentRef>,
    /// Effective equipment list
    pub equipment_list: Vec<EquipmentRef>,
    pub technician: Option<NamedRef>,
    pub service_type: Option<NamedRef>,
    pub last_modified_by: Option<NamedRef>,
    pub client_signature: Option<String>,
    pub technician_signature: Option<String>,
    pub photos: Vec<PhotoView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceOrderSummary {
    pub id: i32,
    pub folio: String,
    pub status: String,
    pub service_date: NaiveDate,
    pub client: Option<ClientRef>,
    pub branch_name: Option<String>,
    pub technician_name: Option<String>,
    pub service_type_name: Option<String>,
    pub equipment: Vec<EquipmentRef>,
    pub work_performed: Option<String>,
}
