//! Domain models and DTOs for the field-service API.

pub mod attachment;
pub mod equipment;
pub mod service_order;
pub mod service_type;

pub use attachment::{PhotoCategory, PhotoView, SignatureRequest, SignatureRole, SignatureSaved};
pub use equipment::{DependentOrder, DependentOrders, EquipmentDeletion, EquipmentDeleteParams};
pub use service_order::{
    AutocompleteItem, AutocompleteParams, BranchRef, ClientRef, CreateServiceOrder, EquipmentRef,
    FolioCheck, FolioCheckParams, NamedRef, OrderFilter, OrderStatus, ReportParams,
    ServiceOrderDetail, ServiceOrderSummary, UpdateServiceOrder,
};
pub use service_type::{CreateServiceType, NameCheck, NameCheckParams, ServiceType, UpdateServiceType};
