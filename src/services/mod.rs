//! Business logic layer.

pub mod assignments;
pub mod attachments;
pub mod folio;
pub mod orders;
pub mod pdf;
pub mod service_types;
pub mod storage;

pub use attachments::AttachmentManager;
pub use orders::OrderService;
pub use pdf::DocumentComposer;
pub use service_types::ServiceTypeService;
pub use storage::{BlobStore, LocalStorage, S3Storage, SharedBlobStore};
