//! Service order lifecycle test suite.
//!
//! Runs against an in-memory SQLite database and a temp-dir blob store, so
//! nothing external is required.
//!
//! Run with: cargo test --test lifecycle

mod helpers;

mod test_api;
mod test_assignments;
mod test_attachments;
mod test_documents;
mod test_folio;
mod test_orders;
mod test_service_types;
