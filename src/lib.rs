//! ICEMAS field-service server library.
//!
//! Service orders with auto-allocated folios, multi-equipment assignment,
//! signature and photo attachments, and printable PDF documents, exposed
//! over an actix-web API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
