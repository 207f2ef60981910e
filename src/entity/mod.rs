//! SeaORM entity definitions for the relational store.

pub mod brand;
pub mod branch;
pub mod client;
pub mod equipment;
pub mod service_order;
pub mod service_order_equipment;
pub mod service_photo;
pub mod service_type;
pub mod technician;
pub mod user;
