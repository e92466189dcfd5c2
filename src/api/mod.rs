//! API clients
//!
//! - Catalog: video list served by the hlsdeck proxy

pub mod catalog;

pub use catalog::{CatalogClient, CatalogError};
