//! Live catalog of restaurants and products
//!
//! The catalog is what checkout re-reads when it guards against stale cart
//! snapshots: carts copy from it at add-time, checkout consults it again at
//! order time.

mod service;

pub use service::{CatalogService, ProductState};
