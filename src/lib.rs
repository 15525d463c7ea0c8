//! Checkout Listing - tenant-scoped checkout listing service
//!
//! Serves cursor-paginated checkout listings through a short-lived read
//! cache that every mutation invalidates for its tenant.

pub mod api;
pub mod cache;
pub mod config;
pub mod cursor;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, CheckoutError};
pub use service::{CheckoutPage, ListQuery, ListingService};
pub use tasks::spawn_cleanup_task;
