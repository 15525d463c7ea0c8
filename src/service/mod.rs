//! Service Module
//!
//! The listing service and the per-tenant guards it serializes access with.

mod listing;
mod locks;

pub use listing::{
    CheckoutPage, ListQuery, ListingService, DEFAULT_LIMIT, MAX_ID_LENGTH, MAX_LIMIT,
};
pub use locks::TenantLocks;
