//! Domain model and HTTP request/response bodies
//!
//! `checkout` holds the domain types; `requests` and `responses` define the
//! DTOs (Data Transfer Objects) serialized over HTTP.

pub mod checkout;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use checkout::{
    normalize_currency, now_micros, truncate_to_micros, Checkout, CheckoutStatus, NewCheckout,
};
pub use requests::{CreateCheckoutRequest, ListCheckoutsParams, UpdateStatusRequest};
pub use responses::{DeleteResponse, ErrorResponse, HealthResponse, StatsResponse};
