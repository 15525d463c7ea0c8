//! API Module
//!
//! HTTP handlers and routing exposing the listing service as a REST API.
//!
//! # Endpoints
//! - `POST /tenants/:tenant/checkouts` - Create a checkout
//! - `GET /tenants/:tenant/checkouts` - List checkouts (`cursor`, `status`, `currency`, `limit`)
//! - `GET /tenants/:tenant/checkouts/:id` - Fetch a checkout
//! - `PATCH /tenants/:tenant/checkouts/:id` - Update a checkout's status
//! - `DELETE /tenants/:tenant/checkouts/:id` - Delete a checkout
//! - `GET /stats` - List cache statistics
//! - `GET /health` - Health check endpoint

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use handlers::*;
pub use routes::create_router;
