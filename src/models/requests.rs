//! Request DTOs for the checkout listing API
//!
//! Defines the structure of incoming request bodies and query strings.

use serde::Deserialize;

use super::NewCheckout;
use crate::error::{CheckoutError, Result};
use crate::models::CheckoutStatus;
use crate::service::ListQuery;

/// Request body for `POST /tenants/:tenant/checkouts`
///
/// The tenant comes from the path; `id` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub cart_id: String,
    pub customer_id: String,
    pub currency: String,
}

impl CreateCheckoutRequest {
    /// Combines the body with the tenant taken from the path.
    pub fn into_new_checkout(self, tenant_id: String) -> NewCheckout {
        NewCheckout {
            tenant_id,
            id: self.id,
            cart_id: self.cart_id,
            customer_id: self.customer_id,
            currency: self.currency,
        }
    }
}

/// Query string of `GET /tenants/:tenant/checkouts`
///
/// Everything is taken as raw text so bad values surface as the service's
/// own `InvalidInput` errors rather than extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCheckoutsParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl ListCheckoutsParams {
    /// Parses the raw parameters into a [`ListQuery`] for `tenant_id`.
    pub fn into_query(self, tenant_id: String) -> Result<ListQuery> {
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<CheckoutStatus>()?),
            None => None,
        };
        let limit = match self.limit.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
                CheckoutError::InvalidInput(format!("limit must be an integer, got '{}'", raw))
            })?),
            None => None,
        };

        Ok(ListQuery {
            tenant_id,
            cursor: self.cursor,
            status,
            currency: self.currency,
            limit,
        })
    }
}

/// Request body for `PATCH /tenants/:tenant/checkouts/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CheckoutStatus,
}
