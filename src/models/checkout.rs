//! Checkout domain model
//!
//! Defines the checkout record, its status lifecycle and the input used to
//! create one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

// == Checkout Status ==
/// Lifecycle state of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus {
    Initiated,
    Completed,
    Cancelled,
}

impl CheckoutStatus {
    /// Returns the lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStatus::Initiated => "initiated",
            CheckoutStatus::Completed => "completed",
            CheckoutStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a checkout in this state may move to `next`.
    ///
    /// Only `initiated` checkouts can be completed or cancelled.
    pub fn can_transition_to(&self, next: CheckoutStatus) -> bool {
        matches!(
            (self, next),
            (CheckoutStatus::Initiated, CheckoutStatus::Completed)
                | (CheckoutStatus::Initiated, CheckoutStatus::Cancelled)
        )
    }
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckoutStatus {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(CheckoutStatus::Initiated),
            "completed" => Ok(CheckoutStatus::Completed),
            "cancelled" => Ok(CheckoutStatus::Cancelled),
            other => Err(CheckoutError::InvalidInput(format!(
                "Unknown checkout status '{}'",
                other
            ))),
        }
    }
}

// == Checkout ==
/// A single checkout attempt owned by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    /// Identifier, unique within the tenant
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    pub cart_id: String,
    pub customer_id: String,
    pub status: CheckoutStatus,
    /// ISO 4217 currency code, upper case
    pub currency: String,
    /// Creation time, truncated to microseconds; the listing sort key
    pub created_at: DateTime<Utc>,
    /// Last mutation time, never moves backwards
    pub updated_at: DateTime<Utc>,
}

// == New Checkout ==
/// Caller input for creating a checkout.
///
/// `id` is optional; a time-ordered UUID is assigned when absent.
#[derive(Debug, Clone, Default)]
pub struct NewCheckout {
    pub tenant_id: String,
    pub id: Option<String>,
    pub cart_id: String,
    pub customer_id: String,
    pub currency: String,
}

// == Utility Functions ==
/// Returns the current UTC time truncated to microsecond precision.
///
/// Everything stored or encoded in a cursor goes through this so that
/// round trips through the cursor codec are exact.
pub fn now_micros() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}

/// Drops any sub-microsecond precision from `ts`.
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

/// Normalizes and validates an ISO 4217 style currency code.
pub fn normalize_currency(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}
