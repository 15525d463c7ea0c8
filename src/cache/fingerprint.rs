//! Query Fingerprint Module
//!
//! Derives a deterministic cache key from the full shape of a list query.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::models::CheckoutStatus;

/// Bumped whenever the canonical encoding below changes.
const FINGERPRINT_SCHEME: &str = "checkout-list/v1";

// == Fingerprint ==
/// Cache key for one list query.
///
/// The digest covers every query parameter; the tenant is also kept in the
/// clear so caches can partition and invalidate by tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    tenant_id: String,
    digest: String,
}

impl Fingerprint {
    // == Constructor ==
    /// Fingerprints a normalized list query.
    ///
    /// Every field is length-prefixed, and absent filters are tagged apart
    /// from present ones, so no two distinct queries share an encoding.
    pub fn new(
        tenant_id: &str,
        cursor: Option<&str>,
        status: Option<CheckoutStatus>,
        currency: Option<&str>,
        limit: usize,
    ) -> Self {
        let mut hasher = Sha256::new();
        write_field(&mut hasher, Some(FINGERPRINT_SCHEME));
        write_field(&mut hasher, Some(tenant_id));
        write_field(&mut hasher, cursor);
        write_field(&mut hasher, status.map(|s| s.as_str()));
        write_field(&mut hasher, currency);
        hasher.update((limit as u64).to_be_bytes());

        Self {
            tenant_id: tenant_id.to_string(),
            digest: hex::encode(hasher.finalize()),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Hex-encoded SHA-256 digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tenant_id, &self.digest[..12])
    }
}

fn write_field(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            hasher.update((v.len() as u64).to_be_bytes());
            hasher.update(v.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}
