//! Data models exchanged with the CleanSwipe purchase backend.

use serde::{Deserialize, Serialize};

pub mod filter;
pub mod tracker;

/// Signed envelope wrapping every API response body.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedEnvelope {
    /// Base64-encoded JSON payload.
    pub data: String,
    /// Base64-encoded ECDSA signature over the decoded payload bytes.
    pub signature: String,
}

/// Payload returned by the entitlements endpoint.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementsData {
    /// Echo of the device the backend resolved the customer from.
    pub device_id: String,
    /// Server timestamp of the response, seconds since the epoch.
    pub timestamp: u64,
    #[serde(default)]
    pub entitlements: Vec<Entitlement>,
}

/// A named grant from the purchase backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    /// Entitlement identifier, e.g. `premium`.
    pub id: String,
    /// Whether the grant currently confers access.
    pub active: bool,
    /// Whether the underlying subscription is a trial or a paid period.
    pub period_type: PeriodType,
    /// False once the user has turned off auto-renew; access continues
    /// until the paid period lapses.
    #[serde(default = "default_true")]
    pub will_renew: bool,
    /// Timestamp of when the grant expires. If null then it is lifetime.
    pub expires: Option<u64>,
}

fn default_true() -> bool {
    true
}

/// Period type of an entitlement's underlying subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Trial,
    Normal,
}

/// The set of entitlements held by the current customer.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct CustomerEntitlements {
    pub entitlements: Vec<Entitlement>,
}

impl CustomerEntitlements {
    /// Looks up an entitlement by identifier.
    pub fn find(&self, id: &str) -> Option<&Entitlement> {
        self.entitlements.iter().find(|e| e.id == id)
    }
}

/// Payload returned by the checkout endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutData {
    /// Web checkout page to open in the user's browser.
    pub checkout_url: String,
}
