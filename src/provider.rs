//! Purchase backend boundary.
//!
//! The tracker only ever talks to an [`EntitlementProvider`]. Production
//! builds inject [`Api`](crate::Api); development builds that ship without
//! a backend inject [`TrialProvider`], which simulates a date-based trial.

use std::cell::RefCell;

use chrono::{DateTime, Duration, Utc};

use crate::errors::{PurchaseError, SdkError};
use crate::store::{keys, SwipeStore};
use crate::structs::{CustomerEntitlements, Entitlement, PeriodType};

/// Outcome of a purchase or restore flow.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    /// The flow completed and these are the customer's entitlements now.
    Success(CustomerEntitlements),
    /// The user backed out; not an error.
    Cancelled,
    /// The flow failed for the given reason.
    Failed(PurchaseError),
}

/// Remote purchase/entitlement backend.
pub trait EntitlementProvider {
    /// Fetches the entitlements of the current customer identity.
    fn fetch_entitlements(&self) -> Result<CustomerEntitlements, SdkError>;

    /// Runs the purchase flow for `product_id`, blocking until it
    /// completes, is cancelled, or fails.
    fn purchase(&self, product_id: &str) -> PurchaseOutcome;

    /// Restores previously purchased entitlements.
    fn restore(&self) -> PurchaseOutcome;
}

/// Stand-in provider that simulates a trial window anchored to the first
/// launch instead of contacting a purchase backend. The anchor persists
/// under [`keys::TRIAL_START_DATE`] so the trial survives restarts.
pub struct TrialProvider<S: SwipeStore> {
    store: RefCell<S>,
    entitlement_id: String,
    trial_days: i64,
}

impl<S: SwipeStore> TrialProvider<S> {
    pub fn new(store: S, entitlement_id: &str, trial_days: i64) -> Self {
        Self {
            store: RefCell::new(store),
            entitlement_id: entitlement_id.to_string(),
            trial_days,
        }
    }

    /// Returns the persisted trial anchor, writing one on first call.
    /// An unparseable stored value re-anchors the trial.
    fn trial_start(&self) -> DateTime<Utc> {
        let mut store = self.store.borrow_mut();

        if let Some(raw) = store.get(keys::TRIAL_START_DATE) {
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(parsed) => return parsed.with_timezone(&Utc),
                Err(err) => {
                    tracing::debug!("stored trial start did not parse, re-anchoring: {err}");
                }
            }
        }

        let now = Utc::now();
        if let Err(err) = store.set(keys::TRIAL_START_DATE, &now.to_rfc3339()) {
            tracing::warn!("failed to persist trial start: {err}");
        }
        now
    }
}

impl<S: SwipeStore> EntitlementProvider for TrialProvider<S> {
    fn fetch_entitlements(&self) -> Result<CustomerEntitlements, SdkError> {
        let started = self.trial_start();
        let expires_at = started + Duration::days(self.trial_days);
        let active = Utc::now() < expires_at;

        Ok(CustomerEntitlements {
            entitlements: vec![Entitlement {
                id: self.entitlement_id.clone(),
                active,
                period_type: PeriodType::Trial,
                will_renew: false,
                expires: u64::try_from(expires_at.timestamp()).ok(),
            }],
        })
    }

    fn purchase(&self, _product_id: &str) -> PurchaseOutcome {
        PurchaseOutcome::Failed(PurchaseError::Unknown(
            "purchases are not available in this build".to_string(),
        ))
    }

    fn restore(&self) -> PurchaseOutcome {
        match self.fetch_entitlements() {
            Ok(entitlements) => PurchaseOutcome::Success(entitlements),
            Err(err) => PurchaseOutcome::Failed(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn first_fetch_anchors_the_trial() {
        let provider = TrialProvider::new(MemoryStore::new(), "premium", 3);

        let customer = provider.fetch_entitlements().unwrap();
        let entitlement = customer.find("premium").unwrap();
        assert!(entitlement.active);
        assert_eq!(entitlement.period_type, PeriodType::Trial);

        // The anchor must have been written.
        assert!(provider
            .store
            .borrow()
            .get(keys::TRIAL_START_DATE)
            .is_some());
    }

    #[test]
    fn trial_expires_after_the_window() {
        let mut store = MemoryStore::new();
        let long_ago = (Utc::now() - Duration::days(30)).to_rfc3339();
        store.set(keys::TRIAL_START_DATE, &long_ago).unwrap();

        let provider = TrialProvider::new(store, "premium", 3);
        let customer = provider.fetch_entitlements().unwrap();
        assert!(!customer.find("premium").unwrap().active);
    }

    #[test]
    fn unparseable_anchor_restarts_the_trial() {
        let mut store = MemoryStore::new();
        store.set(keys::TRIAL_START_DATE, "last tuesday").unwrap();

        let provider = TrialProvider::new(store, "premium", 3);
        let customer = provider.fetch_entitlements().unwrap();
        assert!(customer.find("premium").unwrap().active);
    }
}
