//! Official Rust SDK for CleanSwipe entitlements.
//!
//! Wires the swipe-quota and ad-cadence tracker to a purchase backend and
//! a durable key/value store, both injected as traits:
//!
//! ```no_run
//! use cleanswipe_client::{
//!     Api, ApiOptions, EntitlementTracker, FileStore, PhotoFilter, TrackerOptions,
//! };
//!
//! let api = Api::new(ApiOptions {
//!     app_id: "00000000-0000-0000-0000-000000000000".to_string(),
//!     signing_key: "MFk...".to_string(),
//! })
//! .unwrap();
//!
//! let store = FileStore::open("cleanswipe.json");
//! let mut tracker = EntitlementTracker::new(store, api, TrackerOptions::default());
//!
//! tracker.check_subscription_status();
//!
//! let filter = PhotoFilter::Screenshots;
//! if tracker.can_swipe_for_filter(&filter) {
//!     tracker.record_swipe(&filter);
//! }
//! if tracker.should_show_ad() {
//!     // present the interstitial, then:
//!     tracker.reset_ad_counter();
//! }
//! ```

pub mod api;
pub mod errors;
pub mod provider;
pub mod store;
pub mod structs;

pub use api::{Api, ApiOptions};
pub use errors::{PurchaseError, SdkError};
pub use provider::{EntitlementProvider, PurchaseOutcome, TrialProvider};
pub use store::{FileStore, MemoryStore, SwipeStore};
pub use structs::filter::PhotoFilter;
pub use structs::tracker::{
    EntitlementTracker, PurchaseState, SubscriptionStatus, TrackerOptions,
};
pub use structs::{CustomerEntitlements, Entitlement, PeriodType};

#[cfg(test)]
mod tests;
