//! The swipe-entitlement and ad-cadence tracker.
//!
//! One tracker instance owns the subscription status, the day-scoped swipe
//! counters, the rewarded-credit balance and the ad-cadence countdown.
//! All mutation goes through `&mut self`, so a single owner is the only
//! writer; wrap the tracker externally if it must cross threads.

use std::collections::HashMap;

use chrono::Local;
use tracing::{debug, warn};

use crate::errors::PurchaseError;
use crate::provider::{EntitlementProvider, PurchaseOutcome};
use crate::store::{keys, SwipeStore};
use crate::structs::filter::PhotoFilter;
use crate::structs::{CustomerEntitlements, PeriodType};

/// Subscription standing derived from the latest entitlement query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionStatus {
    #[default]
    NotSubscribed,
    Trial,
    Active,
    /// Auto-renew turned off; access continues until the period lapses.
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Trial, active and cancelled subscriptions all keep premium access.
    pub fn is_premium(&self) -> bool {
        matches!(self, Self::Trial | Self::Active | Self::Cancelled)
    }
}

/// Observable state of the most recent purchase or restore flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PurchaseState {
    #[default]
    Idle,
    Purchasing,
    Restoring,
    Completed,
    Failed(PurchaseError),
}

/// Tracker configuration. `Default` matches the free-tier build.
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Free swipes per filter per calendar day.
    pub daily_swipe_limit: u32,
    /// Swipes between interstitial ads for non-premium users.
    pub swipes_between_ads: u32,
    /// Entitlement that unlocks unlimited swipes.
    pub premium_entitlement_id: String,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            daily_swipe_limit: 10,
            swipes_between_ads: 5,
            premium_entitlement_id: "premium".to_string(),
        }
    }
}

/// Swipe-quota, rewarded-credit and ad-cadence bookkeeping, persisted
/// through an injected [`SwipeStore`].
///
/// The tracker is advisory: `record_swipe` never rejects a call. The UI is
/// expected to gate swipes on [`can_swipe_for_filter`](Self::can_swipe_for_filter)
/// and ads on [`should_show_ad`](Self::should_show_ad).
pub struct EntitlementTracker<S: SwipeStore, P: EntitlementProvider> {
    store: S,
    provider: P,
    options: TrackerOptions,

    status: SubscriptionStatus,
    purchase_state: PurchaseState,

    /// Unified day stamp covering all three counters below.
    usage_date: String,
    daily_count: u32,
    filter_counts: HashMap<String, u32>,
    rewarded_remaining: u32,

    ad_countdown: u32,
    ad_cycle_completed: bool,

    last_filter: Option<PhotoFilter>,
    can_swipe: bool,
}

impl<S: SwipeStore, P: EntitlementProvider> EntitlementTracker<S, P> {
    /// Creates a tracker and loads the persisted counters, rolling them
    /// over if the stored day stamp is not today.
    pub fn new(store: S, provider: P, options: TrackerOptions) -> Self {
        let ad_countdown = options.swipes_between_ads;

        let mut tracker = Self {
            store,
            provider,
            options,
            status: SubscriptionStatus::default(),
            purchase_state: PurchaseState::default(),
            usage_date: String::new(),
            daily_count: 0,
            filter_counts: HashMap::new(),
            rewarded_remaining: 0,
            ad_countdown,
            ad_cycle_completed: false,
            last_filter: None,
            can_swipe: true,
        };
        tracker.load_counters();
        tracker
    }

    /// Re-derives the subscription status from the entitlement backend.
    ///
    /// Query failures are logged and the previous status is kept; the UI
    /// never sees an error from this call.
    pub fn check_subscription_status(&mut self) {
        match self.provider.fetch_entitlements() {
            Ok(customer) => self.apply_entitlements(&customer),
            Err(err) => warn!("entitlement query failed, keeping previous status: {err}"),
        }
    }

    /// Whether the user may swipe in `filter` right now. Pure; does not
    /// touch the counters.
    ///
    /// Counters stamped with a previous day are stale and read as zero,
    /// so a quota exhausted yesterday never locks out a long-lived
    /// process after midnight. The stored values roll over on the next
    /// mutating call.
    pub fn can_swipe_for_filter(&self, filter: &PhotoFilter) -> bool {
        if self.status.is_premium() {
            return true;
        }
        if self.usage_date != current_day() {
            return true;
        }
        if self.rewarded_remaining > 0 {
            return true;
        }

        let used = self
            .filter_counts
            .get(&filter.storage_key())
            .copied()
            .unwrap_or(0);
        used < self.options.daily_swipe_limit
    }

    /// Records one user swipe in `filter`. Call exactly once per swipe,
    /// after the UI confirmed the quota via `can_swipe_for_filter`.
    ///
    /// Rewarded credit is consumed before the daily counters increment.
    pub fn record_swipe(&mut self, filter: &PhotoFilter) {
        self.roll_day_if_needed();

        if self.rewarded_remaining > 0 {
            self.rewarded_remaining -= 1;
        } else {
            self.daily_count += 1;
            *self.filter_counts.entry(filter.storage_key()).or_insert(0) += 1;
        }
        self.persist_counters();

        if self.ad_countdown <= 1 {
            self.ad_countdown = self.options.swipes_between_ads;
            self.ad_cycle_completed = true;
        } else {
            self.ad_countdown -= 1;
        }

        self.last_filter = Some(filter.clone());
        self.recompute_can_swipe();
    }

    /// Adds `count` extra swipes earned from a rewarded ad. No upper bound.
    pub fn grant_rewarded_swipes(&mut self, count: u32) {
        self.roll_day_if_needed();
        self.rewarded_remaining += count;
        self.persist_counters();
        self.recompute_can_swipe();
    }

    /// True once a full ad cycle has completed for a non-premium user.
    ///
    /// One-shot: stays true until the UI presents the ad and calls
    /// [`reset_ad_counter`](Self::reset_ad_counter).
    pub fn should_show_ad(&self) -> bool {
        !self.status.is_premium() && self.ad_cycle_completed
    }

    /// Clears the cycle-completed flag and restarts the countdown.
    pub fn reset_ad_counter(&mut self) {
        self.ad_cycle_completed = false;
        self.ad_countdown = self.options.swipes_between_ads;
    }

    /// Runs the purchase flow for `product_id`, recording the outcome in
    /// [`purchase_state`](Self::purchase_state). Never throws past this
    /// boundary; cancellation returns the state to `Idle` without error.
    pub fn purchase(&mut self, product_id: &str) {
        self.purchase_state = PurchaseState::Purchasing;

        match self.provider.purchase(product_id) {
            PurchaseOutcome::Success(customer) => {
                self.apply_entitlements(&customer);
                self.purchase_state = PurchaseState::Completed;
            }
            PurchaseOutcome::Cancelled => self.purchase_state = PurchaseState::Idle,
            PurchaseOutcome::Failed(err) => self.purchase_state = PurchaseState::Failed(err),
        }
    }

    /// Restores previously purchased entitlements.
    pub fn restore_purchases(&mut self) {
        self.purchase_state = PurchaseState::Restoring;

        match self.provider.restore() {
            PurchaseOutcome::Success(customer) => {
                self.apply_entitlements(&customer);
                self.purchase_state = PurchaseState::Completed;
            }
            PurchaseOutcome::Cancelled => self.purchase_state = PurchaseState::Idle,
            PurchaseOutcome::Failed(err) => self.purchase_state = PurchaseState::Failed(err),
        }
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub fn purchase_state(&self) -> &PurchaseState {
        &self.purchase_state
    }

    /// Cached result of the last quota check, recomputed after every
    /// mutation for the most recently swiped filter.
    pub fn can_swipe(&self) -> bool {
        self.can_swipe
    }

    /// Global swipes recorded today.
    pub fn daily_swipe_count(&self) -> u32 {
        self.daily_count
    }

    /// Swipes recorded today in `filter`.
    pub fn filter_swipe_count(&self, filter: &PhotoFilter) -> u32 {
        self.filter_counts
            .get(&filter.storage_key())
            .copied()
            .unwrap_or(0)
    }

    /// Rewarded-ad credit remaining today.
    pub fn rewarded_swipes_remaining(&self) -> u32 {
        self.rewarded_remaining
    }

    /// Consumes the tracker and hands the store back to the caller.
    pub fn into_store(self) -> S {
        self.store
    }

    fn apply_entitlements(&mut self, customer: &CustomerEntitlements) {
        let next = match customer.find(&self.options.premium_entitlement_id) {
            Some(e) if e.active => match e.period_type {
                // Trials end on their own; non-renewal does not make them
                // "cancelled" subscriptions.
                PeriodType::Trial => SubscriptionStatus::Trial,
                PeriodType::Normal if !e.will_renew => SubscriptionStatus::Cancelled,
                PeriodType::Normal => SubscriptionStatus::Active,
            },
            Some(_) => SubscriptionStatus::Expired,
            None => SubscriptionStatus::NotSubscribed,
        };

        if next != self.status {
            debug!(previous = ?self.status, ?next, "subscription status changed");
        }
        self.status = next;
        self.recompute_can_swipe();
    }

    fn load_counters(&mut self) {
        self.usage_date = self
            .store
            .get(keys::LAST_USAGE_DATE)
            .unwrap_or_else(current_day);
        self.daily_count = read_u32(&self.store, keys::DAILY_SWIPE_COUNT);
        self.rewarded_remaining = read_u32(&self.store, keys::REWARDED_SWIPES_REMAINING);
        self.filter_counts = match self.store.get(keys::FILTER_SWIPE_COUNTS) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                debug!("stored filter counts did not parse, defaulting to empty: {err}");
                HashMap::new()
            }),
            None => HashMap::new(),
        };

        self.roll_day_if_needed();
        self.recompute_can_swipe();
    }

    /// One day check per public call; on a date change every counter rolls
    /// over in the same update, so the stamps can never diverge.
    fn roll_day_if_needed(&mut self) {
        let today = current_day();
        if self.usage_date == today {
            return;
        }

        debug!(from = %self.usage_date, to = %today, "day changed, resetting counters");
        self.usage_date = today;
        self.daily_count = 0;
        self.filter_counts.clear();
        self.rewarded_remaining = 0;
        self.persist_counters();
    }

    fn persist_counters(&mut self) {
        let map = serde_json::to_string(&self.filter_counts).unwrap_or_else(|_| "{}".to_string());
        let writes = [
            (keys::LAST_USAGE_DATE, self.usage_date.clone()),
            (keys::DAILY_SWIPE_COUNT, self.daily_count.to_string()),
            (
                keys::REWARDED_SWIPES_REMAINING,
                self.rewarded_remaining.to_string(),
            ),
            (keys::FILTER_SWIPE_COUNTS, map),
        ];

        for (key, value) in writes {
            if let Err(err) = self.store.set(key, &value) {
                warn!(key, "failed to persist counter: {err}");
            }
        }
    }

    fn recompute_can_swipe(&mut self) {
        self.can_swipe = match self.last_filter.clone() {
            Some(filter) => self.can_swipe_for_filter(&filter),
            None => {
                // No filter swiped yet; fall back to the global counter,
                // reading a stale day as zero like the per-filter check.
                self.status.is_premium()
                    || self.usage_date != current_day()
                    || self.rewarded_remaining > 0
                    || self.daily_count < self.options.daily_swipe_limit
            }
        };
    }
}

/// Today in the user's local calendar, `YYYY-MM-DD`.
fn current_day() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn read_u32<S: SwipeStore>(store: &S, key: &str) -> u32 {
    match store.get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            debug!(key, "stored counter did not parse, defaulting to zero");
            0
        }),
        None => 0,
    }
}
