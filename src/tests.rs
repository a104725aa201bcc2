//! End-to-end scenario: a free user works through their daily quota with
//! the stand-in trial provider and an in-memory store.

use crate::{
    EntitlementTracker, MemoryStore, PhotoFilter, SubscriptionStatus, SwipeStore, TrackerOptions,
    TrialProvider,
};

#[test]
fn free_day_in_the_life() {
    let options = TrackerOptions {
        daily_swipe_limit: 10,
        swipes_between_ads: 5,
        premium_entitlement_id: "premium".to_string(),
    };

    // Trial window of zero days: the trial is born expired, so the user
    // runs as a free user from the first launch.
    let provider = TrialProvider::new(MemoryStore::new(), "premium", 0);
    let mut tracker = EntitlementTracker::new(MemoryStore::new(), provider, options);

    tracker.check_subscription_status();
    assert_eq!(tracker.status(), SubscriptionStatus::Expired);

    let screenshots = PhotoFilter::Screenshots;

    // Work through the daily quota, presenting an ad every 5 swipes.
    let mut ads_shown = 0;
    for _ in 0..10 {
        assert!(tracker.can_swipe_for_filter(&screenshots));
        tracker.record_swipe(&screenshots);

        if tracker.should_show_ad() {
            ads_shown += 1;
            tracker.reset_ad_counter();
        }
    }
    assert_eq!(ads_shown, 2);
    assert!(!tracker.can_swipe_for_filter(&screenshots));

    // Other filters still have their own quota.
    assert!(tracker.can_swipe_for_filter(&PhotoFilter::OnThisDay));

    // Watching a rewarded ad buys three more swipes in any filter.
    tracker.grant_rewarded_swipes(3);
    assert!(tracker.can_swipe_for_filter(&screenshots));

    for _ in 0..3 {
        tracker.record_swipe(&screenshots);
    }
    assert_eq!(tracker.rewarded_swipes_remaining(), 0);
    assert!(!tracker.can_swipe_for_filter(&screenshots));
    assert_eq!(tracker.daily_swipe_count(), 10);
}

#[test]
fn fresh_install_starts_a_trial() {
    let provider = TrialProvider::new(MemoryStore::new(), "premium", 3);
    let mut tracker =
        EntitlementTracker::new(MemoryStore::new(), provider, TrackerOptions::default());

    tracker.check_subscription_status();
    assert_eq!(tracker.status(), SubscriptionStatus::Trial);

    // Trials swipe without limits and without ads.
    for _ in 0..30 {
        tracker.record_swipe(&PhotoFilter::Random);
    }
    assert!(tracker.can_swipe_for_filter(&PhotoFilter::Random));
    assert!(!tracker.should_show_ad());
}

#[test]
fn store_keys_match_the_published_schema() {
    use crate::store::keys;

    let mut store = MemoryStore::new();
    {
        let provider = TrialProvider::new(MemoryStore::new(), "premium", 3);
        let mut tracker =
            EntitlementTracker::new(store.clone(), provider, TrackerOptions::default());
        tracker.record_swipe(&PhotoFilter::Year(2020));
        tracker.grant_rewarded_swipes(2);

        // MemoryStore clones share nothing; pull the written one back out.
        store = tracker.into_store();
    }

    assert!(store.get(keys::LAST_USAGE_DATE).is_some());
    assert_eq!(store.get(keys::DAILY_SWIPE_COUNT).as_deref(), Some("1"));
    assert_eq!(
        store.get(keys::REWARDED_SWIPES_REMAINING).as_deref(),
        Some("2")
    );

    let map: std::collections::HashMap<String, u32> =
        serde_json::from_str(&store.get(keys::FILTER_SWIPE_COUNTS).unwrap()).unwrap();
    assert_eq!(map.get("year_2020"), Some(&1));
}
