use serde::{Deserialize, Serialize};

/// A content-selection mode with its own independent daily quota.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotoFilter {
    /// A random sample from the whole library.
    Random,
    /// Photos taken on today's date in past years.
    OnThisDay,
    /// Screenshots only.
    Screenshots,
    /// Photos from a specific year.
    Year(i32),
}

impl PhotoFilter {
    /// Stable key used in the persisted per-filter count map.
    /// Distinct filter variants must never collide.
    pub fn storage_key(&self) -> String {
        match self {
            PhotoFilter::Random => "random".to_string(),
            PhotoFilter::OnThisDay => "onThisDay".to_string(),
            PhotoFilter::Screenshots => "screenshots".to_string(),
            PhotoFilter::Year(year) => format!("year_{year}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_are_stable() {
        assert_eq!(PhotoFilter::Random.storage_key(), "random");
        assert_eq!(PhotoFilter::OnThisDay.storage_key(), "onThisDay");
        assert_eq!(PhotoFilter::Screenshots.storage_key(), "screenshots");
        assert_eq!(PhotoFilter::Year(2019).storage_key(), "year_2019");
    }

    #[test]
    fn year_filters_do_not_collide() {
        assert_ne!(
            PhotoFilter::Year(2019).storage_key(),
            PhotoFilter::Year(2020).storage_key()
        );
    }
}
