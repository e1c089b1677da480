//! Snapshot feed plumbing.
//!
//! Each metric feed fetches one pre-computed JSON snapshot, filters and sorts
//! it into typed records, and computes its aggregate sums once per successful
//! fetch. The five feeds are fully independent: five tasks race to
//! completion and every consumer must tolerate partial readiness.

pub mod aggregator;
pub mod dex;
pub mod flows;
pub mod merge;
pub mod tvl;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use self::aggregator::AggregatorData;
use self::dex::DexVolumeData;
use self::flows::FlowData;
use self::tvl::TvlData;

/// Base URL of the static snapshot files, overridable via `PULSE_DATA_URL`.
pub const DEFAULT_DATA_URL: &str = "https://raydium-pulse.vercel.app";

fn data_base_url() -> String {
    std::env::var("PULSE_DATA_URL").unwrap_or_else(|_| DEFAULT_DATA_URL.to_string())
}

/// Failure of a single snapshot fetch. Terminal for the feed until the next
/// refresh: no retry, no backoff.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed payload: {0}")]
    Parse(#[source] serde_json::Error),
}

/// GET a snapshot resource and parse its body.
pub async fn fetch_json<T: DeserializeOwned>(path: &str) -> Result<T, FeedError> {
    let url = format!("{}{}", data_base_url(), path);
    let response = reqwest::Client::new().get(&url).send().await?;
    if !response.status().is_success() {
        return Err(FeedError::Status(response.status()));
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(FeedError::Parse)
}

/// The highlighted protocol is matched by name token, parent tag, or slug.
/// Pure predicate, always recomputed, never stored authoritatively upstream.
pub fn is_raydium(name: &str, parent_protocol: Option<&str>, slug: Option<&str>) -> bool {
    name.to_lowercase().contains("raydium")
        || parent_protocol == Some("parent#raydium")
        || slug.is_some_and(|s| s.contains("raydium"))
}

/// Loading/error/data triplet exposed by every feed.
///
/// `loading` is true from activation until the fetch settles; `error` carries
/// the human-readable failure message; `data` is replaced wholesale on
/// success and stays `None` after a failure.
#[derive(Debug, Clone)]
pub struct FeedState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// When this slot last settled. Consumers key caches on it so one feed's
    /// arrival never invalidates work derived from another feed.
    pub settled_at: Option<DateTime<Utc>>,
}

impl<T> FeedState<T> {
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
            settled_at: None,
        }
    }

    pub fn complete(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
        self.settled_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl std::fmt::Display) {
        self.loading = false;
        self.error = Some(error.to_string());
        self.settled_at = Some(Utc::now());
    }

    pub fn is_ready(&self) -> bool {
        self.data.is_some()
    }
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

/// All five feed states plus refresh bookkeeping. Shared between the feed
/// tasks and the render loop behind `Arc<Mutex<_>>`.
#[derive(Debug, Clone, Default)]
pub struct Feeds {
    pub dex: FeedState<DexVolumeData>,
    pub tvl: FeedState<TvlData>,
    pub revenue: FeedState<FlowData>,
    pub fees: FeedState<FlowData>,
    pub aggregator: FeedState<AggregatorData>,
    /// Bumped on every refresh; a task whose generation no longer matches has
    /// been superseded and its result is discarded, never cancelled.
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Feeds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every slot to loading for a fresh activation and claim the next
    /// generation. Results of older in-flight fetches are discarded when they
    /// arrive with a stale generation.
    pub fn reset_for_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.dex = FeedState::loading();
        self.tvl = FeedState::loading();
        self.revenue = FeedState::loading();
        self.fees = FeedState::loading();
        self.aggregator = FeedState::loading();
        self.generation
    }

    /// How many of the five feeds have settled (data or error).
    pub fn settled_count(&self) -> usize {
        [
            !self.dex.loading,
            !self.tvl.loading,
            !self.revenue.loading,
            !self.fees.loading,
            !self.aggregator.loading,
        ]
        .iter()
        .filter(|settled| **settled)
        .count()
    }
}

macro_rules! spawn_feed {
    ($feeds:expr, $generation:expr, $slot:ident, $fetch:expr, $label:expr) => {{
        let feeds = Arc::clone($feeds);
        let generation = $generation;
        tokio::spawn(async move {
            let result = $fetch.await;
            let mut guard = feeds.lock().await;
            if guard.generation != generation {
                // A newer refresh owns the slot now
                return;
            }
            match result {
                Ok(data) => {
                    info!(feed = $label, "snapshot loaded");
                    guard.$slot.complete(data);
                }
                Err(e) => {
                    error!(feed = $label, error = %e, "snapshot fetch failed");
                    guard.$slot.fail(e);
                }
            }
            guard.updated_at = Some(Utc::now());
        })
    }};
}

/// Activate all five feeds: reset every slot to loading and issue one fetch
/// per feed. Calling this again acts as the remount that retries failed
/// feeds; results of still-running older fetches are discarded on arrival.
pub async fn spawn_feeds(feeds: &Arc<Mutex<Feeds>>) {
    let generation = feeds.lock().await.reset_for_refresh();

    spawn_feed!(feeds, generation, dex, dex::fetch_dex_volume(), "dex-volume");
    spawn_feed!(feeds, generation, tvl, tvl::fetch_tvl(), "tvl");
    spawn_feed!(feeds, generation, revenue, flows::fetch_revenue(), "revenue");
    spawn_feed!(feeds, generation, fees, flows::fetch_fees(), "fees");
    spawn_feed!(
        feeds,
        generation,
        aggregator,
        aggregator::fetch_aggregator_share(),
        "aggregator-market-share"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_state_starts_loading() {
        let state: FeedState<DexVolumeData> = FeedState::loading();
        assert!(state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_feed_state_failure_is_terminal_triplet() {
        let mut state: FeedState<DexVolumeData> = FeedState::loading();
        state.fail("request failed: connection refused");
        assert!(!state.loading);
        assert!(state.data.is_none());
        let msg = state.error.as_deref().unwrap();
        assert!(!msg.is_empty());
    }

    #[test]
    fn test_feed_state_success_clears_error() {
        let mut state: FeedState<DexVolumeData> = FeedState::loading();
        state.fail("boom");
        state.complete(DexVolumeData::default());
        assert!(state.is_ready());
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert!(state.settled_at.is_some());
    }

    #[test]
    fn test_is_raydium_predicate() {
        assert!(is_raydium("Raydium AMM", None, None));
        assert!(is_raydium("raydium clmm", None, None));
        assert!(!is_raydium("Orca", None, None));
        assert!(is_raydium("Something", Some("parent#raydium"), None));
        assert!(!is_raydium("Something", Some("parent#orca"), None));
        assert!(is_raydium("Something", None, Some("raydium-amm")));
        assert!(!is_raydium("Something", None, Some("orca-so")));
    }

    #[test]
    fn test_settled_count_tracks_partial_readiness() {
        let mut feeds = Feeds::new();
        assert_eq!(feeds.settled_count(), 0);
        feeds.tvl.fail("offline");
        feeds.dex.complete(DexVolumeData::default());
        assert_eq!(feeds.settled_count(), 2);
    }

    #[test]
    fn test_refresh_bumps_generation_and_resets_slots() {
        let mut feeds = Feeds::new();
        feeds.dex.fail("old failure");
        feeds.tvl.complete(TvlData::default());
        let generation = feeds.reset_for_refresh();
        assert_eq!(generation, 1);
        assert!(feeds.dex.loading);
        assert!(feeds.dex.error.is_none());
        assert!(feeds.tvl.data.is_none());
        assert!(feeds.tvl.settled_at.is_none());
    }
}
