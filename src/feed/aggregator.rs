//! Aggregator market-share feed.
//!
//! Unlike the other snapshots this one is a flat JSON object mapping protocol
//! name to routed volume, not an array of records.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{fetch_json, is_raydium, FeedError};
use crate::format::{share_pct, truncate_name, NAME_BUDGET};

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RawAggregatorShare {
    pub volumes: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorProtocol {
    pub name: String,
    pub display_name: String,
    pub volume: f64,
    pub is_raydium: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AggregatorData {
    /// Active aggregators, descending by routed volume.
    pub protocols: Vec<AggregatorProtocol>,
    pub total_volume: f64,
}

impl AggregatorData {
    pub fn from_raw(raw: RawAggregatorShare) -> Self {
        let mut protocols: Vec<AggregatorProtocol> = raw
            .volumes
            .into_iter()
            .filter(|(_, volume)| *volume > 0.0)
            .map(|(name, volume)| AggregatorProtocol {
                display_name: truncate_name(&name, NAME_BUDGET),
                is_raydium: is_raydium(&name, None, None),
                name,
                volume,
            })
            .collect();
        protocols.sort_by(|a, b| {
            b.volume
                .partial_cmp(&a.volume)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let total_volume = protocols.iter().map(|p| p.volume).sum();
        Self {
            protocols,
            total_volume,
        }
    }

    pub fn top(&self, n: usize) -> &[AggregatorProtocol] {
        &self.protocols[..self.protocols.len().min(n)]
    }

    pub fn share_pct(&self, protocol: &AggregatorProtocol) -> f64 {
        share_pct(protocol.volume, self.total_volume)
    }
}

pub async fn fetch_aggregator_share() -> Result<AggregatorData, FeedError> {
    let raw: RawAggregatorShare = fetch_json("/data/aggregator-market-share.json").await?;
    Ok(AggregatorData::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, f64)]) -> RawAggregatorShare {
        RawAggregatorShare {
            volumes: entries
                .iter()
                .map(|(name, volume)| (name.to_string(), *volume))
                .collect(),
        }
    }

    #[test]
    fn test_map_feed_converted_and_ranked() {
        let data =
            AggregatorData::from_raw(raw(&[("Jupiter", 10_000_000.0), ("Raydium", 2_000_000.0)]));
        assert_eq!(data.protocols.len(), 2);
        assert_eq!(data.total_volume, 12_000_000.0);
        assert_eq!(data.protocols[0].name, "Jupiter");
        assert!((data.share_pct(&data.protocols[0]) - 83.33).abs() < 0.01);
        assert!(data.protocols[1].is_raydium);
        assert!(!data.protocols[0].is_raydium);
    }

    #[test]
    fn test_zero_volume_entries_excluded() {
        let data = AggregatorData::from_raw(raw(&[("Jupiter", 5.0), ("Ghost", 0.0)]));
        assert_eq!(data.protocols.len(), 1);
        assert_eq!(data.total_volume, 5.0);
    }

    #[test]
    fn test_display_names_truncated() {
        let data = AggregatorData::from_raw(raw(&[("DFlow Trading Aggregator", 1.0)]));
        assert_eq!(data.protocols[0].display_name, "DFlow Trading A...");
    }

    #[test]
    fn test_parses_flat_json_object() {
        let json = r#"{"Jupiter": 10000000, "Raydium": 2000000}"#;
        let raw: RawAggregatorShare = serde_json::from_str(json).unwrap();
        let data = AggregatorData::from_raw(raw);
        assert_eq!(data.total_volume, 12_000_000.0);
    }

    #[test]
    fn test_empty_feed_degrades_safely() {
        let data = AggregatorData::from_raw(raw(&[]));
        assert!(data.top(10).is_empty());
        assert_eq!(data.total_volume, 0.0);
    }
}
