//! DEX 24h-volume feed: source of the treemap and the volume card.

use serde::Deserialize;

use super::{fetch_json, is_raydium, FeedError};
use crate::format::share_pct;
use crate::treemap::{TreemapData, TreemapLeaf};

/// Leaves shown by the treemap, chosen for visual legibility.
const TREEMAP_CUTOFF: usize = 18;

/// Raw snapshot record as served by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDexProtocol {
    pub name: String,
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub total24h: f64,
    #[serde(default)]
    pub total7d: f64,
    #[serde(default)]
    pub total30d: f64,
    #[serde(default)]
    pub change_1d: Option<f64>,
    #[serde(default)]
    pub change_7d: Option<f64>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default, rename = "latestFetchIsOk")]
    pub latest_fetch_is_ok: bool,
    #[serde(default, rename = "parentProtocol")]
    pub parent_protocol: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

/// Active DEX protocol record.
#[derive(Debug, Clone)]
pub struct DexProtocol {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub logo: String,
    pub total24h: f64,
    pub total7d: f64,
    pub total30d: f64,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
    pub chains: Vec<String>,
    pub is_raydium: bool,
}

/// Filtered, sorted records plus their aggregate, computed once per fetch.
#[derive(Debug, Clone, Default)]
pub struct DexVolumeData {
    /// Active protocols, descending by 24h volume.
    pub protocols: Vec<DexProtocol>,
    /// Sum of 24h volume over the active set only.
    pub total_volume: f64,
}

impl DexVolumeData {
    /// Retain records that are enabled, traded in the last 24h, and whose
    /// latest upstream fetch succeeded; sort descending by 24h volume.
    pub fn from_raw(raw: Vec<RawDexProtocol>) -> Self {
        let mut protocols: Vec<DexProtocol> = raw
            .into_iter()
            .filter(|p| !p.disabled && p.total24h > 0.0 && p.latest_fetch_is_ok)
            .map(|p| {
                let flagged =
                    is_raydium(&p.name, p.parent_protocol.as_deref(), p.slug.as_deref());
                DexProtocol {
                    display_name: p.display_name.unwrap_or_else(|| p.name.clone()),
                    name: p.name,
                    category: p.category,
                    logo: p.logo,
                    total24h: p.total24h,
                    total7d: p.total7d,
                    total30d: p.total30d,
                    change_1d: p.change_1d,
                    change_7d: p.change_7d,
                    chains: p.chains,
                    is_raydium: flagged,
                }
            })
            .collect();
        protocols.sort_by(|a, b| {
            b.total24h
                .partial_cmp(&a.total24h)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let total_volume = protocols.iter().map(|p| p.total24h).sum();
        Self {
            protocols,
            total_volume,
        }
    }

    pub fn top(&self, n: usize) -> &[DexProtocol] {
        &self.protocols[..self.protocols.len().min(n)]
    }

    /// Flat single-level hierarchy over the top leaves, or `None` when no
    /// active records exist so renderers show an empty state instead of an
    /// empty tree.
    pub fn treemap_data(&self) -> Option<TreemapData> {
        if self.protocols.is_empty() {
            return None;
        }
        let children = self
            .top(TREEMAP_CUTOFF)
            .iter()
            .map(|p| TreemapLeaf {
                name: p.display_name.clone(),
                display_name: p.display_name.clone(),
                value: p.total24h,
                category: p.category.clone(),
                change_1d: p.change_1d,
                change_7d: p.change_7d,
            })
            .collect();
        Some(TreemapData {
            name: "Solana DEX Ecosystem".to_string(),
            children,
        })
    }

    /// Share of the market leader, in percent.
    pub fn leader_dominance_pct(&self) -> f64 {
        self.protocols
            .first()
            .map(|p| share_pct(p.total24h, self.total_volume))
            .unwrap_or(0.0)
    }

    /// Mean 24h change over the top `n` protocols that report one.
    pub fn avg_change_1d(&self, n: usize) -> f64 {
        let changes: Vec<f64> = self.top(n).iter().filter_map(|p| p.change_1d).collect();
        if changes.is_empty() {
            0.0
        } else {
            changes.iter().sum::<f64>() / changes.len() as f64
        }
    }

    /// Combined share of the top `n` protocols, in percent.
    pub fn top_share_pct(&self, n: usize) -> f64 {
        let top_volume: f64 = self.top(n).iter().map(|p| p.total24h).sum();
        share_pct(top_volume, self.total_volume)
    }

    /// The highlighted AMM's record, when it is active.
    pub fn raydium_amm(&self) -> Option<&DexProtocol> {
        self.protocols.iter().find(|p| p.name == "Raydium AMM")
    }
}

pub async fn fetch_dex_volume() -> Result<DexVolumeData, FeedError> {
    let raw: Vec<RawDexProtocol> = fetch_json("/data/dex-volume.json").await?;
    Ok(DexVolumeData::from_raw(raw))
}
