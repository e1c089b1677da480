//! TVL feed with per-chain breakdowns.

use std::collections::HashMap;

use serde::Deserialize;

use super::{fetch_json, is_raydium, FeedError};
use crate::format::{share_pct, truncate_name};

#[derive(Debug, Clone, Deserialize)]
pub struct RawTvlProtocol {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tvl: f64,
    #[serde(default, rename = "chainTvls")]
    pub chain_tvls: HashMap<String, f64>,
    #[serde(default)]
    pub mcap: Option<f64>,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone)]
pub struct TvlProtocol {
    pub name: String,
    pub symbol: Option<String>,
    pub category: String,
    pub tvl: f64,
    /// TVL custodied on Solana, 0 when the chain breakdown lacks the entry.
    pub solana_tvl: f64,
    pub mcap: Option<f64>,
    pub is_raydium: bool,
}

/// Chart-ready row: fields renamed and name truncated for axis labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TvlChartRow {
    pub name: String,
    pub display_name: String,
    pub tvl: f64,
    pub solana_tvl: f64,
    /// TVL on every other chain, never negative.
    pub other_chains_tvl: f64,
    pub is_raydium: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TvlData {
    /// Active protocols, descending by total TVL.
    pub protocols: Vec<TvlProtocol>,
    pub total_tvl: f64,
    pub solana_tvl: f64,
}

impl TvlData {
    pub fn from_raw(raw: Vec<RawTvlProtocol>) -> Self {
        let mut protocols: Vec<TvlProtocol> = raw
            .into_iter()
            .filter(|p| !p.deprecated && p.tvl > 0.0)
            .map(|p| {
                let solana_tvl = p.chain_tvls.get("Solana").copied().unwrap_or(0.0);
                TvlProtocol {
                    is_raydium: is_raydium(&p.name, None, None),
                    name: p.name,
                    symbol: p.symbol,
                    category: p.category,
                    tvl: p.tvl,
                    solana_tvl,
                    mcap: p.mcap,
                }
            })
            .collect();
        protocols.sort_by(|a, b| {
            b.tvl
                .partial_cmp(&a.tvl)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let total_tvl = protocols.iter().map(|p| p.tvl).sum();
        let solana_tvl = protocols.iter().map(|p| p.solana_tvl).sum();
        Self {
            protocols,
            total_tvl,
            solana_tvl,
        }
    }

    pub fn top(&self, n: usize) -> &[TvlProtocol] {
        &self.protocols[..self.protocols.len().min(n)]
    }

    /// Rows for the stacked Solana-vs-other-chains bars. `budget` is the
    /// label truncation of the consuming chart.
    pub fn chart_rows(&self, limit: usize, budget: usize) -> Vec<TvlChartRow> {
        self.top(limit)
            .iter()
            .map(|p| TvlChartRow {
                name: p.name.clone(),
                display_name: truncate_name(&p.name, budget),
                tvl: p.tvl,
                solana_tvl: p.solana_tvl,
                other_chains_tvl: (p.tvl - p.solana_tvl).max(0.0),
                is_raydium: p.is_raydium,
            })
            .collect()
    }

    /// Share of ecosystem TVL custodied on Solana, in percent.
    pub fn solana_share_pct(&self) -> f64 {
        share_pct(self.solana_tvl, self.total_tvl)
    }
}

pub async fn fetch_tvl() -> Result<TvlData, FeedError> {
    let raw: Vec<RawTvlProtocol> = fetch_json("/data/tvl.json").await?;
    Ok(TvlData::from_raw(raw))
}
