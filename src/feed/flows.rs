//! Revenue and fees feeds.
//!
//! Both snapshots carry the same record shape; only the metric differs, so
//! one data type backs both cards and detail pages.

use serde::Deserialize;

use super::{fetch_json, is_raydium, FeedError};
use crate::format::{growth_pct, share_pct, truncate_name, NAME_BUDGET};

#[derive(Debug, Clone, Deserialize)]
pub struct RawFlowProtocol {
    #[serde(default)]
    pub id: String,
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
    pub total1y: f64,
    #[serde(default, rename = "totalAllTime")]
    pub total_all_time: f64,
    #[serde(default)]
    pub change_1d: Option<f64>,
    #[serde(default)]
    pub change_7d: Option<f64>,
    #[serde(default)]
    pub change_1m: Option<f64>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default, rename = "latestFetchIsOk")]
    pub latest_fetch_is_ok: bool,
    #[serde(default, rename = "parentProtocol")]
    pub parent_protocol: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Active revenue/fees record.
#[derive(Debug, Clone)]
pub struct FlowProtocol {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub logo: String,
    pub total24h: f64,
    pub total7d: f64,
    pub total30d: f64,
    pub total1y: f64,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
    pub change_1m: Option<f64>,
    pub chains: Vec<String>,
    pub is_raydium: bool,
}

/// Chart-ready row with the axis-label truncation applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowChartRow {
    pub name: String,
    pub display_name: String,
    pub total24h: f64,
    pub total7d: f64,
    pub total30d: f64,
    pub is_raydium: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FlowData {
    /// Active protocols, descending by the 24h metric.
    pub protocols: Vec<FlowProtocol>,
    pub total24h: f64,
    pub total7d: f64,
    pub total30d: f64,
    pub total1y: f64,
}

impl FlowData {
    pub fn from_raw(raw: Vec<RawFlowProtocol>) -> Self {
        let mut protocols: Vec<FlowProtocol> = raw
            .into_iter()
            .filter(|p| p.latest_fetch_is_ok && p.total24h > 0.0)
            .map(|p| {
                let flagged =
                    is_raydium(&p.name, p.parent_protocol.as_deref(), p.slug.as_deref());
                FlowProtocol {
                    id: p.id,
                    display_name: p.display_name.unwrap_or_else(|| p.name.clone()),
                    name: p.name,
                    category: p.category,
                    logo: p.logo,
                    total24h: p.total24h,
                    total7d: p.total7d,
                    total30d: p.total30d,
                    total1y: p.total1y,
                    change_1d: p.change_1d,
                    change_7d: p.change_7d,
                    change_1m: p.change_1m,
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
        let total24h = protocols.iter().map(|p| p.total24h).sum();
        let total7d = protocols.iter().map(|p| p.total7d).sum();
        let total30d = protocols.iter().map(|p| p.total30d).sum();
        let total1y = protocols.iter().map(|p| p.total1y).sum();
        Self {
            protocols,
            total24h,
            total7d,
            total30d,
            total1y,
        }
    }

    pub fn top(&self, n: usize) -> &[FlowProtocol] {
        &self.protocols[..self.protocols.len().min(n)]
    }

    pub fn chart_rows(&self, limit: usize) -> Vec<FlowChartRow> {
        self.top(limit)
            .iter()
            .map(|p| FlowChartRow {
                name: p.name.clone(),
                display_name: truncate_name(&p.name, NAME_BUDGET),
                total24h: p.total24h,
                total7d: p.total7d,
                total30d: p.total30d,
                is_raydium: p.is_raydium,
            })
            .collect()
    }

    pub fn daily_avg_7d(&self) -> f64 {
        self.total7d / 7.0
    }

    pub fn daily_avg_30d(&self) -> f64 {
        self.total30d / 30.0
    }

    /// 7d daily average vs the latest 24h figure, in percent.
    pub fn growth_7d_vs_24h(&self) -> f64 {
        growth_pct(self.daily_avg_7d(), self.total24h)
    }

    /// 30d daily average vs the 7d daily average, in percent.
    pub fn growth_30d_vs_7d(&self) -> f64 {
        growth_pct(self.daily_avg_30d(), self.daily_avg_7d())
    }

    /// Share of the top protocol's 24h metric, in percent.
    pub fn top_share_pct(&self) -> f64 {
        self.protocols
            .first()
            .map(|p| share_pct(p.total24h, self.total24h))
            .unwrap_or(0.0)
    }

    /// Three-point trend series `{24h, 7d, 30d}` for the card sparkline.
    pub fn trend_series(&self) -> [f64; 3] {
        [self.total24h, self.total7d, self.total30d]
    }
}

pub async fn fetch_revenue() -> Result<FlowData, FeedError> {
    let raw: Vec<RawFlowProtocol> = fetch_json("/data/revenue.json").await?;
    Ok(FlowData::from_raw(raw))
}

pub async fn fetch_fees() -> Result<FlowData, FeedError> {
    let raw: Vec<RawFlowProtocol> = fetch_json("/data/fees.json").await?;
    Ok(FlowData::from_raw(raw))
}
