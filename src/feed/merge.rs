//! Cross-feed protocol overview.
//!
//! Folds whichever feeds have settled into one row per protocol name. Feeds
//! are folded in a fixed order so identity fields are deterministic: the
//! first feed to mention a name supplies its display name, category and
//! highlight flag, the first non-empty logo wins, and each metric column is
//! only ever written by its own feed.

use std::collections::HashMap;

use super::Feeds;

/// One protocol's row in the merged table. A `None` metric means the feed
/// either has not settled or does not list this protocol.
#[derive(Debug, Clone, Default)]
pub struct ProtocolOverview {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub logo: String,
    pub is_raydium: bool,
    pub aggregator_volume: Option<f64>,
    pub tvl: Option<f64>,
    pub revenue_24h: Option<f64>,
    pub fees_24h: Option<f64>,
    pub dex_volume_24h: Option<f64>,
}

impl ProtocolOverview {
    /// Sum of every metric this row carries. Ranks rows whose feeds disagree
    /// about coverage without penalising missing columns.
    pub fn combined_total(&self) -> f64 {
        [
            self.aggregator_volume,
            self.tvl,
            self.revenue_24h,
            self.fees_24h,
            self.dex_volume_24h,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

struct Merge {
    index: HashMap<String, usize>,
    rows: Vec<ProtocolOverview>,
}

impl Merge {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn row(
        &mut self,
        name: &str,
        display_name: &str,
        category: &str,
        logo: &str,
        is_raydium: bool,
    ) -> &mut ProtocolOverview {
        let idx = match self.index.get(name) {
            Some(idx) => *idx,
            None => {
                let idx = self.rows.len();
                self.rows.push(ProtocolOverview {
                    name: name.to_string(),
                    display_name: display_name.to_string(),
                    category: category.to_string(),
                    is_raydium,
                    ..Default::default()
                });
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        let row = &mut self.rows[idx];
        if row.logo.is_empty() && !logo.is_empty() {
            row.logo = logo.to_string();
        }
        row
    }

    fn finish(mut self) -> Vec<ProtocolOverview> {
        self.rows.sort_by(|a, b| {
            b.combined_total()
                .partial_cmp(&a.combined_total())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.rows
    }
}

/// Merge every settled feed into the overview rows, descending by
/// [`ProtocolOverview::combined_total`]. Feeds still loading or failed simply
/// contribute nothing.
pub fn merge_feeds(feeds: &Feeds) -> Vec<ProtocolOverview> {
    let mut merge = Merge::new();

    if let Some(data) = &feeds.aggregator.data {
        for p in &data.protocols {
            merge
                .row(&p.name, &p.display_name, "Aggregator", "", p.is_raydium)
                .aggregator_volume = Some(p.volume);
        }
    }
    if let Some(data) = &feeds.tvl.data {
        for p in &data.protocols {
            merge.row(&p.name, &p.name, &p.category, "", p.is_raydium).tvl = Some(p.tvl);
        }
    }
    if let Some(data) = &feeds.revenue.data {
        for p in &data.protocols {
            merge
                .row(&p.name, &p.display_name, &p.category, &p.logo, p.is_raydium)
                .revenue_24h = Some(p.total24h);
        }
    }
    if let Some(data) = &feeds.fees.data {
        for p in &data.protocols {
            merge
                .row(&p.name, &p.display_name, &p.category, &p.logo, p.is_raydium)
                .fees_24h = Some(p.total24h);
        }
    }
    if let Some(data) = &feeds.dex.data {
        for p in &data.protocols {
            merge
                .row(&p.name, &p.display_name, &p.category, &p.logo, p.is_raydium)
                .dex_volume_24h = Some(p.total24h);
        }
    }

    merge.finish()
}
