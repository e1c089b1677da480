/// Raydium Pulse - Solana DeFi terminal dashboard
///
/// The library backs the `pulse` binary:
/// - feed: snapshot fetching, filtering, and per-feed aggregates
/// - treemap: squarified layout over terminal cells
/// - format: shared USD/percentage/name formatting
/// - ui: ratatui widgets, cards, and page navigation
pub mod feed;
pub mod format;
pub mod treemap;
pub mod ui;

// Re-export commonly used types for convenience
pub use feed::{spawn_feeds, FeedError, FeedState, Feeds};

pub use feed::aggregator::{AggregatorData, AggregatorProtocol};
pub use feed::dex::{DexProtocol, DexVolumeData};
pub use feed::flows::{FlowData, FlowProtocol};
pub use feed::merge::{merge_feeds, ProtocolOverview};
pub use feed::tvl::{TvlData, TvlProtocol};

pub use format::{format_usd, growth_pct, share_pct, truncate_name};
pub use treemap::{layout, Tile, TreemapData, TreemapLeaf};

pub use ui::pages::{Action, App, Page};
