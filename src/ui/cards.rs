//! Metric cards and ranked-list rendering shared by the overview and the
//! detail pages.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame,
};

use crate::feed::aggregator::AggregatorData;
use crate::feed::dex::DexVolumeData;
use crate::feed::flows::FlowData;
use crate::feed::tvl::TvlData;
use crate::feed::{FeedState, Feeds};
use crate::format::{format_usd, share_pct, truncate_name, NAME_BUDGET};
use crate::ui::{change_color, ACCENT, BRIGHT, CREAM, DIM, DOWN, MAGENTA, TEAL};

/// Ranked-list length used by the overview cards.
pub const TOP_LIST: usize = 10;
/// Aggregators ranked on the overview card.
const AGGREGATOR_CARD_CUTOFF: usize = 17;

fn card_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM))
        .title_style(Style::default().fg(CREAM).add_modifier(Modifier::BOLD))
}

/// Draw the loading or error placeholder when the feed has not delivered
/// data. Returns the settled data otherwise.
pub fn placeholder_or_data<'a, T>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    state: &'a FeedState<T>,
) -> Option<&'a T> {
    if let Some(data) = &state.data {
        return Some(data);
    }
    let line = if state.loading {
        Line::from(Span::styled("Loading…", Style::default().fg(DIM)))
    } else {
        let msg = state.error.as_deref().unwrap_or("unavailable");
        Line::from(Span::styled(
            format!("Failed: {msg}"),
            Style::default().fg(DOWN),
        ))
    };
    f.render_widget(
        Paragraph::new(line).block(card_block(title)),
        area,
    );
    None
}

/// Proportional bar of `width` cells, filled left to right.
pub fn ratio_bar(fraction: f64, width: usize) -> String {
    let f = fraction.clamp(0.0, 1.0);
    let filled = ((f * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Left column of the overview: one headline figure per feed.
pub fn render_totals(f: &mut Frame, area: Rect, feeds: &Feeds) {
    let figure = |label: &str, value: Option<f64>, color: Color| -> Vec<Line<'static>> {
        let rendered = match value {
            Some(v) => Span::styled(
                format_usd(v),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("—".to_string(), Style::default().fg(DIM)),
        };
        vec![
            Line::from(Span::styled(
                label.to_string(),
                Style::default().fg(DIM),
            )),
            Line::from(rendered),
            Line::default(),
        ]
    };

    let mut lines = Vec::new();
    lines.extend(figure("ECOSYSTEM VOLUME 24H", ecosystem_volume(feeds), ACCENT));
    lines.extend(figure(
        "TOTAL TVL",
        feeds.tvl.data.as_ref().map(|d| d.total_tvl),
        TEAL,
    ));
    lines.extend(figure(
        "REVENUE 24H",
        feeds.revenue.data.as_ref().map(|d| d.total24h),
        MAGENTA,
    ));
    lines.extend(figure(
        "FEES 24H",
        feeds.fees.data.as_ref().map(|d| d.total24h),
        CREAM,
    ));

    f.render_widget(
        Paragraph::new(lines).block(card_block("SOLANA DEFI")),
        area,
    );
}

/// Ecosystem volume counts DEX and aggregator-routed flow together; `None`
/// only while neither feed has delivered.
pub fn ecosystem_volume(feeds: &Feeds) -> Option<f64> {
    match (feeds.dex.data.as_ref(), feeds.aggregator.data.as_ref()) {
        (None, None) => None,
        (dex, agg) => Some(
            dex.map(|d| d.total_volume).unwrap_or(0.0)
                + agg.map(|a| a.total_volume).unwrap_or(0.0),
        ),
    }
}

/// Market-performance strip under the treemap: leader dominance, average
/// daily move, active count, top-3 concentration.
pub fn render_dex_strip(f: &mut Frame, area: Rect, data: &DexVolumeData) {
    let avg = data.avg_change_1d(TOP_LIST);
    let spans = vec![
        Span::styled("Dominance ", Style::default().fg(DIM)),
        Span::styled(
            format!("{:.1}%", data.leader_dominance_pct()),
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled("Avg 24h ", Style::default().fg(DIM)),
        Span::styled(format!("{avg:+.2}%"), Style::default().fg(change_color(avg))),
        Span::raw("   "),
        Span::styled("Active ", Style::default().fg(DIM)),
        Span::styled(
            data.protocols.len().to_string(),
            Style::default().fg(BRIGHT),
        ),
        Span::raw("   "),
        Span::styled("Top 3 ", Style::default().fg(DIM)),
        Span::styled(
            format!("{:.1}%", data.top_share_pct(3)),
            Style::default().fg(BRIGHT),
        ),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Revenue/fees card: trend sparkline over `{24h, 7d, 30d}`, growth rates,
/// and concentration figures. One renderer serves both feeds.
pub fn render_flow_card(f: &mut Frame, area: Rect, title: &str, state: &FeedState<FlowData>) {
    let Some(data) = placeholder_or_data(f, area, title, state) else {
        return;
    };

    let block = card_block(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let series: Vec<u64> = data
        .trend_series()
        .iter()
        .map(|v| v.max(0.0) as u64)
        .collect();
    f.render_widget(
        Sparkline::default()
            .data(&series)
            .style(Style::default().fg(ACCENT)),
        chunks[0],
    );

    let growth_7d = data.growth_7d_vs_24h();
    let growth_30d = data.growth_30d_vs_7d();
    let lines = vec![
        Line::from(vec![
            Span::styled("24h ", Style::default().fg(DIM)),
            Span::styled(
                format_usd(data.total24h),
                Style::default().fg(CREAM).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("7d avg ", Style::default().fg(DIM)),
            Span::styled(format_usd(data.daily_avg_7d()), Style::default().fg(BRIGHT)),
            Span::raw("  "),
            Span::styled("30d avg ", Style::default().fg(DIM)),
            Span::styled(format_usd(data.daily_avg_30d()), Style::default().fg(BRIGHT)),
        ]),
        Line::from(vec![
            Span::styled("7d trend ", Style::default().fg(DIM)),
            Span::styled(
                format!("{growth_7d:+.1}%"),
                Style::default().fg(change_color(growth_7d)),
            ),
            Span::raw("  "),
            Span::styled("30d trend ", Style::default().fg(DIM)),
            Span::styled(
                format!("{growth_30d:+.1}%"),
                Style::default().fg(change_color(growth_30d)),
            ),
            Span::raw("  "),
            Span::styled("Top share ", Style::default().fg(DIM)),
            Span::styled(
                format!("{:.1}%", data.top_share_pct()),
                Style::default().fg(BRIGHT),
            ),
            Span::raw("  "),
            Span::styled("Active ", Style::default().fg(DIM)),
            Span::styled(
                data.protocols.len().to_string(),
                Style::default().fg(BRIGHT),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), chunks[1]);
}

/// TVL card: headline figures plus the top protocols with proportional bars.
pub fn render_tvl_card(f: &mut Frame, area: Rect, state: &FeedState<TvlData>) {
    let Some(data) = placeholder_or_data(f, area, "TVL", state) else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total ", Style::default().fg(DIM)),
            Span::styled(
                format_usd(data.total_tvl),
                Style::default().fg(TEAL).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("Solana ", Style::default().fg(DIM)),
            Span::styled(
                format!(
                    "{} ({:.1}%)",
                    format_usd(data.solana_tvl),
                    data.solana_share_pct()
                ),
                Style::default().fg(BRIGHT),
            ),
        ]),
        Line::default(),
    ];

    let leader_tvl = data.protocols.first().map(|p| p.tvl).unwrap_or(0.0);
    for p in data.top(TOP_LIST) {
        let bar = ratio_bar(if leader_tvl > 0.0 { p.tvl / leader_tvl } else { 0.0 }, 12);
        let name_style = if p.is_raydium {
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BRIGHT)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", truncate_name(&p.name, NAME_BUDGET)), name_style),
            Span::styled(bar, Style::default().fg(TEAL)),
            Span::styled(format!(" {}", format_usd(p.tvl)), Style::default().fg(DIM)),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(card_block("TVL")), area);
}

/// Aggregator card: routed-volume ranking with shares of the total.
pub fn render_aggregator_card(f: &mut Frame, area: Rect, state: &FeedState<AggregatorData>) {
    let Some(data) = placeholder_or_data(f, area, "AGGREGATORS", state) else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Routed 24h ", Style::default().fg(DIM)),
            Span::styled(
                format_usd(data.total_volume),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::default(),
    ];

    let leader = data.protocols.first().map(|p| p.volume).unwrap_or(0.0);
    for p in data.top(TOP_LIST) {
        let bar = ratio_bar(if leader > 0.0 { p.volume / leader } else { 0.0 }, 10);
        let name_style = if p.is_raydium {
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BRIGHT)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", p.display_name.clone()), name_style),
            Span::styled(bar, Style::default().fg(ACCENT)),
            Span::styled(
                format!(" {:>5.1}%", data.share_pct(p)),
                Style::default().fg(DIM),
            ),
        ]));
    }
    if data.protocols.len() > TOP_LIST {
        let ranked: f64 = data
            .top(AGGREGATOR_CARD_CUTOFF)
            .iter()
            .map(|p| p.volume)
            .sum();
        lines.push(Line::from(Span::styled(
            format!(
                "… {} more, top {} hold {:.1}%",
                data.protocols.len() - TOP_LIST,
                data.protocols.len().min(AGGREGATOR_CARD_CUTOFF),
                share_pct(ranked, data.total_volume)
            ),
            Style::default().fg(DIM),
        )));
    }

    f.render_widget(Paragraph::new(lines).block(card_block("AGGREGATORS")), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_volume_sums_settled_feeds() {
        let mut feeds = Feeds::new();
        assert_eq!(ecosystem_volume(&feeds), None);

        feeds.dex.complete(DexVolumeData {
            total_volume: 5_000_000.0,
            ..Default::default()
        });
        assert_eq!(ecosystem_volume(&feeds), Some(5_000_000.0));

        feeds.aggregator.complete(AggregatorData {
            total_volume: 2_000_000.0,
            ..Default::default()
        });
        assert_eq!(ecosystem_volume(&feeds), Some(7_000_000.0));
    }

    #[test]
    fn test_ecosystem_volume_with_aggregator_only() {
        let mut feeds = Feeds::new();
        feeds.dex.fail("offline");
        feeds.aggregator.complete(AggregatorData {
            total_volume: 3_000_000.0,
            ..Default::default()
        });
        assert_eq!(ecosystem_volume(&feeds), Some(3_000_000.0));
    }

    #[test]
    fn test_ratio_bar_proportions() {
        assert_eq!(ratio_bar(0.0, 10), "░░░░░░░░░░");
        assert_eq!(ratio_bar(1.0, 10), "██████████");
        assert_eq!(ratio_bar(0.5, 10), "█████░░░░░");
        assert_eq!(ratio_bar(0.25, 4), "█░░░");
    }

    #[test]
    fn test_ratio_bar_clamps_out_of_range() {
        assert_eq!(ratio_bar(1.7, 5), "█████");
        assert_eq!(ratio_bar(-0.3, 5), "░░░░░");
    }

    #[test]
    fn test_ratio_bar_width_is_constant() {
        for f in [0.0, 0.33, 0.66, 1.0] {
            assert_eq!(ratio_bar(f, 12).chars().count(), 12);
        }
    }
}
