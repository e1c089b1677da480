//! Page navigation and per-page rendering.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::feed::merge::merge_feeds;
use crate::feed::Feeds;
use crate::format::{format_signed_pct, format_usd, share_pct, truncate_name};
use crate::ui::cards::{
    placeholder_or_data, ratio_bar, render_aggregator_card, render_dex_strip, render_flow_card,
    render_totals, render_tvl_card, TOP_LIST,
};
use crate::ui::treemap::TreemapView;
use crate::ui::{change_color, ACCENT, BRIGHT, CREAM, DIM, DOWN, TEAL, UP};

/// Stacked TVL bars shown on the TVL detail page.
const TVL_STACKED: usize = 15;
/// Axis-label budget of the stacked TVL bars.
const TVL_LABEL_BUDGET: usize = 12;
/// Aggregators shown in the detail-page chart.
const AGGREGATOR_CHART: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Overview,
    DexVolume,
    Tvl,
    Revenue,
    Fees,
    Aggregator,
    Protocols,
}

impl Page {
    const ALL: [Page; 7] = [
        Page::Overview,
        Page::DexVolume,
        Page::Tvl,
        Page::Revenue,
        Page::Fees,
        Page::Aggregator,
        Page::Protocols,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::DexVolume => "DEX Volume",
            Page::Tvl => "TVL",
            Page::Revenue => "Revenue",
            Page::Fees => "Fees",
            Page::Aggregator => "Aggregators",
            Page::Protocols => "Protocols",
        }
    }

    pub fn next(self) -> Page {
        let idx = Page::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Page::ALL[(idx + 1) % Page::ALL.len()]
    }
}

/// What the event loop should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    None,
}

/// Cached treemap layout: valid while the DEX feed's settle time and the
/// target area are unchanged, so hover redraws reuse the geometry and the
/// reveal clock only restarts when the DEX data itself changes. Other feeds
/// settling must not touch it.
struct TreemapCache {
    settled_at: Option<DateTime<Utc>>,
    area: Rect,
    view: TreemapView,
}

/// UI state owned by the event loop: the active page, the last pointer
/// position, and the treemap cache.
#[derive(Default)]
pub struct App {
    pub page: Page,
    pub mouse: Option<(u16, u16)>,
    treemap: Option<TreemapCache>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Tab => self.page = self.page.next(),
            KeyCode::Char('1') => self.page = Page::Overview,
            KeyCode::Char('2') => self.page = Page::DexVolume,
            KeyCode::Char('3') => self.page = Page::Tvl,
            KeyCode::Char('4') => self.page = Page::Revenue,
            KeyCode::Char('5') => self.page = Page::Fees,
            KeyCode::Char('6') => self.page = Page::Aggregator,
            KeyCode::Char('7') => self.page = Page::Protocols,
            _ => {}
        }
        Action::None
    }

    pub fn on_mouse(&mut self, event: MouseEvent) {
        if let MouseEventKind::Moved = event.kind {
            self.mouse = Some((event.column, event.row));
        }
    }

    /// The treemap for `area`, rebuilt when the DEX snapshot or the area
    /// changed.
    fn treemap_view(&mut self, feeds: &Feeds, area: Rect) -> Option<&TreemapView> {
        let data = feeds.dex.data.as_ref()?.treemap_data()?;
        let stale = match &self.treemap {
            Some(cache) => cache.settled_at != feeds.dex.settled_at || cache.area != area,
            None => true,
        };
        if stale {
            self.treemap = Some(TreemapCache {
                settled_at: feeds.dex.settled_at,
                area,
                view: TreemapView::build(&data, area),
            });
        }
        self.treemap.as_ref().map(|cache| &cache.view)
    }

    pub fn render(&mut self, f: &mut Frame, feeds: &Feeds) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(f.area());

        match self.page {
            Page::Overview => self.render_overview(f, chunks[0], feeds),
            Page::DexVolume => self.render_dex_page(f, chunks[0], feeds),
            Page::Tvl => render_tvl_page(f, chunks[0], feeds),
            Page::Revenue => render_flow_page(f, chunks[0], "REVENUE", feeds, true),
            Page::Fees => render_flow_page(f, chunks[0], "FEES", feeds, false),
            Page::Aggregator => render_aggregator_page(f, chunks[0], feeds),
            Page::Protocols => render_protocols_page(f, chunks[0], feeds),
        }

        render_status_bar(f, chunks[1], self.page, feeds);
    }

    fn render_overview(&mut self, f: &mut Frame, area: Rect, feeds: &Feeds) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(26),
                Constraint::Min(40),
                Constraint::Length(42),
            ])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(top[2]);

        render_totals(f, top[0], feeds);
        self.render_dex_card(f, top[1], feeds);
        render_tvl_card(f, right[0], &feeds.tvl);
        render_aggregator_card(f, right[1], &feeds.aggregator);
        render_flow_card(f, bottom[0], "REVENUE", &feeds.revenue);
        render_flow_card(f, bottom[1], "FEES", &feeds.fees);
    }

    fn render_dex_card(&mut self, f: &mut Frame, area: Rect, feeds: &Feeds) {
        let Some(data) = placeholder_or_data(f, area, "DEX VOLUME", &feeds.dex) else {
            return;
        };

        let block = Block::default()
            .title(format!(" DEX VOLUME {} ", format_usd(data.total_volume)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(DIM))
            .title_style(Style::default().fg(CREAM).add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(1)])
            .split(inner);

        let mouse = self.mouse;
        if let Some(view) = self.treemap_view(feeds, chunks[0]) {
            view.render(f, mouse);
        }
        render_dex_strip(f, chunks[1], data);
    }

    fn render_dex_page(&mut self, f: &mut Frame, area: Rect, feeds: &Feeds) {
        let Some(data) = placeholder_or_data(f, area, "DEX VOLUME", &feeds.dex) else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(2)])
            .split(area);

        let raydium_line = data.raydium_amm().map(|p| {
            let mut spans = vec![
                Span::styled("Raydium AMM  ", Style::default().fg(CREAM).add_modifier(Modifier::BOLD)),
                Span::styled(format_usd(p.total24h), Style::default().fg(BRIGHT)),
                Span::styled(
                    format!("  {:.1}% of market", share_pct(p.total24h, data.total_volume)),
                    Style::default().fg(DIM),
                ),
            ];
            if let Some(change) = p.change_1d {
                spans.push(Span::styled(
                    format!("  24h {}", format_signed_pct(change)),
                    Style::default().fg(change_color(change)),
                ));
            }
            if let Some(change) = p.change_7d {
                spans.push(Span::styled(
                    format!("  7d {}", format_signed_pct(change)),
                    Style::default().fg(change_color(change)),
                ));
            }
            Line::from(spans)
        });

        let mouse = self.mouse;
        if let Some(view) = self.treemap_view(feeds, chunks[0]) {
            view.render(f, mouse);
        }
        if let Some(line) = raydium_line {
            f.render_widget(Paragraph::new(line), chunks[1]);
        }
    }
}

fn render_tvl_page(f: &mut Frame, area: Rect, feeds: &Feeds) {
    let Some(data) = placeholder_or_data(f, area, "TVL", &feeds.tvl) else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total TVL ", Style::default().fg(DIM)),
            Span::styled(
                format_usd(data.total_tvl),
                Style::default().fg(TEAL).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   Solana share ", Style::default().fg(DIM)),
            Span::styled(
                format!("{:.1}%", data.solana_share_pct()),
                Style::default().fg(BRIGHT),
            ),
        ]),
        Line::default(),
    ];

    let rows = data.chart_rows(TVL_STACKED, TVL_LABEL_BUDGET);
    let max_tvl = rows.first().map(|r| r.tvl).unwrap_or(0.0);
    let bar_width = 30usize;
    for row in &rows {
        // Stack Solana and other-chain TVL inside one proportional bar
        let scale = if max_tvl > 0.0 { row.tvl / max_tvl } else { 0.0 };
        let total_cells = ((scale * bar_width as f64).round() as usize).min(bar_width);
        let solana_cells = if row.tvl > 0.0 {
            ((row.solana_tvl / row.tvl) * total_cells as f64).round() as usize
        } else {
            0
        }
        .min(total_cells);
        let name_style = if row.is_raydium {
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BRIGHT)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", row.display_name.clone()), name_style),
            Span::styled("█".repeat(solana_cells), Style::default().fg(TEAL)),
            Span::styled(
                "█".repeat(total_cells - solana_cells),
                Style::default().fg(DIM),
            ),
            Span::raw("░".repeat(bar_width - total_cells)),
            Span::styled(format!(" {}", format_usd(row.tvl)), Style::default().fg(DIM)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("█", Style::default().fg(TEAL)),
        Span::styled(" Solana   ", Style::default().fg(DIM)),
        Span::styled("█", Style::default().fg(DIM)),
        Span::styled(" Other chains", Style::default().fg(DIM)),
    ]));

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" TVL ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DIM)),
        ),
        area,
    );
}

fn render_flow_page(f: &mut Frame, area: Rect, title: &str, feeds: &Feeds, revenue: bool) {
    let state = if revenue { &feeds.revenue } else { &feeds.fees };
    let Some(data) = placeholder_or_data(f, area, title, state) else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("24h ", Style::default().fg(DIM)),
            Span::styled(
                format_usd(data.total24h),
                Style::default().fg(CREAM).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   7d ", Style::default().fg(DIM)),
            Span::styled(format_usd(data.total7d), Style::default().fg(BRIGHT)),
            Span::styled("   30d ", Style::default().fg(DIM)),
            Span::styled(format_usd(data.total30d), Style::default().fg(BRIGHT)),
            Span::styled("   1y ", Style::default().fg(DIM)),
            Span::styled(format_usd(data.total1y), Style::default().fg(BRIGHT)),
        ]),
        Line::default(),
    ];

    let leader = data.protocols.first().map(|p| p.total24h).unwrap_or(0.0);
    for (i, p) in data.top(TOP_LIST).iter().enumerate() {
        let bar = ratio_bar(if leader > 0.0 { p.total24h / leader } else { 0.0 }, 20);
        let name_style = if p.is_raydium {
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BRIGHT)
        };
        let mut spans = vec![
            Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(DIM)),
            Span::styled(
                format!("{:<18}", truncate_name(&p.display_name, 15)),
                name_style,
            ),
            Span::styled(bar, Style::default().fg(ACCENT)),
            Span::styled(
                format!(
                    " {:>8} {:>5.1}%",
                    format_usd(p.total24h),
                    share_pct(p.total24h, data.total24h)
                ),
                Style::default().fg(DIM),
            ),
        ];
        if let Some(change) = p.change_1d {
            spans.push(Span::styled(
                format!(" {change:+.1}%"),
                Style::default().fg(change_color(change)),
            ));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DIM)),
        ),
        area,
    );
}

fn render_aggregator_page(f: &mut Frame, area: Rect, feeds: &Feeds) {
    let Some(data) = placeholder_or_data(f, area, "AGGREGATORS", &feeds.aggregator) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let leader = data.protocols.first().map(|p| p.volume).unwrap_or(0.0);
    let mut chart = vec![
        Line::from(vec![
            Span::styled("Routed 24h ", Style::default().fg(DIM)),
            Span::styled(
                format_usd(data.total_volume),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::default(),
    ];
    for p in data.top(AGGREGATOR_CHART) {
        let bar = ratio_bar(if leader > 0.0 { p.volume / leader } else { 0.0 }, 24);
        let name_style = if p.is_raydium {
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BRIGHT)
        };
        chart.push(Line::from(vec![
            Span::styled(format!("{:<16}", p.display_name.clone()), name_style),
            Span::styled(bar, Style::default().fg(ACCENT)),
        ]));
    }
    f.render_widget(
        Paragraph::new(chart).block(
            Block::default()
                .title(" MARKET SHARE ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DIM)),
        ),
        chunks[0],
    );

    let mut list = Vec::new();
    for (i, p) in data.protocols.iter().enumerate() {
        list.push(Line::from(vec![
            Span::styled(format!("{:>3}. ", i + 1), Style::default().fg(DIM)),
            Span::styled(
                format!("{:<16}", p.display_name.clone()),
                if p.is_raydium {
                    Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(BRIGHT)
                },
            ),
            Span::styled(
                format!("{:>8} {:>5.1}%", format_usd(p.volume), data.share_pct(p)),
                Style::default().fg(DIM),
            ),
        ]));
    }
    f.render_widget(
        Paragraph::new(list).block(
            Block::default()
                .title(" ALL AGGREGATORS ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DIM)),
        ),
        chunks[1],
    );
}

fn render_protocols_page(f: &mut Frame, area: Rect, feeds: &Feeds) {
    let rows = merge_feeds(feeds);
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Waiting for the first feed…",
                Style::default().fg(DIM),
            )))
            .block(
                Block::default()
                    .title(" PROTOCOLS ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(DIM)),
            ),
            area,
        );
        return;
    }

    let cell = |value: Option<f64>| match value {
        Some(v) => Cell::from(format_usd(v)).style(Style::default().fg(BRIGHT)),
        None => Cell::from("—").style(Style::default().fg(DIM)),
    };

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|p| {
            let name_style = if p.is_raydium {
                Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(BRIGHT)
            };
            Row::new(vec![
                Cell::from(truncate_name(&p.display_name, 18)).style(name_style),
                Cell::from(p.category.clone()).style(Style::default().fg(DIM)),
                cell(p.dex_volume_24h),
                cell(p.tvl),
                cell(p.revenue_24h),
                cell(p.fees_24h),
                cell(p.aggregator_volume),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(22),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec![
            "PROTOCOL", "CATEGORY", "VOLUME", "TVL", "REVENUE", "FEES", "AGG",
        ])
        .style(Style::default().fg(DIM).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(" PROTOCOLS ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(DIM)),
    );
    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, page: Page, feeds: &Feeds) {
    let mut spans = Vec::new();
    for (i, p) in Page::ALL.iter().enumerate() {
        let style = if *p == page {
            Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        spans.push(Span::styled(format!("[{}]{} ", i + 1, p.title()), style));
    }

    spans.push(Span::styled("| ", Style::default().fg(DIM)));
    let dot = |loading: bool, failed: bool| {
        let (glyph, color) = if loading {
            ("◌", DIM)
        } else if failed {
            ("●", DOWN)
        } else {
            ("●", UP)
        };
        Span::styled(format!("{glyph} "), Style::default().fg(color))
    };
    spans.push(dot(feeds.dex.loading, feeds.dex.error.is_some()));
    spans.push(dot(feeds.tvl.loading, feeds.tvl.error.is_some()));
    spans.push(dot(feeds.revenue.loading, feeds.revenue.error.is_some()));
    spans.push(dot(feeds.fees.loading, feeds.fees.error.is_some()));
    spans.push(dot(feeds.aggregator.loading, feeds.aggregator.error.is_some()));

    if let Some(updated) = feeds.updated_at {
        spans.push(Span::styled(
            format!("| updated {} ", updated.format("%H:%M:%S")),
            Style::default().fg(DIM),
        ));
    }
    spans.push(Span::styled(
        "| r refresh  q quit",
        Style::default().fg(DIM),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::dex::{DexVolumeData, RawDexProtocol};

    fn dex_data() -> DexVolumeData {
        DexVolumeData::from_raw(vec![RawDexProtocol {
            name: "Raydium AMM".to_string(),
            display_name: Some("Raydium AMM".to_string()),
            category: "Dexes".to_string(),
            logo: String::new(),
            total24h: 5_000_000.0,
            total7d: 35_000_000.0,
            total30d: 150_000_000.0,
            change_1d: Some(1.0),
            change_7d: Some(-2.0),
            chains: vec!["Solana".to_string()],
            latest_fetch_is_ok: true,
            parent_protocol: None,
            slug: None,
            disabled: false,
        }])
    }

    #[test]
    fn test_treemap_cache_survives_unrelated_feed_arrival() {
        let mut app = App::new();
        let mut feeds = Feeds::new();
        feeds.dex.complete(dex_data());
        feeds.updated_at = Some(Utc::now());
        let area = Rect::new(0, 0, 40, 20);

        assert!(app.treemap_view(&feeds, area).is_some());
        let built = app.treemap.as_ref().unwrap().view.revealed_at;

        // Another feed settling bumps the shared timestamp but not the DEX slot
        feeds.fees.fail("offline");
        feeds.updated_at = Some(Utc::now());
        assert!(app.treemap_view(&feeds, area).is_some());
        assert_eq!(app.treemap.as_ref().unwrap().view.revealed_at, built);
    }

    #[test]
    fn test_treemap_cache_rebuilds_on_new_dex_snapshot_or_resize() {
        let mut app = App::new();
        let mut feeds = Feeds::new();
        feeds.dex.complete(dex_data());
        let area = Rect::new(0, 0, 40, 20);
        assert!(app.treemap_view(&feeds, area).is_some());
        let first_key = app.treemap.as_ref().unwrap().settled_at;

        feeds.dex.complete(dex_data());
        feeds.dex.settled_at = first_key.map(|t| t + chrono::Duration::seconds(1));
        assert!(app.treemap_view(&feeds, area).is_some());
        assert_eq!(app.treemap.as_ref().unwrap().settled_at, feeds.dex.settled_at);

        let wider = Rect::new(0, 0, 60, 20);
        assert!(app.treemap_view(&feeds, wider).is_some());
        assert_eq!(app.treemap.as_ref().unwrap().area, wider);
    }

    #[test]
    fn test_page_keys_map_to_pages() {
        let mut app = App::new();
        assert_eq!(app.on_key(KeyCode::Char('3')), Action::None);
        assert_eq!(app.page, Page::Tvl);
        app.on_key(KeyCode::Char('7'));
        assert_eq!(app.page, Page::Protocols);
        app.on_key(KeyCode::Char('1'));
        assert_eq!(app.page, Page::Overview);
    }

    #[test]
    fn test_tab_cycles_through_every_page() {
        let mut app = App::new();
        let mut seen = vec![app.page];
        for _ in 0..Page::ALL.len() {
            app.on_key(KeyCode::Tab);
            seen.push(app.page);
        }
        assert_eq!(seen.first(), seen.last());
        for p in Page::ALL {
            assert!(seen.contains(&p));
        }
    }

    #[test]
    fn test_quit_and_refresh_actions() {
        let mut app = App::new();
        assert_eq!(app.on_key(KeyCode::Char('q')), Action::Quit);
        assert_eq!(app.on_key(KeyCode::Esc), Action::Quit);
        assert_eq!(app.on_key(KeyCode::Char('r')), Action::Refresh);
        assert_eq!(app.on_key(KeyCode::Char('x')), Action::None);
    }

    #[test]
    fn test_mouse_move_tracked() {
        let mut app = App::new();
        app.on_mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column: 12,
            row: 7,
            modifiers: crossterm::event::KeyModifiers::NONE,
        });
        assert_eq!(app.mouse, Some((12, 7)));
    }
}
