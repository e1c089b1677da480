/// Raydium Pulse - Solana DeFi terminal dashboard
///
/// Fetches five pre-computed metric snapshots (DEX volume, TVL, revenue,
/// fees, aggregator market share) and renders them as cards, bar charts,
/// and a squarified treemap with mouse hover.
use std::{
    error::Error,
    fs::OpenOptions,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use raydium_pulse::{spawn_feeds, Action, App, Feeds};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Logging goes to the file named by PULSE_LOG; stdout belongs to the TUI.
fn init_tracing() -> Result<(), Box<dyn Error>> {
    let Ok(path) = std::env::var("PULSE_LOG") else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing()?;

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let feeds = Arc::new(Mutex::new(Feeds::new()));
    spawn_feeds(&feeds).await;

    let mut app = App::new();
    // Short tick keeps the staggered reveal and hover feedback fluid
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        if last_tick.elapsed() >= tick_rate {
            let snapshot = {
                let guard = feeds.lock().await;
                guard.clone()
            };
            terminal.draw(|f| app.render(f, &snapshot))?;
            last_tick = Instant::now();
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match app.on_key(key.code) {
                    Action::Quit => break,
                    Action::Refresh => spawn_feeds(&feeds).await,
                    Action::None => {}
                },
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
