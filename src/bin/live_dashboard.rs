//! Live Dashboard - Terminal UI over the live price stream
//!
//! Each configured watchlist is an independent consumer of the same
//! stream; toggling one shows how shared symbols stay subscribed.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use livefeed::application::monitor::ui;
use livefeed::{App, LiveFeedConfig};
use tradedesk_stream::bin_common::{load_config_from_env, ConfigType};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logging is disabled for the TUI: it would corrupt the alternate screen

    let config_path = load_config_from_env(ConfigType::LiveFeed);
    let config = LiveFeedConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let runtime = tokio::runtime::Runtime::new()?;

    let mut app = runtime.block_on(async { App::initialize(runtime.handle().clone(), &config).await })?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.poll_events();
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('j') | KeyCode::Down => app.next_watchlist(),
                        KeyCode::Char('k') | KeyCode::Up => app.prev_watchlist(),
                        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
