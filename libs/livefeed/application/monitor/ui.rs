//! UI widgets for the monitor

use chrono::Utc;
use hypersockets::ConnectionState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table},
    Frame,
};

use super::{App, PriceRow};

/// Draw the main UI layout
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_main(frame, app, chunks[1]);
    draw_footer(frame, app, chunks[2]);
}

fn state_style(state: ConnectionState) -> (&'static str, Color) {
    match state {
        ConnectionState::Open => ("Connected", Color::Green),
        ConnectionState::Connecting => ("Connecting...", Color::Yellow),
        ConnectionState::Closed => ("Reconnecting...", Color::Red),
        ConnectionState::Unmounted => ("Stopped", Color::DarkGray),
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status, status_color) = state_style(app.connection_state());
    let age = match app.feed_age() {
        Some(age) => format!("{}ms", age.as_millis()),
        None => "-".to_string(),
    };

    let header_text = format!(" Status: {} | {} | Feed age: {}", status, app.url(), age);

    let header = Paragraph::new(header_text)
        .style(Style::default().fg(status_color))
        .block(Block::default().borders(Borders::ALL).title(" Live Prices "));

    frame.render_widget(header, area);
}

fn draw_main(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(area);

    draw_watchlists(frame, app, columns[0]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(columns[1]);

    draw_prices(frame, app, rows[0]);
    draw_dashboard(frame, app, rows[1]);
}

fn draw_watchlists(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .watchlists
        .iter()
        .enumerate()
        .map(|(i, watchlist)| {
            let is_selected = i == app.selected_index;

            let style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if watchlist.active {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let marker = if watchlist.active { "[x] " } else { "[ ] " };

            ListItem::new(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(watchlist.name.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Watchlists "))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn price_row(row: &PriceRow) -> Row<'static> {
    let Some(entry) = &row.entry else {
        return Row::new(vec![
            Cell::from(row.symbol.clone()),
            Cell::from("(waiting...)"),
            Cell::from("-"),
            Cell::from("-"),
            Cell::from("-"),
            Cell::from(row.watchers.to_string()),
        ])
        .style(Style::default().fg(Color::DarkGray));
    };

    let change = match entry.change_percent {
        Some(pct) => {
            let color = if pct >= 0.0 { Color::Green } else { Color::Red };
            Cell::from(format!("{:+.2}%", pct)).style(Style::default().fg(color))
        }
        None => Cell::from("-"),
    };

    Row::new(vec![
        Cell::from(row.symbol.clone()),
        Cell::from(format!("{:.2}", entry.last_price)),
        change,
        Cell::from(entry.volume.map_or_else(|| "-".to_string(), |v| v.to_string())),
        Cell::from(entry.timestamp.clone()),
        Cell::from(row.watchers.to_string()),
    ])
}

fn draw_prices(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app.price_rows().iter().map(price_row).collect();

    let header = Row::new(vec!["SYMBOL", "PRICE", "CHANGE", "VOLUME", "TIMESTAMP", "WATCHERS"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Prices "));

    frame.render_widget(table, area);
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let lines: Vec<Line> = app
        .dashboard_summary()
        .into_iter()
        .map(|(kind, count, last)| {
            let last = match last {
                Some(at) => format!("{}s ago", (now - at).num_seconds().max(0)),
                None => "never".to_string(),
            };
            Line::from(format!(" {:<26} {:>6}   last: {}", kind.message_type(), count, last))
        })
        .collect();

    let summary = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Dashboard updates "));

    frame.render_widget(summary, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let metrics = match app.metrics() {
        Some(m) => format!(
            "sent {} | recv {} | reconnects {}",
            m.messages_sent, m.messages_received, m.reconnect_count
        ),
        None => String::new(),
    };
    let status = app.status_message.as_deref().unwrap_or("");

    let footer_text = if status.is_empty() {
        format!(" {} | q=quit j/k=nav space=toggle", metrics)
    } else {
        format!(" {} | {}", metrics, status)
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
