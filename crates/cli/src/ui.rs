use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use noxo::{Coord, Player, SubBoard};

use crate::app::{App, Phase};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(13),
            Constraint::Min(0),
        ])
        .split(frame.area());

    render_status(frame, chunks[0], app);
    render_board(frame, chunks[1], app);
    render_help(frame, chunks[2], app);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(" noxo - {} ", app.mode_label());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let style = match app.phase() {
        Phase::SessionLost => Style::default().fg(Color::Red),
        Phase::GameOver => Style::default().fg(Color::Green),
        Phase::Playing => Style::default().fg(Color::White),
    };
    let paragraph = Paragraph::new(app.status().to_string())
        .block(block)
        .style(style);

    frame.render_widget(paragraph, area);
}

fn render_board(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines = Vec::with_capacity(11);
    for row in 0..9u8 {
        lines.push(board_row(app, row));
        if row == 2 || row == 5 {
            lines.push(Line::from(Span::styled(
                "──────┼───────┼──────",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn board_row(app: &App, row: u8) -> Line<'static> {
    let mut spans = Vec::new();
    for col in 0..9u8 {
        spans.push(cell_span(app, row, col));
        if col == 2 || col == 5 {
            spans.push(Span::styled(
                " │ ",
                Style::default().fg(Color::DarkGray),
            ));
        } else if col != 8 {
            spans.push(Span::raw(" "));
        }
    }
    Line::from(spans)
}

fn cell_span(app: &App, row: u8, col: u8) -> Span<'static> {
    let board = app.round().board();
    let outer = Coord::new(row / 3, col / 3);
    let inner = Coord::new(row % 3, col % 3);
    let sub = board.sub(outer);

    let (symbol, mut style) = if sub.played() {
        decided_cell(sub)
    } else {
        match sub.cell(inner) {
            Some(player) => (player.symbol(), mark_style(player)),
            None => {
                let style = if board.active_subboard() == Some(outer) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ('·', style)
            }
        }
    };

    if app.phase() == Phase::Playing && app.cursor() == (row, col) {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(symbol.to_string(), style)
}

/// A decided sub-board is covered by its winner's mark, the way the original
/// blits one big symbol over the grid; a drawn one is blanked out.
fn decided_cell(sub: &SubBoard) -> (char, Style) {
    match sub.winner() {
        Some(player) => (
            player.symbol(),
            mark_style(player).add_modifier(Modifier::BOLD),
        ),
        None => ('░', Style::default().fg(Color::DarkGray)),
    }
}

fn mark_style(player: Player) -> Style {
    match player {
        Player::Cross => Style::default().fg(Color::Red),
        Player::Nought => Style::default().fg(Color::Cyan),
    }
}

fn render_help(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = match app.phase() {
        Phase::Playing => "Arrows move the cursor, Enter plays, 'q' quits",
        Phase::GameOver if app.is_local_mode() => "Enter or 'r' starts a new round, 'q' quits",
        _ => "Press 'q' to quit",
    };

    let paragraph = Paragraph::new(text).block(block).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );
    frame.render_widget(paragraph, area);
}
