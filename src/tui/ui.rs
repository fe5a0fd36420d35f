//! Stateless rendering of a [`SessionView`].

use crate::session::{Phase, SessionView};
use crossline_board::{Cell, Mark, Position};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Renders the whole screen.
pub fn draw(frame: &mut Frame, view: &SessionView, cursor: Position) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(12),   // Board / menu
            Constraint::Length(3), // Status
            Constraint::Length(1), // Warning
            Constraint::Length(4), // Stats
            Constraint::Length(3), // Help
        ])
        .split(frame.area());

    let title = match (&view.nickname, &view.opponent_nickname) {
        (Some(me), Some(them)) => format!("Crossline - {} vs {}", me, them),
        (Some(me), None) => format!("Crossline - {}", me),
        _ => "Crossline - Tic Tac Toe".to_string(),
    };
    let title = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    if view.phase == Phase::Idle {
        draw_menu(frame, chunks[1]);
    } else {
        draw_board(frame, chunks[1], view, cursor);
    }

    let status = Paragraph::new(view.status.as_str())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, chunks[2]);

    let warning = Paragraph::new(view.warning.as_deref().unwrap_or(""))
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center);
    frame.render_widget(warning, chunks[3]);

    draw_stats(frame, chunks[4], view);

    let help = Paragraph::new(help_text(view))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[5]);
}

fn help_text(view: &SessionView) -> String {
    let mut parts: Vec<&str> = Vec::new();
    match view.phase {
        Phase::Idle => parts.extend(["O: Online", "F: Offline"]),
        Phase::AwaitingOpponent => parts.extend(["X/O: Prefer mark"]),
        Phase::Active if view.input_enabled => parts.extend(["Arrows+Enter or 1-9: Move"]),
        Phase::Active => {}
        Phase::Finished => {
            if view.play_again_visible {
                parts.push("R: Play again");
            }
            parts.extend(["O: New online", "F: New offline"]);
        }
        Phase::AwaitingRematch if view.rematch_prompt => {
            parts.extend(["Y: Accept", "N: Decline", "X/O: Prefer mark"])
        }
        Phase::AwaitingRematch => parts.extend(["N: Cancel", "X/O: Prefer mark"]),
    }
    if view.menu_visible && view.phase != Phase::Idle {
        parts.push("M: Menu");
    }
    parts.push("Q: Quit");
    parts.join(" | ")
}

fn draw_menu(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Choose a game mode",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("[O] Play online against another player"),
        Line::from("[F] Play offline against the computer"),
        Line::from("[Q] Quit"),
    ];
    let menu = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(menu, center_rect(area, 44, 8));
}

fn draw_stats(frame: &mut Frame, area: Rect, view: &SessionView) {
    let server = match &view.stats {
        Some(stats) => format!(
            "Online: {}  Active games: {}  Total games: {}",
            stats.online,
            stats.games,
            stats
                .total_games
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        None => "Server stats unavailable".to_string(),
    };
    let record = match &view.offline_stats {
        Some(stats) => format!(
            "Wins: {}  Losses: {}  Draws: {}",
            stats.wins, stats.losses, stats.draws
        ),
        None => String::new(),
    };
    let stats = Paragraph::new(vec![Line::from(server), Line::from(record)])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP).title("Stats"));
    frame.render_widget(stats, area);
}

fn draw_board(frame: &mut Frame, area: Rect, view: &SessionView, cursor: Position) {
    let board_area = center_rect(area, 40, 11);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(board_area);

    for row in 0..3 {
        draw_row(frame, rows[row * 2], view, cursor, row);
        if row < 2 {
            draw_separator(frame, rows[row * 2 + 1]);
        }
    }
}

fn draw_row(frame: &mut Frame, area: Rect, view: &SessionView, cursor: Position, row: usize) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
        ])
        .split(area);

    for col in 0..3 {
        if let Some(pos) = Position::from_row_col(row, col) {
            draw_cell(frame, cols[col * 2], view, cursor, pos);
        }
        if col < 2 {
            draw_separator_vertical(frame, cols[col * 2 + 1]);
        }
    }
}

fn draw_cell(frame: &mut Frame, area: Rect, view: &SessionView, cursor: Position, pos: Position) {
    let (symbol, base_style) = match view.cells[pos.to_index()] {
        Cell::Empty => ("   ", Style::default().fg(Color::DarkGray)),
        Cell::Marked(Mark::X) => (
            " X ",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Cell::Marked(Mark::O) => (
            " O ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    let style = if pos == cursor && view.input_enabled {
        base_style.bg(Color::White).fg(Color::Black)
    } else {
        base_style
    };

    let paragraph =
        Paragraph::new(Line::from(Span::styled(symbol, style))).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn draw_separator(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("──────────────────────────────────────")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn draw_separator_vertical(frame: &mut Frame, area: Rect) {
    let sep = Paragraph::new("│").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, area);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}
