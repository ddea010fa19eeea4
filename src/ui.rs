//! Layout and drawing: board, sidebar (score, controls, top scores), pause, game over.

use crate::app::Screen;
use crate::game::{Cell, Game};
use crate::leaderboard::{ScoreRecord, TOP_LIMIT};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell is two terminal columns wide so it reads as a square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 32;
/// Stats + gap + controls + gap + top scores (border + header + rows).
const SIDEBAR_HEIGHT: u16 = 4 + 1 + 7 + 1 + TOP_LIMIT as u16 + 3;
/// Duration of the line-clear flash (TachyonFX) in ms.
const LINE_CLEAR_FLASH_MS: u32 = 250;

/// Board size in terminal cells including its border.
fn board_outer_size(game: &Game) -> (u16, u16) {
    (
        game.board.width() as u16 * CELL_WIDTH + 2,
        game.board.height() as u16 + 2,
    )
}

fn bold(style: Style) -> Style {
    style.add_modifier(Modifier::BOLD)
}

/// Flash that fades the board from the title colour back to its real colours.
pub fn line_clear_flash(theme: &Theme) -> Effect {
    fx::fade_from(
        theme.title,
        theme.cell_color(Cell::Empty),
        (LINE_CLEAR_FLASH_MS, Interpolation::QuadOut),
    )
}

/// Draw current screen, with optional pause overlay. A running line-clear effect is advanced
/// over the board and `line_clear_process_time` updated.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    game: &Game,
    theme: &Theme,
    paused: bool,
    top_scores: &[ScoreRecord],
    name_prompt: Option<&str>,
    line_clear_effect: &mut Option<Effect>,
    line_clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    match screen {
        Screen::Playing => {
            let board_rect = draw_game(frame, game, theme, top_scores, area);
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
            if let Some(effect) = line_clear_effect {
                let delta = line_clear_process_time
                    .map(|t| now.saturating_duration_since(t))
                    .unwrap_or(std::time::Duration::ZERO);
                let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
                *line_clear_process_time = Some(now);
                frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
            }
        }
        Screen::GameOver => draw_game_over(frame, game, theme, name_prompt, area),
    }
}

/// Draw board + sidebar centred in `area`. Returns the board's inner rect.
fn draw_game(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    top_scores: &[ScoreRecord],
    area: Rect,
) -> Rect {
    let (bw, bh) = board_outer_size(game);
    let total_w = bw + SIDEBAR_WIDTH;
    let total_h = bh.max(SIDEBAR_HEIGHT);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let board_area = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    let board_rect = draw_board(frame, game, theme, board_area);
    draw_sidebar(frame, game, theme, top_scores, inner[1]);
    board_rect
}

fn draw_board(frame: &mut Frame, game: &Game, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Tetris ", bold(Style::default().fg(theme.title))));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let empty = theme.cell_color(Cell::Empty);
    let buf = frame.buffer_mut();
    for (y, row) in game.board.rows().enumerate() {
        let ry = inner.y + y as u16;
        if ry >= inner.y + inner.height {
            break;
        }
        for (x, &cell) in row.iter().enumerate() {
            let rx = inner.x + x as u16 * CELL_WIDTH;
            let (symbol, style) = match cell {
                Cell::Empty => (" ", Style::default().bg(empty)),
                Cell::Falling | Cell::Locked => ("█", Style::default().fg(theme.cell_color(cell)).bg(empty)),
            };
            for dx in 0..CELL_WIDTH {
                if rx + dx < inner.x + inner.width {
                    buf[(rx + dx, ry)].set_symbol(symbol).set_style(style);
                }
            }
        }
    }
    inner
}

fn sidebar_block(theme: &Theme, title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

fn draw_sidebar(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    top_scores: &[ScoreRecord],
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(7), // Controls
            Constraint::Length(1), // gap
            Constraint::Length(TOP_LIMIT as u16 + 3),
        ])
        .split(area);

    let stats = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(game.score.to_string(), bold(fg_style)),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(game.lines_cleared.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(stats)
        .block(sidebar_block(theme, " Stats "))
        .render(chunks[0], frame.buffer_mut());

    let controls = [
        ("←/→ h/l", "Move"),
        ("↑ k", "Rotate"),
        ("↓ j", "Drop"),
        ("P", "Pause"),
        ("Q", "Quit"),
    ]
    .into_iter()
    .map(|(keys, what)| {
        Line::from(vec![
            Span::styled(format!("{keys:<9}"), title_style),
            Span::styled(what, hint_style),
        ])
    })
    .collect::<Vec<_>>();
    Paragraph::new(controls)
        .block(sidebar_block(theme, " Controls "))
        .render(chunks[2], frame.buffer_mut());

    draw_top_scores(frame, theme, top_scores, chunks[4]);
}

/// Top scores table. An empty board still shows `TOP_LIMIT` blank rows.
fn draw_top_scores(frame: &mut Frame, theme: &Theme, top_scores: &[ScoreRecord], area: Rect) {
    let stripe = |i: usize| {
        let bg = if i % 2 == 0 { theme.bg } else { theme.div_line };
        Style::default().fg(theme.main_fg).bg(bg)
    };
    let rows: Vec<Row> = if top_scores.is_empty() {
        (0..TOP_LIMIT)
            .map(|i| Row::new(["", "", ""]).style(stripe(i)))
            .collect()
    } else {
        top_scores
            .iter()
            .take(TOP_LIMIT)
            .enumerate()
            .map(|(i, r)| {
                Row::new([format!("{}", i + 1), r.name.clone(), r.score.to_string()]).style(stripe(i))
            })
            .collect()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(7),
        ],
    )
    .header(Row::new(["#", "Name", "Score"]).style(bold(Style::default().fg(theme.title))))
    .block(sidebar_block(theme, " Top Scores "));
    frame.render_widget(table, area);
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    game: &Game,
    theme: &Theme,
    name_prompt: Option<&str>,
    area: Rect,
) {
    let popup_w = 44u16;
    let popup_h = if name_prompt.is_some() { 13 } else { 10 };
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            bold(Style::default().fg(Color::White).bg(theme.cell_color(Cell::Locked))),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Final Score: {} ", game.score), bold(fg))),
        Line::from(Span::styled(format!(" Lines: {} ", game.lines_cleared), fg)),
        Line::from(""),
    ];
    match name_prompt {
        Some(name) => {
            lines.push(Line::from(Span::styled(" New high score! Player name: ", Style::default().fg(theme.title))));
            lines.push(Line::from(Span::styled(
                format!(" {name}_ "),
                bold(Style::default().fg(theme.bg).bg(theme.main_fg)),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " Enter — Save score    Esc — Play again ",
                fg,
            )));
        }
        None => lines.push(Line::from(Span::styled(
            " Enter/R — Play again    Q — Quit ",
            fg,
        ))),
    }
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Tetrixtui ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}
