//! App: terminal init, main loop, drop timer, key handling, restart and score submission.

use crate::GameConfig;
use crate::game::{Game, MoveOutcome, Movement};
use crate::input::{Action, NameEdit, edit_name, key_to_action};
use crate::leaderboard::{self, Leaderboard, ScoreRecord};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// ~60 FPS: effect redraws, and the poll period while the drop timer is idle.
const FRAME_DURATION: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Whether the loop keeps running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    game: Game,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    leaderboard: Box<dyn Leaderboard>,
    top_scores: Vec<ScoreRecord>,
    /// Name being typed on the game-over screen; only set for a qualifying score.
    name_prompt: Option<String>,
    /// TachyonFX flash over the board after a line clear.
    line_clear_effect: Option<Effect>,
    /// Last time we processed the line-clear effect (for delta).
    line_clear_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, leaderboard: Box<dyn Leaderboard>) -> Self {
        let game = Game::new(&config.engine);
        let top_scores = leaderboard::top_or_empty(leaderboard.as_ref());
        Self {
            config,
            theme,
            game,
            screen: Screen::Playing,
            paused: false,
            last_tick: Instant::now(),
            leaderboard,
            top_scores,
            name_prompt: None,
            line_clear_effect: None,
            line_clear_effect_process_time: None,
        }
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_ms)
    }

    /// Throw the current game away and start a fresh one.
    fn restart(&mut self) {
        self.game = Game::new(&self.config.engine);
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_tick = Instant::now();
        self.name_prompt = None;
        self.line_clear_effect = None;
        self.line_clear_effect_process_time = None;
    }

    fn step(&mut self, movement: Movement) {
        if let MoveOutcome::Locked { lines } = self.game.move_piece(movement) {
            if lines > 0 && !self.config.no_animation {
                self.line_clear_effect = Some(crate::ui::line_clear_flash(&self.theme));
                self.line_clear_effect_process_time = None;
            }
        }
        if self.game.game_over && self.screen == Screen::Playing {
            self.screen = Screen::GameOver;
            self.line_clear_effect = None;
            self.name_prompt = leaderboard::qualifies(self.game.score, self.config.submit_threshold)
                .then(String::new);
        }
    }

    /// Drop timer: one row down per elapsed interval while playing.
    fn tick(&mut self, now: Instant) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        if now.saturating_duration_since(self.last_tick) >= self.tick_interval() {
            self.last_tick = now;
            self.step(Movement::down());
        }
    }

    /// Store the typed name with the final score. A failed write is dropped without retry.
    fn submit_score(&mut self) {
        let Some(name) = self.name_prompt.take() else {
            return;
        };
        let record = ScoreRecord {
            name: name.trim().to_string(),
            score: self.game.score,
        };
        let _ = self.leaderboard.submit(record);
        self.top_scores = leaderboard::top_or_empty(self.leaderboard.as_ref());
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        match self.screen {
            Screen::Playing => {
                let action = key_to_action(key);
                match action {
                    Action::Quit => return Flow::Quit,
                    Action::Pause => {
                        self.paused = !self.paused;
                        if !self.paused {
                            self.last_tick = Instant::now();
                        }
                    }
                    _ if self.paused => {}
                    _ => {
                        if let Some(movement) = action.movement() {
                            self.step(movement);
                        }
                    }
                }
            }
            Screen::GameOver => {
                if let Some(name) = self.name_prompt.as_mut() {
                    match edit_name(name, key) {
                        NameEdit::Submit => {
                            self.submit_score();
                            self.restart();
                        }
                        NameEdit::Cancel => self.restart(),
                        NameEdit::Quit => return Flow::Quit,
                        NameEdit::Edited | NameEdit::Ignored => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Enter | KeyCode::Char('r' | 'R') => self.restart(),
                        _ if key_to_action(key) == Action::Quit => return Flow::Quit,
                        _ => {}
                    }
                }
            }
        }
        Flow::Continue
    }

    /// How long the loop may block on input: until the next drop while the timer runs,
    /// one frame while an effect is running or the timer is stopped (pause, game over).
    fn poll_timeout(&self, now: Instant) -> Duration {
        if self.screen != Screen::Playing || self.paused {
            return FRAME_DURATION;
        }
        let until_tick = self
            .tick_interval()
            .saturating_sub(now.saturating_duration_since(self.last_tick));
        if self.line_clear_effect.is_some() {
            until_tick.min(FRAME_DURATION)
        } else {
            until_tick
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.game,
                    &self.theme,
                    self.paused,
                    &self.top_scores,
                    self.name_prompt.as_deref(),
                    &mut self.line_clear_effect,
                    &mut self.line_clear_effect_process_time,
                    now,
                );
            })?;

            if self.line_clear_effect.as_ref().is_some_and(Effect::done) {
                self.line_clear_effect = None;
                self.line_clear_effect_process_time = None;
            }

            if event::poll(self.poll_timeout(now))? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                            continue;
                        }
                        if self.handle_key(key) == Flow::Quit {
                            return Ok(());
                        }
                    }
                }
            }

            self.tick(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Cell, EngineConfig, Piece, ShapeKind};
    use crate::leaderboard::MemoryLeaderboard;
    use crossterm::event::KeyModifiers;

    fn config() -> GameConfig {
        GameConfig {
            engine: EngineConfig {
                seed: Some(3),
                ..EngineConfig::default()
            },
            tick_ms: 500,
            submit_threshold: 1000,
            no_animation: true,
        }
    }

    fn app() -> App {
        App::new(config(), Theme::default(), Box::new(MemoryLeaderboard::default()))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert_eq!(app.handle_key(key(KeyCode::Char(c))), Flow::Continue);
        }
    }

    /// Put the app one drop away from game over, with `score` already earned.
    fn about_to_lose(app: &mut App, score: u32) {
        let mut board = Board::new(10, 20);
        for y in 1..20 {
            for x in 0..10 {
                if x != 9 {
                    board.set(x, y, Cell::Locked);
                }
            }
        }
        let mut game = Game::from_board(board, Some(Piece::new(ShapeKind::I, 3, 0)), &app.config.engine);
        game.score = score;
        app.game = game;
    }

    #[test]
    fn test_tick_drops_piece_after_interval() {
        let mut app = app();
        let start = app.last_tick;
        let y0 = app.game.piece.as_ref().unwrap().y;
        app.tick(start + Duration::from_millis(100));
        assert_eq!(app.game.piece.as_ref().unwrap().y, y0);
        app.tick(start + Duration::from_millis(500));
        assert_eq!(app.game.piece.as_ref().unwrap().y, y0 + 1);
    }

    #[test]
    fn test_pause_freezes_timer_and_moves() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('p')));
        assert!(app.paused);
        let before = app.game.piece.clone();
        app.tick(app.last_tick + Duration::from_secs(5));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.game.piece, before);
        app.handle_key(key(KeyCode::Char('p')));
        app.handle_key(key(KeyCode::Down));
        assert_ne!(app.game.piece, before);
    }

    #[test]
    fn test_resume_restarts_drop_interval() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('p')));
        if let Some(stale) = app.last_tick.checked_sub(Duration::from_secs(2)) {
            app.last_tick = stale;
        }
        let before_resume = Instant::now();
        app.handle_key(key(KeyCode::Char('p')));
        assert!(!app.paused);
        assert!(app.last_tick >= before_resume);

        let y0 = app.game.piece.as_ref().unwrap().y;
        app.tick(before_resume + Duration::from_millis(100));
        assert_eq!(app.game.piece.as_ref().unwrap().y, y0);
    }

    #[test]
    fn test_poll_timeout_waits_for_next_drop() {
        let app = app();
        let timeout = app.poll_timeout(app.last_tick + Duration::from_millis(100));
        assert_eq!(timeout, Duration::from_millis(400));
        assert_eq!(app.poll_timeout(app.last_tick + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn test_poll_timeout_while_paused_is_one_frame() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('p')));
        let timeout = app.poll_timeout(app.last_tick + Duration::from_secs(2));
        assert_eq!(timeout, FRAME_DURATION);
    }

    #[test]
    fn test_poll_timeout_on_game_over_is_one_frame() {
        let mut app = app();
        about_to_lose(&mut app, 2000);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.screen, Screen::GameOver);
        let timeout = app.poll_timeout(app.last_tick + Duration::from_secs(2));
        assert_eq!(timeout, FRAME_DURATION);
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Flow::Quit);
    }

    #[test]
    fn test_low_score_game_over_has_no_prompt() {
        let mut app = app();
        about_to_lose(&mut app, 1000);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.screen, Screen::GameOver);
        assert!(app.name_prompt.is_none());

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.screen, Screen::Playing);
        assert!(!app.game.game_over);
        assert_eq!(app.game.score, 0);
    }

    #[test]
    fn test_qualifying_score_is_submitted_then_restarts() {
        let mut app = app();
        about_to_lose(&mut app, 1300);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.screen, Screen::GameOver);
        assert_eq!(app.name_prompt.as_deref(), Some(""));

        // r and q are plain letters while typing a name.
        type_text(&mut app, "rq");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(
            app.top_scores,
            vec![ScoreRecord {
                name: "rq".to_string(),
                score: 1300
            }]
        );
    }

    #[test]
    fn test_blank_name_is_not_submitted() {
        let mut app = app();
        about_to_lose(&mut app, 2000);
        app.handle_key(key(KeyCode::Down));
        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::GameOver);
        assert!(app.top_scores.is_empty());
    }

    #[test]
    fn test_escape_skips_submission() {
        let mut app = app();
        about_to_lose(&mut app, 5000);
        app.handle_key(key(KeyCode::Down));
        type_text(&mut app, "zed");
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.top_scores.is_empty());
    }

    #[test]
    fn test_timer_stops_after_game_over() {
        let mut app = app();
        about_to_lose(&mut app, 0);
        app.tick(app.last_tick + Duration::from_millis(500));
        assert_eq!(app.screen, Screen::GameOver);
        let board = app.game.board.clone();
        app.tick(Instant::now() + Duration::from_secs(10));
        assert_eq!(app.game.board, board);
    }
}
