//! Tetrixtui: classic falling-block Tetris in the terminal, with a local leaderboard.

mod app;
mod game;
mod input;
mod leaderboard;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use game::EngineConfig;
use leaderboard::{FileLeaderboard, Leaderboard, MemoryLeaderboard};

/// Options derived from CLI that affect game behaviour (board size, drop timer, leaderboard threshold).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub tick_ms: u64,
    pub submit_threshold: u32,
    pub no_animation: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = load_theme(args.theme.as_deref(), args.palette);
    let config = GameConfig {
        engine: EngineConfig {
            width: args.width,
            height: args.height,
            pieces: args.pieces,
            seed: args.seed,
        },
        tick_ms: args.tick_ms,
        submit_threshold: args.submit_threshold,
        no_animation: args.no_animation,
    };
    let board: Box<dyn Leaderboard> = if args.ephemeral {
        Box::new(MemoryLeaderboard::default())
    } else {
        Box::new(FileLeaderboard::new(
            args.leaderboard.unwrap_or_else(leaderboard::default_path),
        ))
    };
    let mut app = App::new(config, theme, board);
    app.run()?;
    Ok(())
}

/// Theme file plus palette; an unreadable file falls back to the default colours, still with the palette.
fn load_theme(path: Option<&std::path::Path>, palette: Palette) -> theme::Theme {
    theme::Theme::load(path, palette).unwrap_or_else(|_| {
        let mut theme = theme::Theme::default();
        theme.apply_palette(palette);
        theme
    })
}

/// Classic Tetris in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tetrixtui",
    version,
    about = "Classic falling-block Tetris in the terminal. Clear full rows for 100 points each.",
    long_about = "Tetrixtui is a small terminal Tetris.\n\n\
        Pieces fall one row every tick. Complete a row of locked blocks to clear it for 100 points. \
        The game ends when a new piece cannot spawn. Scores above the submit threshold can be \
        saved to the leaderboard.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move    Up or k  Rotate    Down or j  Drop one row\n  \
        P  Pause    Q / Esc  Quit\n\n\
        GAME OVER:\n  Type a name and press Enter to save, Esc to play again without saving."
)]
pub struct Args {
    /// Board width in columns.
    #[arg(long, default_value_t = game::BOARD_X, value_name = "COLS", value_parser = clap::value_parser!(u16).range(4..=40))]
    pub width: u16,

    /// Board height in rows.
    #[arg(long, default_value_t = game::BOARD_Y, value_name = "ROWS", value_parser = clap::value_parser!(u16).range(4..=40))]
    pub height: u16,

    /// Drop timer period in milliseconds.
    #[arg(long, default_value = "500", value_name = "MS", value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_ms: u64,

    /// Piece catalog: classic (line, square, T) or standard (all seven tetrominoes).
    #[arg(long, default_value = "classic")]
    pub pieces: PieceSet,

    /// Seed for the piece generator (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// A final score must exceed this to be offered a leaderboard entry.
    #[arg(long, default_value = "1000", value_name = "POINTS")]
    pub submit_threshold: u32,

    /// Leaderboard JSON file. Defaults to the config dir (tetrixtui/leaderboard.json).
    #[arg(long, value_name = "FILE")]
    pub leaderboard: Option<std::path::PathBuf>,

    /// Keep the leaderboard in memory for this session only (nothing is written to disk).
    #[arg(long, conflicts_with = "leaderboard")]
    pub ephemeral: bool,

    /// Path to theme file (btop-style theme[key]=\"value\").
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the line-clear flash.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PieceSet {
    #[default]
    Classic,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
