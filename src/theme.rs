//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::Cell;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Cell and UI colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Board cell colours indexed by `Cell::value()`: empty, falling, locked.
    pub cells: [Color; 3],
    /// Panel background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, names).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Hints and placeholder rows.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const EMPTY: Color = Color::Rgb(0x00, 0x00, 0x00);
const FALLING: Color = Color::Rgb(0x9C, 0xA3, 0xAF);
const LOCKED: Color = Color::Rgb(0xEF, 0x44, 0x44);
const BG: Color = Color::Rgb(0x11, 0x18, 0x27);
const DIV_LINE: Color = Color::Rgb(0x37, 0x41, 0x51);
const MAIN_FG: Color = Color::Rgb(0xF9, 0xFA, 0xFB);
const TITLE: Color = Color::Rgb(0xE5, 0xC0, 0x7B);
const INACTIVE_FG: Color = Color::Rgb(0x6B, 0x72, 0x80);

impl Default for Theme {
    /// Black board, silver falling blocks, red locked blocks on a dark grey panel.
    fn default() -> Self {
        Self {
            cells: [EMPTY, FALLING, LOCKED],
            bg: BG,
            div_line: DIV_LINE,
            main_fg: MAIN_FG,
            title: TITLE,
            inactive_fg: INACTIVE_FG,
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override the falling/locked colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.cells[1] = Color::Rgb(0xFF, 0xFF, 0xFF);
                self.cells[2] = Color::Rgb(0xFF, 0x00, 0x00);
            }
            crate::Palette::Colorblind => {
                // Blue/orange pair instead of grey/red.
                self.cells[1] = Color::Rgb(0x00, 0x77, 0xBB);
                self.cells[2] = Color::Rgb(0xEE, 0x77, 0x33);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()))
                .unwrap_or(fallback)
        };
        Self {
            cells: [
                get(&["cell_empty", "main_bg"], EMPTY),
                get(&["cell_falling", "inactive_fg"], FALLING),
                get(&["cell_locked", "cpu_end", "temp_end"], LOCKED),
            ],
            bg: get(&["meter_bg"], BG),
            div_line: get(&["div_line"], DIV_LINE),
            main_fg: get(&["main_fg"], MAIN_FG),
            title: get(&["title"], TITLE),
            inactive_fg: get(&["graph_text", "inactive_fg"], INACTIVE_FG),
        }
    }

    #[inline]
    pub fn cell_color(&self, cell: Cell) -> Color {
        self.cells[cell.value() as usize]
    }
}

/// Parse btop-style theme file into key -> value map. Quotes are stripped from values.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    match s.len() {
        6 if s.is_ascii() => Ok(Color::Rgb(channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)),
        3 if s.is_ascii() => Ok(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#EF4444").unwrap();
        assert!(matches!(c, Color::Rgb(0xEF, 0x44, 0x44)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("zzzzzz").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_cell_colours_are_distinct() {
        for palette in [crate::Palette::Normal, crate::Palette::HighContrast, crate::Palette::Colorblind] {
            let mut theme = Theme::default();
            theme.apply_palette(palette);
            let [empty, falling, locked] = theme.cells;
            assert!(empty != falling && falling != locked && empty != locked);
        }
    }

    #[test]
    fn test_theme_file_overrides_cells() {
        let map = parse_theme_file("theme[cell_locked]='#00FF00'\n# comment\ntheme[main_bg]=\"#101010\"");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.cell_color(Cell::Locked), Color::Rgb(0, 255, 0));
        assert_eq!(theme.cell_color(Cell::Empty), Color::Rgb(0x10, 0x10, 0x10));
        assert_eq!(theme.cell_color(Cell::Falling), FALLING);
    }
}
