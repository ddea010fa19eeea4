//! Leaderboard: score records, the storage trait, and a JSON file store (XDG config or ~/.config/tetrixtui).

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

const DIR_NAME: &str = "tetrixtui";
const FILENAME: &str = "leaderboard.json";

/// Number of records shown on the board.
pub const TOP_LIMIT: usize = 10;
/// Longest accepted player name, in characters.
pub const NAME_MAX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed leaderboard: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage for score records.
pub trait Leaderboard {
    /// At most `limit` records, highest score first. Equal scores keep submission order.
    fn top(&self, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError>;

    fn submit(&mut self, record: ScoreRecord) -> Result<(), LeaderboardError>;
}

fn ranked(mut records: Vec<ScoreRecord>, limit: usize) -> Vec<ScoreRecord> {
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records.truncate(limit);
    records
}

/// True if a final score earns a name prompt.
pub fn qualifies(score: u32, threshold: u32) -> bool {
    score > threshold
}

/// Top records for display; a failed read shows as an empty board.
pub fn top_or_empty(board: &dyn Leaderboard) -> Vec<ScoreRecord> {
    board.top(TOP_LIMIT).unwrap_or_default()
}

/// Default leaderboard file (config dir / tetrixtui / leaderboard.json).
pub fn default_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(DIR_NAME).join(FILENAME)
}

/// Records kept as a JSON array on disk. A missing file is an empty board.
#[derive(Debug, Clone)]
pub struct FileLeaderboard {
    path: PathBuf,
}

impl FileLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Leaderboard for FileLeaderboard {
    fn top(&self, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        Ok(ranked(self.load()?, limit))
    }

    /// Append and rewrite the file. Creates the config directory if needed.
    /// An unparseable file is replaced by a fresh board holding just this record.
    fn submit(&mut self, record: ScoreRecord) -> Result<(), LeaderboardError> {
        let mut records = match self.load() {
            Ok(records) => records,
            Err(LeaderboardError::Json(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        records.push(record);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&records)?)?;
        Ok(())
    }
}

/// In-process records; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderboard {
    records: Vec<ScoreRecord>,
}

impl Leaderboard for MemoryLeaderboard {
    fn top(&self, limit: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        Ok(ranked(self.records.clone(), limit))
    }

    fn submit(&mut self, record: ScoreRecord) -> Result<(), LeaderboardError> {
        self.records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: u32) -> ScoreRecord {
        ScoreRecord {
            name: name.to_string(),
            score,
        }
    }

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tetrixtui-test-{}-{}", std::process::id(), tag))
            .join(FILENAME)
    }

    #[test]
    fn test_top_orders_descending_and_limits() {
        let mut board = MemoryLeaderboard::default();
        for (i, score) in [300, 1200, 900, 4000, 100, 2500, 700, 1800, 1100, 500, 3100, 200]
            .into_iter()
            .enumerate()
        {
            board.submit(record(&format!("p{i}"), score)).unwrap();
        }
        let top = board.top(TOP_LIMIT).unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].score, 4000);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(top.iter().all(|r| r.score > 100));
    }

    #[test]
    fn test_ties_keep_submission_order() {
        let mut board = MemoryLeaderboard::default();
        board.submit(record("first", 1500)).unwrap();
        board.submit(record("second", 1500)).unwrap();
        let top = board.top(2).unwrap();
        assert_eq!(top[0].name, "first");
        assert_eq!(top[1].name, "second");
    }

    #[test]
    fn test_qualifies_is_strictly_greater() {
        assert!(!qualifies(1000, 1000));
        assert!(qualifies(1100, 1000));
        assert!(!qualifies(0, 1000));
    }

    #[test]
    fn test_file_missing_is_empty() {
        let board = FileLeaderboard::new(temp_file("missing"));
        assert!(board.top(TOP_LIMIT).unwrap().is_empty());
    }

    #[test]
    fn test_file_submit_persists() {
        let path = temp_file("persist");
        let _ = fs::remove_file(&path);
        let mut board = FileLeaderboard::new(&path);
        board.submit(record("ana", 1200)).unwrap();
        board.submit(record("bo", 3400)).unwrap();

        let reopened = FileLeaderboard::new(&path);
        assert_eq!(
            reopened.top(TOP_LIMIT).unwrap(),
            vec![record("bo", 3400), record("ana", 1200)]
        );
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_reads_as_empty_for_display() {
        let path = temp_file("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();
        let board = FileLeaderboard::new(&path);
        assert!(matches!(board.top(TOP_LIMIT), Err(LeaderboardError::Json(_))));
        assert!(top_or_empty(&board).is_empty());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_submit_replaces_malformed_file() {
        let path = temp_file("recover");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"[{\"name\": \"ana\", \"sc").unwrap();
        let mut board = FileLeaderboard::new(&path);
        board.submit(record("bo", 2200)).unwrap();
        board.submit(record("cy", 1400)).unwrap();
        assert_eq!(
            board.top(TOP_LIMIT).unwrap(),
            vec![record("bo", 2200), record("cy", 1400)]
        );
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_default_path_ends_with_app_file() {
        let path = default_path();
        assert!(path.ends_with(std::path::Path::new(DIR_NAME).join(FILENAME)));
    }
}
