//! Snapshot files on disk.
//!
//! Handles reading and writing tournament snapshots for offline use:
//! - `.json` files holding one snapshot or an array of snapshots
//! - `.jsonl` recordings of a live feed, one snapshot per line

mod jsonl;

pub use jsonl::*;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::Tournament;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}:{line}: {source}", path.display())]
    Line {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Tournament>),
    One(Box<Tournament>),
}

/// Load every snapshot in `path`, in file order.
pub fn load_snapshots(path: &Path) -> Result<Vec<Tournament>, StorageError> {
    let is_jsonl = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jsonl"));

    if is_jsonl {
        return JsonlReader::new(path.to_path_buf()).read_all();
    }

    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let snapshots = match serde_json::from_str(&contents)? {
        OneOrMany::Many(all) => all,
        OneOrMany::One(one) => vec![*one],
    };
    Ok(snapshots)
}

/// Latest snapshot per tournament id; later entries replace earlier ones.
pub fn latest_snapshots(snapshots: Vec<Tournament>) -> Vec<Tournament> {
    let mut latest: Vec<Tournament> = Vec::new();
    for snapshot in snapshots {
        match latest.iter_mut().find(|t| t.id == snapshot.id) {
            Some(existing) => *existing = snapshot,
            None => latest.push(snapshot),
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_single_json_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("one.json");
        let t = tournament(vec![user("1", "Alice", "Aoki")], vec![]);
        std::fs::write(&path, serde_json::to_string(&t).unwrap()).unwrap();

        let loaded = load_snapshots(&path).unwrap();
        assert_eq!(loaded, vec![t]);
    }

    #[test]
    fn test_load_json_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("many.json");
        let t = tournament(vec![], vec![]);
        std::fs::write(&path, serde_json::to_string(&vec![&t, &t]).unwrap()).unwrap();

        assert_eq!(load_snapshots(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_jsonl_recording() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("feed.jsonl");
        let writer = JsonlWriter::new(path.clone());
        let t = tournament(vec![], vec![]);
        writer.append(&t).unwrap();
        writer.append(&t).unwrap();

        assert_eq!(load_snapshots(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_snapshots(&temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StorageError::PathNotFound(_)));
    }

    #[test]
    fn test_latest_snapshots_keeps_last_per_id() {
        let first = tournament(vec![], vec![]);
        let mut second = first.clone();
        second.name = "Renamed".to_string();
        let mut other = first.clone();
        other.id = "t2".into();

        let latest = latest_snapshots(vec![first, other, second]);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].name, "Renamed");
        assert_eq!(latest[1].id.as_str(), "t2");
    }
}
