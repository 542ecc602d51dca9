//! Atomic file operations
//!
//! Table files are rewritten through a temporary sibling:
//!
//! 1. Write every row to `<table>.tmp`
//! 2. `sync_all()` the temp file
//! 3. Rename it over the table file (atomic on most filesystems)
//!
//! A crash leaves either the old table or the new one, never a partial file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Result type for atomic operations
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors that can occur during atomic operations
#[derive(Debug, thiserror::Error)]
pub enum AtomicError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Atomically replace `path` with one JSON document per row
pub fn write_jsonl<P, T>(path: P, rows: &[T]) -> AtomicResult<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Remove `.tmp` files left behind by an interrupted write
///
/// Called when a data directory is opened.
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> AtomicResult<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "tmp") {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_jsonl() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");

        write_jsonl(&path, &[json!({"id": "a"}), json!({"id": "b"})]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"id\":\"a\"}\n{\"id\":\"b\"}\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_write_jsonl_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("rows.jsonl");

        write_jsonl::<_, serde_json::Value>(&path, &[]).unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_cleanup_temp_files() {
        let temp_dir = TempDir::new().unwrap();

        fs::write(temp_dir.path().join("events.tmp"), "partial").unwrap();
        fs::write(temp_dir.path().join("events.jsonl"), "keep").unwrap();

        let cleaned = cleanup_temp_files(temp_dir.path()).unwrap();
        assert_eq!(cleaned, 1);
        assert!(temp_dir.path().join("events.jsonl").exists());
    }
}
