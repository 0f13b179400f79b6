//! JSON array files on disk.
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so readers never observe a half-written file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use crate::error::{QueueError, QueueResult};

/// Read a JSON array. Returns `None` when the file does not exist.
pub async fn read_array<T: DeserializeOwned>(path: &Path) -> QueueResult<Option<Vec<T>>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| QueueError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize with 4-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> QueueResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Replace `path` with the pretty-printed JSON of `value`.
pub async fn write_array<T: Serialize>(path: &Path, value: &[T]) -> QueueResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_path(path);
    fs::write(&tmp, to_pretty_json(value)?).await?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let result: Option<Vec<u32>> = read_array(&dir.path().join("nope.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("values.json");

        write_array(&path, &[1u32, 2, 3]).await.unwrap();

        let values: Vec<u32> = read_array(&path).await.unwrap().unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert!(!temp_path(&path).exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    1,"), "expected 4-space indent: {text}");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2,").unwrap();

        let result: QueueResult<Option<Vec<u32>>> = read_array(&path).await;
        assert!(matches!(result, Err(QueueError::Corrupt { .. })));
    }
}
