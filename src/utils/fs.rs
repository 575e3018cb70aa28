//! 檔案寫入工具
//!
//! 所有輸出都先寫進目的地同一目錄下的暫存檔，完成後再 rename 到目標路徑。
//! 失敗時暫存檔隨 `NamedTempFile` drop 一併刪除，不會留下寫到一半的檔案。

use crate::utils::error::{ClearcutError, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn temp_sibling(destination: &Path) -> Result<NamedTempFile> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".clearcut-").suffix(".part");
    // NamedTempFile 預設 0600；輸出檔要跟一般建立的檔案一樣套用 umask
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    builder
        .tempfile_in(parent)
        .map_err(|e| ClearcutError::io(destination, e))
}

fn persist(temp: NamedTempFile, destination: &Path) -> Result<()> {
    temp.persist(destination)
        .map_err(|e| ClearcutError::io(destination, e.error))?;
    Ok(())
}

pub fn write_atomically(destination: &Path, data: &[u8]) -> Result<()> {
    let mut temp = temp_sibling(destination)?;
    temp.write_all(data)
        .and_then(|_| temp.flush())
        .map_err(|e| ClearcutError::io(destination, e))?;
    persist(temp, destination)
}

/// 逐位元組複製，不經過解碼
pub fn copy_atomically(source: &Path, destination: &Path) -> Result<u64> {
    let mut reader = File::open(source).map_err(|e| ClearcutError::io(source, e))?;
    let mut temp = temp_sibling(destination)?;
    let copied = io::copy(&mut reader, temp.as_file_mut())
        .map_err(|e| ClearcutError::io(destination, e))?;
    persist(temp, destination)?;
    Ok(copied)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        tracing::debug!("Creating directory {}", path.display());
        fs::create_dir_all(path).map_err(|e| ClearcutError::io(path, e))?;
    }
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_atomically_leaves_only_destination() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.bin");

        write_atomically(&destination, b"payload").unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"payload");
        assert_eq!(entries(dir.path()), vec!["out.bin".to_string()]);
    }

    #[test]
    fn test_write_atomically_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.bin");
        fs::write(&destination, b"old contents").unwrap();

        write_atomically(&destination, b"new").unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"new");
    }

    #[test]
    fn test_copy_missing_source_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("copy.png");

        let err = copy_atomically(&dir.path().join("missing.png"), &destination).unwrap_err();

        assert!(matches!(err, ClearcutError::IoError { .. }));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("nope").join("out.bin");

        let err = write_atomically(&destination, b"data").unwrap_err();

        assert!(matches!(err, ClearcutError::IoError { .. }));
        assert!(!destination.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_outputs_get_regular_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;

        let plain = dir.path().join("plain.png");
        fs::write(&plain, b"source").unwrap();

        let written = dir.path().join("written.png");
        write_atomically(&written, b"payload").unwrap();
        let copied = dir.path().join("copied.png");
        copy_atomically(&plain, &copied).unwrap();

        assert_eq!(mode(&written), mode(&plain));
        assert_eq!(mode(&copied), mode(&plain));
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("a").join("b").join("file.png");

        ensure_parent_dir(&destination).unwrap();

        assert!(dir.path().join("a").join("b").is_dir());
    }
}
