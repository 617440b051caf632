use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;

use crate::error::MedLensError;

const WATCHLIST_ENV: &str = "MEDLENS_WATCHLIST";

pub fn medlens_cache_dir() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => dir.join("medlens"),
        None => std::env::temp_dir().join("medlens"),
    }
}

pub fn medlens_data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("medlens"),
        None => std::env::temp_dir().join("medlens"),
    }
}

/// Location of the persisted watch list; `MEDLENS_WATCHLIST` overrides the data-dir default.
pub fn watchlist_path() -> PathBuf {
    std::env::var(WATCHLIST_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| medlens_data_dir().join("watchlist.json"))
}

/// Replaces `path` with `content` through a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, content: &str) -> Result<(), MedLensError> {
    let Some(dir) = path.parent() else {
        return Err(MedLensError::InvalidArgument(
            "Invalid storage path (no parent directory)".into(),
        ));
    };
    tokio::fs::create_dir_all(dir).await?;

    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "medlens".to_string());
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut tmp_path = None;
    let mut file_opt = None;
    for attempt in 0..32_u32 {
        let candidate = dir.join(format!(
            ".{stem}.{}.{}.tmp",
            std::process::id(),
            seed.saturating_add(attempt as u128)
        ));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => {
                tmp_path = Some(candidate);
                file_opt = Some(file);
                break;
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    let (Some(tmp_path), Some(mut file)) = (tmp_path, file_opt) else {
        return Err(MedLensError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "Unable to allocate temporary storage file",
        )));
    };

    let result = async {
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;
    if let Err(err) = result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir()
            .join(format!("medlens-storage-test-{suffix}"))
            .join(name)
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_and_overwrites() {
        let path = scratch_path("list.json");

        write_atomic(&path, "first").await.unwrap();
        write_atomic(&path, "second").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "second");

        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn write_atomic_failure_removes_temp_file() {
        let path = scratch_path("occupied");
        tokio::fs::create_dir_all(path.join("child")).await.unwrap();

        let err = write_atomic(&path, "payload").await.unwrap_err();
        assert!(matches!(err, MedLensError::Io(_)));

        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        assert!(path.join("child").is_dir());
    }

    #[test]
    fn data_and_cache_dirs_are_namespaced() {
        assert!(medlens_cache_dir().ends_with("medlens"));
        assert!(medlens_data_dir().ends_with("medlens"));
    }
}
