//! Data-directory layout for the tutor bot.
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   logs/
//!     {stamp}_student-{id}.json     archive snapshots
//!     student_logs_tmp.json         crash-recovery checkpoint
//!   summaries/
//!     student-{id}.txt
//! ```

use std::path::{Path, PathBuf};

/// File name of the crash-recovery checkpoint inside `logs/`.
pub const CHECKPOINT_FILE: &str = "student_logs_tmp.json";

/// Paths under one data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Directory holding snapshots and the checkpoint.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.logs_dir().join(CHECKPOINT_FILE)
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.root.join("summaries")
    }

    pub fn summary_path(&self, student_id: &str) -> PathBuf {
        self.summaries_dir().join(format!("student-{student_id}.txt"))
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `TUTOR_DATA_DIR` environment variable
/// 2. `~/.tutor`
/// 3. `./.tutor`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TUTOR_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".tutor");
    }

    PathBuf::from(".tutor")
}

/// Write `content` to `path` without ever exposing a half-written file.
///
/// The bytes go to a sibling `.tmp` file first, which is then renamed over
/// the target. Parent directories are created as needed.
pub async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, content).await?;
    if let Err(err) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err);
    }
    Ok(())
}

/// Read a file, mapping "not found" to `None`.
pub async fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("/home/user/.tutor");
        assert_eq!(layout.config_path(), PathBuf::from("/home/user/.tutor/config.toml"));
        assert_eq!(
            layout.checkpoint_path(),
            PathBuf::from("/home/user/.tutor/logs/student_logs_tmp.json")
        );
        assert_eq!(
            layout.summary_path("10531"),
            PathBuf::from("/home/user/.tutor/summaries/student-10531.txt")
        );
    }

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("file.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");
        assert!(!dir.path().join("nested/deep/file.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_optional_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(read_optional(&dir.path().join("absent.txt")).await.unwrap().is_none());

        let path = dir.path().join("present.txt");
        tokio::fs::write(&path, "hi").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap().as_deref(), Some("hi"));
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: no other test in this crate reads TUTOR_DATA_DIR.
        unsafe {
            std::env::set_var("TUTOR_DATA_DIR", "/tmp/test-tutor");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-tutor"));
        unsafe {
            std::env::remove_var("TUTOR_DATA_DIR");
        }
    }
}
