use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long to wait for another process to release the lock
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// A single text blob on disk, guarded by an advisory lock file.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// an interrupted write never leaves a half-written blob behind.
pub struct Storage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = sibling_with_suffix(&file_path, "lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Acquire an exclusive lock on the file for writing
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        wait_for_lock(&lock_file, &self.file_path, |f| FileExt::try_lock_exclusive(f))?;
        Ok(lock_file)
    }

    /// Acquire a shared lock on the file for reading
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        wait_for_lock(&lock_file, &self.file_path, |f| FileExt::try_lock_shared(f))?;
        Ok(Some(lock_file))
    }

    /// Reads the blob, or `None` if the file does not exist yet
    pub fn read(&self) -> Result<Option<String>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let _lock = self.acquire_read_lock()?;
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read file: {:?}", self.file_path))?;
        Ok(Some(content))
    }

    /// Replaces the whole blob atomically
    pub fn write(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut lock_file = self.acquire_write_lock()?;

        // Lock holder info, for debugging stale locks
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let tmp_path = sibling_with_suffix(&self.file_path, "tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write temp file: {:?}", tmp_path))?;
        fs::rename(&tmp_path, &self.file_path)
            .with_context(|| format!("Failed to replace {:?}", self.file_path))?;

        log::debug!("Wrote {} bytes to {:?}", content.len(), self.file_path);
        // Lock is released when lock_file is dropped
        Ok(())
    }
}

/// `selections.json` -> `selections.json.lock`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn wait_for_lock<F>(lock_file: &File, target: &Path, try_lock: F) -> Result<()>
where
    F: Fn(&File) -> std::io::Result<()>,
{
    let start = Instant::now();
    loop {
        match try_lock(lock_file) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if start.elapsed() > LOCK_TIMEOUT {
                    anyhow::bail!(
                        "Timeout waiting for file lock - another session may be saving: {:?}",
                        target
                    );
                }
                std::thread::sleep(LOCK_RETRY);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to acquire lock for {:?}", target))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("absent.json"));
        assert!(!storage.exists());
        assert_eq!(storage.read().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("blob.yaml");
        let storage = Storage::new(&path);

        storage.write("first").unwrap();
        storage.write("second").unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("nested").join("blob.yaml.tmp").exists());
        assert!(dir.path().join("nested").join("blob.yaml.lock").exists());
    }
}
