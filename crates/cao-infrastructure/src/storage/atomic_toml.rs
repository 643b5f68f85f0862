//! Atomic TOML file operations.
//!
//! Writes go to a hidden temp file in the same directory, are synced, then
//! renamed over the target while holding an exclusive lock on a sibling
//! `.lock` file. Readers never observe a half-written file. The lock file is
//! left in place so every writer locks the same inode.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use cao_core::error::{CaoError, Result};
use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};

/// A typed handle to a TOML file that is replaced atomically.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// Returns `Ok(None)` when the file is missing or blank.
    pub fn load(&self) -> Result<Option<T>> {
        self.read()
    }

    /// Serializes `data` and replaces the file with it.
    pub fn save(&self, data: &T) -> Result<()> {
        let toml_string = toml::to_string_pretty(data)?;
        let _lock = FileLock::acquire(&self.path)?;
        self.write_atomically(toml_string.as_bytes())
    }

    /// Read-modify-write under one lock.
    ///
    /// `f` receives the stored value (`None` when missing) and returns the
    /// value to write. Nothing is written when `f` fails.
    pub fn update<F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Option<T>) -> Result<T>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let updated = f(self.read()?)?;
        let toml_string = toml::to_string_pretty(&updated)?;
        self.write_atomically(toml_string.as_bytes())?;
        Ok(updated)
    }

    fn read(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(bytes)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| CaoError::io(format!("{} has no parent directory", self.path.display())))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| CaoError::io(format!("{} has no file name", self.path.display())))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock on `<file>.lock`, released when dropped.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()
            .map_err(|e| CaoError::io(format!("failed to lock {}: {e}", lock_path.display())))?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_missing_and_blank_files_load_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.toml");
        let file = AtomicTomlFile::<Sample>::new(path.clone());
        assert!(file.load().unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("sample.toml");
        let file = AtomicTomlFile::<Sample>::new(path.clone());

        let sample = Sample {
            name: "cao".to_string(),
            count: 3,
        };
        file.save(&sample).unwrap();

        assert_eq!(file.load().unwrap(), Some(sample));
        assert!(!path.with_file_name(".sample.toml.tmp").exists());
        // Unlinking the lock would let a later writer lock a fresh inode.
        assert!(path.with_extension("lock").exists());
    }

    #[test]
    fn test_update_holds_lock_across_read_and_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.toml");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let file = AtomicTomlFile::<Sample>::new(path);
                    for _ in 0..10 {
                        file.update(|stored| {
                            let mut sample = stored.unwrap_or(Sample {
                                name: "counter".to_string(),
                                count: 0,
                            });
                            sample.count += 1;
                            Ok(sample)
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let file = AtomicTomlFile::<Sample>::new(path);
        assert_eq!(file.load().unwrap().map(|s| s.count), Some(40));
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.toml");
        let file = AtomicTomlFile::<Sample>::new(path);
        let sample = Sample {
            name: "cao".to_string(),
            count: 1,
        };
        file.save(&sample).unwrap();

        let err = file
            .update(|_| Err(CaoError::config("rejected")))
            .unwrap_err();

        assert!(err.is_config());
        assert_eq!(file.load().unwrap(), Some(sample));
    }

    #[test]
    fn test_malformed_file_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.toml");
        fs::write(&path, "name = ").unwrap();

        let err = AtomicTomlFile::<Sample>::new(path).load().unwrap_err();
        assert!(matches!(err, CaoError::Serialization { .. }));
    }
}
