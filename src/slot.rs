//! Single named text slot backing the certification store.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait DurableSlot: Send + Sync {
    /// `Ok(None)` when the slot has never been written or was deleted.
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the whole slot.
    fn save(&self, raw: &str) -> Result<()>;

    fn delete(&self) -> Result<()>;
}

/// JSON file on local disk. Writes go to a sibling temp file first and are
/// renamed over the target.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DurableSlot for FileSlot {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        Ok(Some(data))
    }

    fn save(&self, raw: &str) -> Result<()> {
        let temp = self.temp_path();
        fs::write(&temp, raw)
            .with_context(|| format!("Failed to write to storage file {}", temp.display()))?;
        fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace storage file {}", self.path.display()))?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete storage file {}", self.path.display())),
        }
    }
}

/// In-process slot, shared between clones. Used by tests and embedders that
/// want a store without touching disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    inner: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DurableSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>> {
        let guard = self.inner.lock().map_err(|_| anyhow!("Memory slot lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, raw: &str) -> Result<()> {
        let mut guard = self.inner.lock().map_err(|_| anyhow!("Memory slot lock poisoned"))?;
        *guard = Some(raw.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        let mut guard = self.inner.lock().map_err(|_| anyhow!("Memory slot lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
