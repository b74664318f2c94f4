use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use super::{SizeEntry, SizeStore, StoreError};

/// Keeps every entry in a single pretty-printed JSON array.
///
/// Each `save` rewrites the whole document, so inserts cost O(n).
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens `path`, creating parent directories and an empty array if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let p = path.as_ref().to_path_buf();
        if let Some(dir) = p.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            create_dir_all(dir)?;
        }
        if !p.exists() {
            fs::write(&p, "[]")?;
        }
        Ok(JsonFileStore { path: p })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SizeStore for JsonFileStore {
    fn load(&self) -> Result<Vec<SizeEntry>, StoreError> {
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, entries: &[SizeEntry]) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
