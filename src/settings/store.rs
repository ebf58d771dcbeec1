use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key the controller reads/writes the soundtrack side preference under.
pub const SOUNDTRACK_SIDE_KEY: &str = "soundtrack_side";

const PREFS_FILE: &str = "prefs.json";

/// Small string-keyed preference store backed by a JSON file.
///
/// Reads are in-memory; writes mark the store dirty and hit disk on
/// [`PrefStore::flush`]. A missing or corrupt file falls back to an empty
/// store rather than failing; losing a preference beats refusing to start.
#[derive(Debug)]
pub struct PrefStore {
    path: PathBuf,
    values: HashMap<String, String>,
    dirty: bool,
}

impl PrefStore {
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join(PREFS_FILE);
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), err = %e, "corrupt prefs file, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values,
            dirty: false,
        }
    }

    /// Per-user data directory for this game, with a temp-dir fallback.
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "dualscore")
            .map(|dirs| dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("dualscore"))
    }

    pub fn get(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_owned())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if self.values.get(&key) == Some(&value) {
            return;
        }
        self.values.insert(key, value);
        self.dirty = true;
    }

    /// Writes pending changes via temp-file-then-rename so a crash mid-write
    /// never truncates the prefs file.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&self.values).unwrap_or_else(|_| b"{}".to_vec());
        fs::write(&tmp, bytes)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&self.path);
            fs::rename(&tmp, &self.path).map_err(|_| e)?;
        }
        self.dirty = false;
        Ok(())
    }
}
