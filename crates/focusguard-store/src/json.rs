//! JSON file block list store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{BlockListStore, StoreResult};

/// On-disk layout: one recognised key, other keys carried through untouched
#[derive(Debug, Default, Serialize, Deserialize)]
struct BlockListFile {
    #[serde(default)]
    blocked_apps: Vec<String>,

    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Block list persisted as a JSON object at a fixed path
pub struct JsonBlockListStore {
    path: PathBuf,
}

impl JsonBlockListStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> StoreResult<Option<BlockListFile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl BlockListStore for JsonBlockListStore {
    fn load(&self) -> StoreResult<Vec<String>> {
        let Some(file) = self.read_file()? else {
            debug!(path = %self.path.display(), "No block list file");
            return Ok(Vec::new());
        };

        // Duplicates in a hand-edited file collapse to their first occurrence
        let mut apps: Vec<String> = Vec::with_capacity(file.blocked_apps.len());
        for app in file.blocked_apps {
            if !app.is_empty() && !apps.contains(&app) {
                apps.push(app);
            }
        }

        info!(path = %self.path.display(), count = apps.len(), "Block list loaded");
        Ok(apps)
    }

    fn save(&self, apps: &[String]) -> StoreResult<()> {
        // Unreadable existing content is replaced rather than blocking the save
        let other = self
            .read_file()
            .ok()
            .flatten()
            .map(|f| f.other)
            .unwrap_or_default();

        let file = BlockListFile {
            blocked_apps: apps.to_vec(),
            other,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(&file)?)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), count = apps.len(), "Block list saved");
        Ok(())
    }
}
