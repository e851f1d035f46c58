//! Store trait definitions

use std::sync::Mutex;
use tracing::warn;

use crate::StoreResult;

/// Persistence for the user's block list
pub trait BlockListStore: Send + Sync {
    /// Load the saved block list, in display order
    fn load(&self) -> StoreResult<Vec<String>>;

    /// Replace the saved block list
    fn save(&self, apps: &[String]) -> StoreResult<()>;

    /// Load, treating any failure as an empty list
    fn load_or_default(&self) -> Vec<String> {
        match self.load() {
            Ok(apps) => apps,
            Err(e) => {
                warn!(error = %e, "Failed to load block list, starting empty");
                Vec::new()
            }
        }
    }

    /// Save, logging and discarding any failure
    fn save_best_effort(&self, apps: &[String]) {
        if let Err(e) = self.save(apps) {
            warn!(error = %e, "Failed to save block list");
        }
    }
}

/// Block list store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    apps: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apps(apps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            apps: Mutex::new(apps.into_iter().map(Into::into).collect()),
        }
    }
}

impl BlockListStore for MemoryStore {
    fn load(&self) -> StoreResult<Vec<String>> {
        Ok(self.apps.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, apps: &[String]) -> StoreResult<()> {
        *self.apps.lock().unwrap_or_else(|e| e.into_inner()) = apps.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::with_apps(["Chess"]);
        assert_eq!(store.load().unwrap(), vec!["Chess".to_string()]);

        store.save(&["Slack".into(), "Discord".into()]).unwrap();
        assert_eq!(store.load_or_default(), vec!["Slack", "Discord"]);
    }
}
