//! Block list: unique application names in insertion order

use std::collections::HashSet;

/// Set of process names targeted during a session.
///
/// Membership is exact and case-sensitive. Insertion order is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    apps: Vec<String>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns false if it was already present or empty
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() || self.contains(&name) {
            return false;
        }
        self.apps.push(name);
        true
    }

    /// Remove a name; returns false if it was not present
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.apps.len();
        self.apps.retain(|a| a != name);
        self.apps.len() != before
    }

    pub fn clear(&mut self) -> bool {
        let had_any = !self.apps.is_empty();
        self.apps.clear();
        had_any
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.iter().any(|a| a == name)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.apps
    }

    /// Membership set for the scanner
    pub fn to_target_set(&self) -> HashSet<String> {
        self.apps.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for BlockList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = BlockList::new();
        for name in iter {
            list.add(name);
        }
        list
    }
}
