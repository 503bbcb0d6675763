use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Hex MD5 of a listing's canonical url.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn of(url: &str) -> Self {
        Identity(format!("{:x}", md5::compute(url.as_bytes())))
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identities already notified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenSet(HashSet<Identity>);

impl SeenSet {
    pub fn contains(&self, id: &Identity) -> bool {
        self.0.contains(id)
    }

    /// Returns true if `id` was not already present.
    pub fn insert(&mut self, id: Identity) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn sorted(&self) -> Vec<&Identity> {
        let mut ids: Vec<_> = self.0.iter().collect();
        ids.sort();
        ids
    }
}

impl FromIterator<Identity> for SeenSet {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        SeenSet(iter.into_iter().collect())
    }
}

/// Flat JSON-array file holding the seen set. Read and written whole.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Missing or unparseable storage loads as an empty set.
    pub fn load(&self) -> SeenSet {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return SeenSet::default(),
        };
        match serde_json::from_str::<Vec<Identity>>(&raw) {
            Ok(ids) => {
                let set: SeenSet = ids.into_iter().collect();
                info!(path = %self.path.display(), count = set.len(), "Loaded seen set");
                set
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Seen set unreadable, starting empty");
                SeenSet::default()
            }
        }
    }

    /// Overwrite storage with the full set (temp file + rename).
    pub fn save(&self, seen: &SeenSet) -> Result<()> {
        let json = serde_json::to_string_pretty(&seen.sorted())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        info!(path = %self.path.display(), count = seen.len(), "Saved seen set");
        Ok(())
    }
}

// ── Tests ──
