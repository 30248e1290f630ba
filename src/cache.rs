// Keyed store of generated artifacts.
//
// Lets the front end skip regenerating a report when neither the source
// workbook nor the filters have changed. Persisted as pretty JSON. Report
// computation never consults it.
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Artifact name plus everything that changes its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub artifact: String,
    pub source: PathBuf,
    pub filters: Vec<String>,
}

impl ArtifactKey {
    pub fn new(
        artifact: impl Into<String>,
        source: impl Into<PathBuf>,
        filters: &[String],
    ) -> Self {
        let mut filters = filters.to_vec();
        filters.sort();
        filters.dedup();
        ArtifactKey {
            artifact: artifact.into(),
            source: source.into(),
            filters,
        }
    }

    fn id(&self) -> String {
        format!(
            "{}|{}|{}",
            self.artifact,
            self.source.display(),
            self.filters.join(",")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub generated_at: DateTime<Utc>,
    pub source_file: PathBuf,
    pub source_modified: DateTime<Utc>,
    pub filters: Vec<String>,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct ArtifactCache {
    path: PathBuf,
    entries: BTreeMap<String, ArtifactMeta>,
}

pub fn modified_at(path: &Path) -> Result<DateTime<Utc>> {
    Ok(DateTime::<Utc>::from(fs::metadata(path)?.modified()?))
}

impl ArtifactCache {
    /// An empty cache that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        ArtifactCache {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the cache at `path`. A missing file gives an empty cache; an
    /// unreadable one is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::empty(path));
        }
        let text = fs::read_to_string(&path)?;
        let entries = match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable artifact cache");
                BTreeMap::new()
            }
        };
        Ok(ArtifactCache { path, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<&ArtifactMeta> {
        self.entries.get(&key.id())
    }

    /// Record a freshly generated artifact, stamping the source's current
    /// modification time.
    pub fn put(&mut self, key: &ArtifactKey, outputs: Vec<PathBuf>) -> Result<()> {
        let meta = ArtifactMeta {
            generated_at: Utc::now(),
            source_file: key.source.clone(),
            source_modified: modified_at(&key.source)?,
            filters: key.filters.clone(),
            outputs,
        };
        self.entries.insert(key.id(), meta);
        Ok(())
    }

    pub fn invalidate(&mut self, key: &ArtifactKey) -> Option<ArtifactMeta> {
        self.entries.remove(&key.id())
    }

    /// Drop every entry generated from `source`.
    pub fn invalidate_source(&mut self, source: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, meta| meta.source_file != source);
        before - self.entries.len()
    }

    /// True when an entry exists, the source has not been modified since,
    /// and all recorded outputs are still on disk.
    pub fn is_fresh(&self, key: &ArtifactKey) -> bool {
        let Some(meta) = self.get(key) else {
            debug!(artifact = %key.artifact, "cache miss");
            return false;
        };
        let unchanged = modified_at(&key.source).is_ok_and(|m| m == meta.source_modified);
        let present = meta.outputs.iter().all(|p| p.exists());
        let fresh = unchanged && present;
        debug!(
            artifact = %key.artifact,
            unchanged,
            present,
            "cache {}",
            if fresh { "hit" } else { "stale" }
        );
        fresh
    }

    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
