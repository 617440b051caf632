//! The persisted watch list of compounds loaded by default.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::entities::medication::MedicationIdentifier;
use crate::error::MedLensError;

pub const CATEGORY_CARDIOVASCULAR: &str = "Cardiovascular";
pub const CATEGORY_NEUROLOGICAL: &str = "Neurological";

const DEFAULT_CARDIOVASCULAR: &[u64] = &[5362119, 60823, 4171, 2162, 3961];
const DEFAULT_NEUROLOGICAL: &[u64] = &[
    3446, 6047, 63054, 3152, 5486971, 3386, 3033, 2771, 5533, 2118, 4917, 3821, 5284627, 4158,
    5732, 5284583, 2789, 3878,
];

const FALLBACK_CARDIOVASCULAR: &[u64] = &[5362119, 60823];
const FALLBACK_NEUROLOGICAL: &[u64] = &[3446, 6047];

// Batch labels that never belong in the persisted list.
const TRANSIENT_CATEGORIES: &[&str] = &["searched", "similar compound", "comparison", "unknown"];

fn identifiers(cardiovascular: &[u64], neurological: &[u64]) -> Vec<MedicationIdentifier> {
    cardiovascular
        .iter()
        .map(|cid| MedicationIdentifier::new(*cid, CATEGORY_CARDIOVASCULAR))
        .chain(
            neurological
                .iter()
                .map(|cid| MedicationIdentifier::new(*cid, CATEGORY_NEUROLOGICAL)),
        )
        .collect()
}

/// The built-in list used when nothing has been persisted.
pub fn defaults() -> Vec<MedicationIdentifier> {
    identifiers(DEFAULT_CARDIOVASCULAR, DEFAULT_NEUROLOGICAL)
}

pub fn emergency_fallback() -> Vec<MedicationIdentifier> {
    identifiers(FALLBACK_CARDIOVASCULAR, FALLBACK_NEUROLOGICAL)
}

/// Maps user input to a category label. `c`/`n` are shorthands; blank input and batch
/// labels fall back to Neurological; anything else is kept as written.
pub fn resolve_category(input: Option<&str>) -> String {
    let Some(raw) = input.map(str::trim).filter(|v| !v.is_empty()) else {
        return CATEGORY_NEUROLOGICAL.to_string();
    };
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "c" | "cardiovascular" => CATEGORY_CARDIOVASCULAR.to_string(),
        "n" | "neurological" => CATEGORY_NEUROLOGICAL.to_string(),
        other if TRANSIENT_CATEGORIES.contains(&other) => CATEGORY_NEUROLOGICAL.to_string(),
        _ => raw.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct WatchList {
    path: PathBuf,
    entries: Vec<MedicationIdentifier>,
}

impl WatchList {
    pub async fn load_default() -> Self {
        Self::load(crate::utils::storage::watchlist_path()).await
    }

    /// Reads the list at `path`. Never fails: a missing, unreadable or empty file
    /// yields the built-in defaults.
    pub async fn load(path: PathBuf) -> Self {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<MedicationIdentifier>>(&raw) {
                Ok(entries) => dedupe(entries),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Watch list is corrupt; using defaults");
                    Vec::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No saved watch list; using defaults");
                Vec::new()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Watch list is unreadable; using defaults");
                Vec::new()
            }
        };

        let entries = if entries.is_empty() {
            defaults()
        } else {
            entries
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[MedicationIdentifier] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn category_of(&self, cid: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.cid == cid)
            .map(|e| e.category.as_str())
    }

    /// Appends a compound and rewrites the file.
    pub async fn add(&mut self, cid: u64, category: Option<&str>) -> Result<(), MedLensError> {
        if cid == 0 {
            return Err(MedLensError::InvalidArgument(
                "Compound id must be a positive integer".into(),
            ));
        }
        if let Some(existing) = self.category_of(cid) {
            return Err(MedLensError::DuplicateEntry {
                cid,
                category: existing.to_string(),
            });
        }

        self.entries
            .push(MedicationIdentifier::new(cid, resolve_category(category)));
        if let Err(err) = self.save().await {
            self.entries.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Restores the built-in defaults and rewrites the file.
    pub async fn reset(&mut self) -> Result<(), MedLensError> {
        self.entries = defaults();
        self.save().await
    }

    async fn save(&self) -> Result<(), MedLensError> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        crate::utils::storage::write_atomic(&self.path, &content).await
    }
}

fn dedupe(entries: Vec<MedicationIdentifier>) -> Vec<MedicationIdentifier> {
    let mut out: Vec<MedicationIdentifier> = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.cid == 0 || out.iter().any(|e| e.cid == entry.cid) {
            continue;
        }
        out.push(entry);
    }
    out
}
