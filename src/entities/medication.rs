use std::fmt;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::entities::batch::{Batch, BatchMode, BatchSequencer, BatchStatus};
use crate::entities::watchlist;
use crate::error::MedLensError;
use crate::sources::pubchem::{CompoundTitle, PubChemClient};
use crate::transform;

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const NO_MECHANISM: &str = "Mechanism of action not available.";
pub const WEIGHT_UNIT: &str = "g/mol";

pub const CATEGORY_SEARCHED: &str = "Searched";
pub const CATEGORY_SIMILAR: &str = "Similar Compound";
pub const CATEGORY_COMPARISON: &str = "Comparison";
pub const CATEGORY_UNKNOWN: &str = "Unknown";

const SIMILARITY_THRESHOLD_PERCENT: u8 = 90;
const SIMILARITY_MAX_RECORDS: usize = 8;
const SIMILAR_PREVIEW_THRESHOLD_PERCENT: u8 = 85;
const SIMILAR_PREVIEW_MAX_RECORDS: usize = 5;

const DEFAULT_FETCH_DELAY: Duration = Duration::from_millis(100);
const FETCH_DELAY_ENV: &str = "MEDLENS_FETCH_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationIdentifier {
    pub cid: u64,
    pub category: String,
}

impl MedicationIdentifier {
    pub fn new(cid: u64, category: impl Into<String>) -> Self {
        Self {
            cid,
            category: category.into(),
        }
    }
}

/// A descriptor value or the explicit "N/A" sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Descriptor<T> {
    Available(T),
    NotAvailable,
}

impl<T> Descriptor<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Available(v),
            None => Self::NotAvailable,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Available(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl<T: Copy> Descriptor<T> {
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T: fmt::Display> fmt::Display for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(v) => v.fmt(f),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for Descriptor<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Available(v) => v.serialize(serializer),
            Self::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Descriptor<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Value(T),
            Sentinel(String),
        }

        match Raw::<T>::deserialize(deserializer)? {
            Raw::Value(v) => Ok(Self::Available(v)),
            Raw::Sentinel(s) if s == NOT_AVAILABLE => Ok(Self::NotAvailable),
            Raw::Sentinel(s) => Err(serde::de::Error::custom(format!(
                "expected a descriptor value or \"{NOT_AVAILABLE}\", got \"{s}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolecularWeight {
    pub value: Descriptor<f64>,
    pub unit: String,
}

impl MolecularWeight {
    pub fn new(value: Descriptor<f64>) -> Self {
        Self {
            value,
            unit: WEIGHT_UNIT.to_string(),
        }
    }
}

impl fmt::Display for MolecularWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Descriptor::Available(v) => write!(f, "{v} {}", self.unit),
            Descriptor::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Normalized view of one compound. Every field is populated, with placeholders where
/// the upstream sources had nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub cid: u64,
    pub name: String,
    pub brand_name: Option<String>,
    pub category: String,
    pub formula: String,
    pub weight: MolecularWeight,
    pub iupac: String,
    pub smiles: String,
    pub inchikey: String,
    pub xlogp: Descriptor<f64>,
    pub tpsa: Descriptor<f64>,
    pub complexity: Descriptor<f64>,
    pub charge: Descriptor<i64>,
    pub hbond_donors: Descriptor<i64>,
    pub hbond_acceptors: Descriptor<i64>,
    pub description: String,
    pub mechanism: String,
}

impl MedicationRecord {
    pub fn display_name(&self) -> String {
        match self.brand_name.as_deref() {
            Some(brand) => format!("{} ({brand})", self.name),
            None => self.name.clone(),
        }
    }

    pub fn image_url(&self) -> String {
        format!(
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/cid/{}/PNG",
            self.cid
        )
    }

    pub fn pubchem_url(&self) -> String {
        format!("https://pubchem.ncbi.nlm.nih.gov/compound/{}", self.cid)
    }

    pub fn has_description(&self) -> bool {
        self.description != NO_DESCRIPTION
    }

    pub fn has_mechanism(&self) -> bool {
        self.mechanism != NO_MECHANISM
    }
}

/// Politeness delay between sequential watch-list fetches.
pub fn fetch_delay() -> Duration {
    std::env::var(FETCH_DELAY_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_FETCH_DELAY)
}

/// Fetches and normalizes one compound. A missing property table aborts with `NotFound`;
/// pharmacology enrichment degrades to placeholders.
pub async fn fetch_record(
    client: &PubChemClient,
    id: &MedicationIdentifier,
) -> Result<MedicationRecord, MedLensError> {
    let Some(properties) = client.fetch_properties(id.cid).await? else {
        return Err(MedLensError::compound_not_found(id.cid));
    };
    let pharmacology = client.fetch_pharmacology(id.cid).await;
    transform::medication::normalize(id, properties, pharmacology)
}

/// Orchestrates batch fetches against PubChem. Batches never return `Err`: failed items
/// are skipped and lookup faults are reported through [`BatchStatus`].
pub struct MedicationPipeline {
    client: PubChemClient,
    sequencer: BatchSequencer,
    delay: Duration,
}

impl MedicationPipeline {
    pub fn new() -> Result<Self, MedLensError> {
        Ok(Self::with_client(PubChemClient::new()?, fetch_delay()))
    }

    pub fn with_client(client: PubChemClient, delay: Duration) -> Self {
        Self {
            client,
            sequencer: BatchSequencer::default(),
            delay,
        }
    }

    pub async fn fetch(&self, id: &MedicationIdentifier) -> Result<MedicationRecord, MedLensError> {
        fetch_record(&self.client, id).await
    }

    /// Sequential load with a fixed delay between items; an empty list is replaced by the
    /// emergency fallback ids.
    pub async fn load_watchlist(&self, entries: &[MedicationIdentifier]) -> Batch {
        let mut batch = Batch::new(self.sequencer.next_id(), BatchMode::WatchList, None);

        let fallback;
        let entries = if entries.is_empty() {
            warn!("Watch list is empty; restoring emergency fallback medications");
            fallback = watchlist::emergency_fallback();
            fallback.as_slice()
        } else {
            entries
        };

        info!(count = entries.len(), "Loading watch list");
        for (idx, id) in entries.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            debug!(cid = id.cid, "Fetching watch-list entry");
            match self.fetch(id).await {
                Ok(record) => batch.records.push(record),
                Err(err) => {
                    warn!(cid = id.cid, error = %err, "Skipping watch-list entry");
                    batch.skipped.push(id.cid);
                }
            }
        }
        batch
    }

    /// Resolves free text to at most five compounds and fetches them concurrently.
    pub async fn search(&self, text: &str) -> Batch {
        let text = text.trim();
        let batch = Batch::new(
            self.sequencer.next_id(),
            BatchMode::Search,
            Some(text.to_string()),
        );
        if text.is_empty() {
            return batch.with_status(BatchStatus::NoResults);
        }

        let cids = match self.client.search_by_name(text).await {
            Ok(cids) => cids,
            Err(err) => {
                warn!(query = text, error = %err, "Name search failed");
                return batch.with_status(BatchStatus::SourceUnavailable {
                    reason: err.to_string(),
                });
            }
        };
        if cids.is_empty() {
            return batch.with_status(BatchStatus::NoResults);
        }

        let ids = cids
            .into_iter()
            .map(|cid| MedicationIdentifier::new(cid, CATEGORY_SEARCHED))
            .collect::<Vec<_>>();
        self.fill_concurrently(batch, &ids).await
    }

    /// Expands a seed compound to up to eight structurally similar compounds (90% threshold).
    pub async fn similar(&self, seed: u64) -> Batch {
        let batch = Batch::new(
            self.sequencer.next_id(),
            BatchMode::Similar,
            Some(seed.to_string()),
        );

        let cids = match self
            .client
            .find_similar(seed, SIMILARITY_THRESHOLD_PERCENT, SIMILARITY_MAX_RECORDS)
            .await
        {
            Ok(cids) => cids,
            Err(err) => {
                warn!(seed, error = %err, "Similarity search failed");
                return batch.with_status(BatchStatus::SourceUnavailable {
                    reason: err.to_string(),
                });
            }
        };
        if cids.is_empty() {
            return batch.with_status(BatchStatus::NoResults);
        }

        let ids = cids
            .into_iter()
            .filter(|cid| *cid != seed)
            .map(|cid| MedicationIdentifier::new(cid, CATEGORY_SIMILAR))
            .collect::<Vec<_>>();
        self.fill_concurrently(batch, &ids).await
    }

    /// Fetches a comparison selection concurrently, keeping the caller's order.
    pub async fn fetch_selection(&self, ids: &[MedicationIdentifier]) -> Batch {
        let batch = Batch::new(self.sequencer.next_id(), BatchMode::Comparison, None);
        if ids.is_empty() {
            return batch.with_status(BatchStatus::NoResults);
        }
        self.fill_concurrently(batch, ids).await
    }

    /// Names of a few close analogues (85% threshold), for detail views. Best effort.
    pub async fn similar_preview(&self, cid: u64) -> Vec<CompoundTitle> {
        let cids = match self
            .client
            .find_similar(
                cid,
                SIMILAR_PREVIEW_THRESHOLD_PERCENT,
                SIMILAR_PREVIEW_MAX_RECORDS,
            )
            .await
        {
            Ok(cids) => cids,
            Err(err) => {
                warn!(cid, error = %err, "Similar compound preview failed");
                return Vec::new();
            }
        };
        self.client.fetch_titles(&cids).await.unwrap_or_else(|err| {
            warn!(cid, error = %err, "Similar compound titles failed");
            Vec::new()
        })
    }

    async fn fill_concurrently(&self, mut batch: Batch, ids: &[MedicationIdentifier]) -> Batch {
        let results = join_all(ids.iter().map(|id| self.fetch(id))).await;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(record) => batch.records.push(record),
                Err(err) => {
                    warn!(cid = id.cid, error = %err, "Dropping compound from batch");
                    batch.skipped.push(id.cid);
                }
            }
        }
        batch
    }
}
