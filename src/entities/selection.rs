use crate::entities::medication::MedicationRecord;
use crate::error::MedLensError;

pub const MAX_SELECTION: usize = 4;

/// Ordered set of up to four medications, keyed by compound id.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    items: Vec<MedicationRecord>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, cid: u64) -> bool {
        self.items.iter().any(|r| r.cid == cid)
    }

    /// Adds `record` unless already present. A full set is left untouched.
    pub fn insert(&mut self, record: MedicationRecord) -> Result<bool, MedLensError> {
        if self.contains(record.cid) {
            return Ok(false);
        }
        if self.items.len() >= MAX_SELECTION {
            return Err(MedLensError::SelectionFull {
                limit: MAX_SELECTION,
            });
        }
        self.items.push(record);
        Ok(true)
    }

    #[cfg(test)]
    pub fn remove(&mut self, cid: u64) -> Option<MedicationRecord> {
        let idx = self.items.iter().position(|r| r.cid == cid)?;
        Some(self.items.remove(idx))
    }

    /// Removes the record if selected, otherwise inserts it. Returns whether it is now selected.
    #[cfg(test)]
    pub fn toggle(&mut self, record: MedicationRecord) -> Result<bool, MedLensError> {
        if self.remove(record.cid).is_some() {
            return Ok(false);
        }
        self.insert(record)
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn can_compare(&self) -> bool {
        self.items.len() >= 2
    }

    pub fn ids(&self) -> Vec<u64> {
        self.items.iter().map(|r| r.cid).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|r| r.name.clone()).collect()
    }

    pub fn records(&self) -> &[MedicationRecord] {
        &self.items
    }
}
