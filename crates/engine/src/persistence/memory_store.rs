use std::collections::BTreeMap;

use crate::zone::ZoneId;

use super::{PersistenceError, PersistenceStore, PlacementRecord};

#[derive(Debug, Clone, Default)]
pub struct MemoryPlacementStore {
    records: BTreeMap<ZoneId, PlacementRecord>,
    writes: u64,
}

impl MemoryPlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &PlacementRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of save and clear calls seen so far.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl PersistenceStore for MemoryPlacementStore {
    fn save_placement(&mut self, record: &PlacementRecord) -> Result<(), PersistenceError> {
        self.writes = self.writes.saturating_add(1);
        self.records.insert(record.zone_id, record.clone());
        Ok(())
    }

    fn load_placement(&self, zone: ZoneId) -> Result<Option<PlacementRecord>, PersistenceError> {
        Ok(self.records.get(&zone).cloned())
    }

    fn clear_placement(&mut self, zone: ZoneId) -> Result<(), PersistenceError> {
        self.writes = self.writes.saturating_add(1);
        self.records.remove(&zone);
        Ok(())
    }
}
