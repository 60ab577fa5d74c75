use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::zone::ZoneId;

use super::atomic_io::write_text_atomic;
use super::{PersistenceError, PersistenceStore, PlacementRecord};

pub const PLACEMENT_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlacementFile {
    version: u32,
    placements: Vec<PlacementRecord>,
}

/// Placements mirrored to one JSON file. Every mutation rewrites the file.
#[derive(Debug)]
pub struct JsonPlacementStore {
    path: PathBuf,
    records: BTreeMap<ZoneId, PlacementRecord>,
}

impl JsonPlacementStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(raw) => parse_placement_file(&path, &raw)?,
            Err(source) if source.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PersistenceError::Read { path, source }),
        };
        debug!(path = %path.display(), records = records.len(), "placement_store_opened");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let file = PlacementFile {
            version: PLACEMENT_FILE_VERSION,
            placements: self.records.values().cloned().collect(),
        };
        let text = serde_json::to_string_pretty(&file).map_err(PersistenceError::Encode)?;
        write_text_atomic(&self.path, &text).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn parse_placement_file(
    path: &Path,
    raw: &str,
) -> Result<BTreeMap<ZoneId, PlacementRecord>, PersistenceError> {
    let file: PlacementFile =
        serde_json::from_str(raw).map_err(|source| PersistenceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    if file.version != PLACEMENT_FILE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: file.version,
            expected: PLACEMENT_FILE_VERSION,
        });
    }
    Ok(file
        .placements
        .into_iter()
        .map(|record| (record.zone_id, record))
        .collect())
}

impl PersistenceStore for JsonPlacementStore {
    fn save_placement(&mut self, record: &PlacementRecord) -> Result<(), PersistenceError> {
        let previous = self.records.insert(record.zone_id, record.clone());
        if let Err(error) = self.flush() {
            match previous {
                Some(previous) => self.records.insert(record.zone_id, previous),
                None => self.records.remove(&record.zone_id),
            };
            return Err(error);
        }
        Ok(())
    }

    fn load_placement(&self, zone: ZoneId) -> Result<Option<PlacementRecord>, PersistenceError> {
        Ok(self.records.get(&zone).cloned())
    }

    fn clear_placement(&mut self, zone: ZoneId) -> Result<(), PersistenceError> {
        let Some(previous) = self.records.remove(&zone) else {
            return Ok(());
        };
        if let Err(error) = self.flush() {
            self.records.insert(zone, previous);
            return Err(error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::carry::{EconomicAttributes, Rarity};

    use super::*;

    fn record(zone: u32, level: u32) -> PlacementRecord {
        PlacementRecord {
            zone_id: ZoneId(zone),
            template_id: "creature.ember_fox".to_string(),
            economy: EconomicAttributes {
                rarity: Rarity::Legendary,
                level,
                base_income: 12,
            },
            fought: false,
        }
    }

    #[test]
    fn records_survive_reopen() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("placements.json");
        {
            let mut store = JsonPlacementStore::open(&path).expect("open");
            store.save_placement(&record(1, 3)).expect("save 1");
            store.save_placement(&record(2, 1)).expect("save 2");
            store.clear_placement(ZoneId(2)).expect("clear");
        }
        let store = JsonPlacementStore::open(&path).expect("reopen");
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.load_placement(ZoneId(1)).expect("load"),
            Some(record(1, 3))
        );
        assert_eq!(store.load_placement(ZoneId(2)).expect("load"), None);
    }

    #[test]
    fn missing_file_opens_empty() {
        let temp = TempDir::new().expect("temp");
        let store = JsonPlacementStore::open(temp.path().join("none.json")).expect("open");
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_reports_decode_error() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("placements.json");
        fs::write(&path, "{ not json").expect("write");
        let err = JsonPlacementStore::open(&path).expect_err("corrupt");
        assert!(matches!(err, PersistenceError::Decode { .. }));
    }

    #[test]
    fn future_version_is_rejected() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("placements.json");
        fs::write(&path, r#"{"version": 9, "placements": []}"#).expect("write");
        let err = JsonPlacementStore::open(&path).expect_err("version");
        assert!(matches!(
            err,
            PersistenceError::UnsupportedVersion { found: 9, .. }
        ));
    }
}
