mod atomic_io;
mod json_store;
mod memory_store;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carry::EconomicAttributes;
use crate::zone::ZoneId;

pub use json_store::{JsonPlacementStore, PLACEMENT_FILE_VERSION};
pub use memory_store::MemoryPlacementStore;

/// What a zone remembers about the entity sitting on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub zone_id: ZoneId,
    pub template_id: String,
    pub economy: EconomicAttributes,
    pub fought: bool,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read placements from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write placements to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("placement file {path} is not valid: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode placements: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("placement file {path} has version {found}; expected {expected}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

/// Key-value store of placements keyed by zone.
pub trait PersistenceStore {
    fn save_placement(&mut self, record: &PlacementRecord) -> Result<(), PersistenceError>;
    fn load_placement(&self, zone: ZoneId) -> Result<Option<PlacementRecord>, PersistenceError>;
    fn clear_placement(&mut self, zone: ZoneId) -> Result<(), PersistenceError>;
}
