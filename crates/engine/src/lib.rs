use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod carry;
pub mod collab;
pub mod config;
pub mod content;
mod error;
pub mod interaction;
pub mod math;
pub mod persistence;
pub mod world;
pub mod zone;

pub use app::{
    InputAction, InputSnapshot, KeyboardTrigger, MobileButtonEdge, MobileButtonTrigger,
    SimClock, TimerQueue, TriggerInput, TriggerSignal, TriggerSource,
};
pub use carry::{
    Carrier, CarryState, CarryableEntity, EconomicAttributes, EntityId, PhysicsBody, PlayerHand,
    Rarity, Wallet,
};
pub use collab::{
    BattleRequester, CollaboratorKind, FlatGround, GroundProbe, PromptFrame, PromptRenderer,
    PromptTarget,
};
pub use config::{InteractionConfig, InvalidConfigError};
pub use content::{
    compile_template_catalog, parse_templates_str, ContentCompileError, ContentErrorCode,
    EntityTemplate, SourceLocation, TemplateCatalog, TemplateId,
};
pub use error::InteractionError;
pub use interaction::{
    GateState, HoldContext, HoldResolution, Interactable, InteractionGate, InteractionPolicy,
    SessionSnapshot,
};
pub use math::{RangePolicy, Vec3};
pub use persistence::{
    JsonPlacementStore, MemoryPlacementStore, PersistenceError, PersistenceStore,
    PlacementRecord,
};
pub use world::{
    BattleOutcome, Collaborators, InteractionEvent, InteractionEventBus, InteractionEventCounts,
    InteractionEventKind, InteractionWorld, WorldSystemId, WORLD_SYSTEM_ORDER,
};
pub use zone::{ArbitrationCoordinator, PlacementZone, ZoneClaim, ZoneId};

pub const ROOT_ENV_VAR: &str = "COLLECTOR_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub content_dir: PathBuf,
    pub save_dir: PathBuf,
}

impl AppPaths {
    pub fn placements_file(&self) -> PathBuf {
        self.save_dir.join("placements.json")
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "COLLECTOR_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/collector\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_for_root(root)
}

/// Lays out content and save directories under `root`, creating the save
/// directory if needed.
pub fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let content_dir = root.join("assets").join("creatures");
    let save_dir = root.join("saves");

    fs::create_dir_all(&save_dir).map_err(|source| StartupError::CreateSaveDir {
        path: save_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        content_dir,
        save_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = TempDir::new().expect("temp");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_create_save_dir_under_root() {
        let temp = TempDir::new().expect("temp");
        let paths = app_paths_for_root(temp.path().to_path_buf()).expect("paths");
        assert!(paths.save_dir.is_dir());
        assert_eq!(paths.content_dir, temp.path().join("assets").join("creatures"));
        assert_eq!(
            paths.placements_file(),
            temp.path().join("saves").join("placements.json")
        );
    }
}
