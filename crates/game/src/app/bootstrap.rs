use std::path::PathBuf;

use collector_engine::{
    compile_template_catalog, resolve_app_paths, ContentCompileError, InteractionError,
    JsonPlacementStore, PersistenceError, PersistenceStore, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_harness_config, ConfigError, HarnessConfig};
use super::scene::{build_demo_scene, DemoScene};

const CONFIG_ENV_VAR: &str = "COLLECTOR_CONFIG";

pub(crate) struct AppWiring {
    pub(crate) config_path: Option<PathBuf>,
}

pub(crate) struct PreparedRun {
    pub(crate) config: HarnessConfig,
    pub(crate) scene: DemoScene,
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Content(#[from] ContentCompileError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("scene setup failed: {0}")]
    Scene(#[from] InteractionError),
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Collector Startup ===");

    AppWiring {
        config_path: std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
    }
}

pub(crate) fn prepare_run(app: &AppWiring) -> Result<PreparedRun, AppError> {
    let config = match &app.config_path {
        Some(path) => {
            info!(path = %path.display(), "harness_config_loading");
            load_harness_config(path)?
        }
        None => {
            let config = HarnessConfig::default();
            config.validate()?;
            config
        }
    };

    let paths = resolve_app_paths()?;
    let catalog = compile_template_catalog(&paths.content_dir)?;
    info!(
        templates = catalog.len(),
        content_dir = %paths.content_dir.display(),
        "content_compiled"
    );

    let store = if config.persist_placements {
        let store = JsonPlacementStore::open(paths.placements_file())?;
        info!(path = %store.path().display(), records = store.len(), "placement_store_opened");
        Some(Box::new(store) as Box<dyn PersistenceStore>)
    } else {
        None
    };

    let scene = build_demo_scene(&config, catalog, store)?;
    Ok(PreparedRun { config, scene })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
