use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fieldmap_shared::GisConfig;

use crate::catalog::load_catalog;
use crate::config;

#[derive(Clone)]
pub struct AppState {
    pub gis_config: Arc<GisConfig>,
    pub data_dir: Arc<PathBuf>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(gis_config: GisConfig, data_dir: PathBuf) -> Self {
        Self {
            gis_config: Arc::new(gis_config),
            data_dir: Arc::new(data_dir),
            started_at: Utc::now(),
        }
    }

    /// Assemble state from `FIELDMAP_*` environment variables.
    pub fn from_env() -> Self {
        let layers = load_catalog(config::layers_file().as_deref());
        let gis_config = GisConfig {
            api_key: config::maps_api_key(),
            map: config::map_options(),
            layers,
        };
        Self::new(gis_config, config::data_dir())
    }
}
