use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::EgoPlotError;
use crate::plot::PlotConfig;
use crate::tfrecord::Compression;

const CONFIG_DIR_NAME: &str = "egoplot";
const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_SCENARIO_LIMIT: usize = 5;
pub const DEFAULT_OUTPUT_DIR: &str = "plots";

/// Defaults for a run, overridden by command line flags
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub scenario_limit: usize,
    pub output_dir: PathBuf,
    pub compression: Compression,
    pub verify_checksums: bool,
    pub plot: PlotConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scenario_limit: DEFAULT_SCENARIO_LIMIT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compression: Compression::None,
            verify_checksums: true,
            plot: PlotConfig::default(),
        }
    }
}

impl AppConfig {
    /// Per-user config file location, if the platform has a config directory
    pub fn local_file_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        )
    }

    /// Load the per-user config file, `Ok(None)` when there is none
    pub fn from_local_file() -> Result<Option<Self>, EgoPlotError> {
        match Self::local_file_path() {
            Some(config_path) if config_path.exists() => Self::from_path(&config_path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, EgoPlotError> {
        let file = std::fs::File::open(path).map_err(|e| EgoPlotError::ConfigIOError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
            EgoPlotError::ConfigParseError {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        debug!("Loaded config from {:?}: {:?}", path, config);
        Ok(config)
    }
}
