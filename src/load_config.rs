use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

use crate::config::SchedulerConfig;

/// Loads the scheduler configuration from a flat YAML file.
///
/// The file carries no secrets; client credentials come from the environment
/// when the concrete clients are constructed (`GraphClient::new_from_env`,
/// `LedgerClient::new_from_env`). Unknown keys are ignored so the same file
/// can feed other tools.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SchedulerConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: SchedulerConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.trace_loaded();
    Ok(config)
}
