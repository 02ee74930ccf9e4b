use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct CryoliteConfig {
    /// Minutes added per wrong attempt preceding a problem's first acceptance.
    #[serde(default = "default_penalty_minutes")]
    pub penalty_minutes: i64,
    /// When set, the final standings are written to this path as JSON on END.
    #[serde(default)]
    pub export_standings: Option<String>,
}

impl Default for CryoliteConfig {
    fn default() -> Self {
        Self {
            penalty_minutes: default_penalty_minutes(),
            export_standings: None,
        }
    }
}

fn default_penalty_minutes() -> i64 {
    20
}

pub fn load_config(folder: &Path) -> Result<CryoliteConfig, String> {
    let config_path = folder.join("config.toml");
    if !config_path.exists() {
        info!(
            "config.toml not found next to the input, using defaults: {}",
            config_path.display()
        );
        return Ok(CryoliteConfig::default());
    }

    let raw = fs::read_to_string(&config_path).map_err(|err| {
        format!(
            "Failed to read config.toml at {}: {}",
            config_path.display(),
            err
        )
    })?;

    toml::from_str::<CryoliteConfig>(&raw).map_err(|err| {
        format!(
            "Failed to parse config.toml at {}: {}",
            config_path.display(),
            err
        )
    })
}
