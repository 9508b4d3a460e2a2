//! CLI configuration.
//!
//! Resolution order for the file: `--config`, then `REPOTREE_CONFIG`, then
//! `<config dir>/repotree/config.json`. Only an explicitly named file has to
//! exist. Command-line flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use repotree_core::OutputFormat;
use repotree_http::SlingConfig;

use crate::{Args, CliError};

pub const CONFIG_ENV: &str = "REPOTREE_CONFIG";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub instance: SlingConfig,
    pub output: OutputFormat,
    /// Default log filter when neither `RUST_LOG` nor `-v` is given.
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Load from `explicit`, the environment, or the default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| CliError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(url) = &args.url {
            self.instance.url = url.clone();
        }
        if let Some(user) = &args.user {
            self.instance.user = user.clone();
        }
        if let Some(password) = &args.password {
            self.instance.password = password.clone();
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        self
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("repotree").join("config.json"))
}
