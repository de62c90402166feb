//! Layered configuration: defaults, then `prefiller.toml`, then
//! `PREFILLER_*` environment variables.

use crate::error::PrefillerError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "prefiller.toml";
pub const ENV_PREFIX: &str = "PREFILLER_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: String,
    /// Shared schema root, one sub-directory per database class.
    pub schema_location: Option<PathBuf>,
    pub output_directory: PathBuf,
    /// Locale for `LOCALIZED`/`UNICODE` collations; ordinal when unset.
    pub locale: Option<String>,
    pub databases: Vec<DatabaseConfig>,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            schema_location: None,
            output_directory: PathBuf::from("build/generated/assets"),
            locale: None,
            databases: Vec::new(),
            base_dir: PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    #[serde(default)]
    pub classname: Option<String>,
    #[serde(default)]
    pub schema_directory: Option<PathBuf>,
    #[serde(default)]
    pub output_directory: Option<PathBuf>,
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
    /// Deprecated single-script form; replaces `scripts` when set.
    #[serde(default)]
    pub script: Option<PathBuf>,
    /// Reject a final statement that lacks its `;`.
    #[serde(default)]
    pub strict: bool,
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classname: None,
            schema_directory: None,
            output_directory: None,
            scripts: Vec::new(),
            script: None,
            strict: false,
        }
    }
}

impl Config {
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from `path`; a missing file just yields defaults plus env.
    pub fn load(path: &Path) -> Result<Self, PrefillerError> {
        let mut config: Config = Self::figment(path).extract()?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn database(&self, name: &str) -> Option<&DatabaseConfig> {
        self.databases.iter().find(|db| db.name == name)
    }
}
