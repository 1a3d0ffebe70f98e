//! Loading configuration trees from YAML and JSON files.
//!
//! Files are parsed into a loosely-typed [`ConfigMap`]. Lists under the
//! schema's set fields are turned into sets, and a few top-level fields can
//! be overridden from the environment.

use crate::error::{AppSpecError, ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::schema::SCHEMA;
use super::value::{ConfigMap, ConfigValue};

/// Environment variable overriding the app name.
pub const ENV_APP_NAME: &str = "APPSPEC_NAME";
/// Environment variable overriding the app region.
pub const ENV_APP_REGION: &str = "APPSPEC_REGION";

/// Input document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML, also used for unknown extensions.
    Yaml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parser for configuration trees.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory searched for `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a configuration tree from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not a map.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ConfigMap> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(AppSpecError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppSpecError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse(&content, ConfigFormat::from_path(path), Some(path))
    }

    /// Loads a file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<ConfigMap> {
        let mut tree = self.load_file(path)?;
        Self::apply_env_overrides(&mut tree);
        Ok(tree)
    }

    /// Parses a tree in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid or its root is not a map.
    pub fn parse(&self, content: &str, format: ConfigFormat, source: Option<&Path>) -> Result<ConfigMap> {
        match format {
            ConfigFormat::Yaml => self.parse_yaml(content, source),
            ConfigFormat::Json => self.parse_json(content, source),
        }
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or its root is not a map.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ConfigMap> {
        debug!("Parsing YAML configuration");
        let value: ConfigValue = serde_yaml::from_str(content)
            .map_err(|e| parse_error(format!("YAML parse error: {e}"), source))?;
        Self::into_tree(value, source)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or its root is not a map.
    pub fn parse_json(&self, content: &str, source: Option<&Path>) -> Result<ConfigMap> {
        debug!("Parsing JSON configuration");
        let value: ConfigValue = serde_json::from_str(content)
            .map_err(|e| parse_error(format!("JSON parse error: {e}"), source))?;
        Self::into_tree(value, source)
    }

    fn into_tree(value: ConfigValue, source: Option<&Path>) -> Result<ConfigMap> {
        match value.with_sets(SCHEMA.set_fields()) {
            ConfigValue::Map(tree) => {
                debug!(fields = tree.len(), "Parsed configuration tree");
                Ok(tree)
            }
            other => Err(parse_error(
                format!("expected a map at the document root, found {}", other.kind_name()),
                source,
            )),
        }
    }

    /// Applies `APPSPEC_NAME` and `APPSPEC_REGION` to the tree root.
    pub fn apply_env_overrides(tree: &mut ConfigMap) {
        if let Ok(name) = std::env::var(ENV_APP_NAME) {
            debug!("Overriding name from environment");
            tree.insert(String::from("name"), ConfigValue::from(name));
        }

        if let Ok(region) = std::env::var(ENV_APP_REGION) {
            debug!("Overriding region from environment");
            tree.insert(String::from("region"), ConfigValue::from(region));
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                AppSpecError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

fn parse_error(message: String, source: Option<&Path>) -> AppSpecError {
    AppSpecError::Config(ConfigError::ParseError {
        message,
        location: source.map(|p| p.display().to_string()),
    })
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["app.yaml", "app.yml", ".do/app.yaml", "app.json"];

/// Finds a configuration file in the directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(AppSpecError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}
