//! TOML configuration for the catalog client.
//!
//! One file, `catalog.toml`, carries three sections:
//!
//! ```toml
//! [client]
//! base_url = "http://localhost:8000"
//! root_path = "/api/v1"
//!
//! [codegen]
//! input = "http://localhost:8000/openapi.json"
//! output_path = "src/client"
//! format = "prettier"
//! lint = "eslint"
//!
//! [[codegen.plugins]]
//! name = "@hey-api/client-fetch"
//! runtime_config_path = "./src/misc/hey-api.ts"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! - `[client]` is the runtime configuration of the generated HTTP client:
//!   where the API lives.
//! - `[codegen]` describes how the client is generated from the server's
//!   OpenAPI schema.  It is read by the generation step, not at runtime.
//! - `[logging]` is the default `tracing` filter when `RUST_LOG` is unset.
//!
//! Every field has a `#[serde(default = "...")]`, so a missing file or a
//! partial file yields a usable config.  `format` and `lint` take a tool name
//! or `false`; leaving them out selects `prettier` and `eslint`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plugin that produces the fetch-based client runtime.
pub const CLIENT_FETCH_PLUGIN: &str = "@hey-api/client-fetch";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level `catalog.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientRuntimeConfig,
    #[serde(default)]
    pub codegen: CodegenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Runtime settings of the generated client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRuntimeConfig {
    /// Scheme, host and port of the API server.  `https://` is assumed when
    /// no scheme is given.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path prefix every API route is mounted under.
    #[serde(default = "default_root_path")]
    pub root_path: String,
}

/// How the HTTP client is generated from the OpenAPI schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodegenConfig {
    /// Schema location: a URL or a local file path.
    #[serde(default = "default_input")]
    pub input: String,
    /// Directory the generated sources are written to.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Formatter run over the generated sources.
    #[serde(default = "default_format")]
    pub format: ToolChoice,
    /// Linter run over the generated sources.
    #[serde(default = "default_lint")]
    pub lint: ToolChoice,
    #[serde(default = "default_plugins")]
    pub plugins: Vec<PluginConfig>,
}

/// One code generation plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginConfig {
    pub name: String,
    /// Hand-written module the generated client imports its runtime
    /// configuration from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_config_path: Option<PathBuf>,
}

/// A post-generation tool: a named tool, or switched off with `false`.
///
/// TOML has no null, so "off" is written as `format = false` and survives a
/// save/load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ToolRepr", into = "ToolRepr")]
pub enum ToolChoice {
    Off,
    Named(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ToolRepr {
    Flag(bool),
    Name(String),
}

impl TryFrom<ToolRepr> for ToolChoice {
    type Error = String;

    fn try_from(repr: ToolRepr) -> Result<Self, Self::Error> {
        match repr {
            ToolRepr::Flag(false) => Ok(ToolChoice::Off),
            ToolRepr::Flag(true) => Err("expected a tool name or `false`, found `true`".to_string()),
            ToolRepr::Name(name) => Ok(ToolChoice::Named(name)),
        }
    }
}

impl From<ToolChoice> for ToolRepr {
    fn from(choice: ToolChoice) -> Self {
        match choice {
            ToolChoice::Off => ToolRepr::Flag(false),
            ToolChoice::Named(name) => ToolRepr::Name(name),
        }
    }
}

impl ToolChoice {
    /// The tool to run, or `None` when switched off.
    pub fn name(&self) -> Option<&str> {
        match self {
            ToolChoice::Off => None,
            ToolChoice::Named(name) => Some(name),
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, ToolChoice::Off)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive: `"error"`, `"info"`, `"catalog_ui=debug"`...
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_root_path() -> String {
    "/api/v1".to_string()
}
fn default_input() -> String {
    "http://localhost:8000/openapi.json".to_string()
}
fn default_output_path() -> PathBuf {
    PathBuf::from("src/client")
}
fn default_format() -> ToolChoice {
    ToolChoice::Named("prettier".to_string())
}
fn default_lint() -> ToolChoice {
    ToolChoice::Named("eslint".to_string())
}
fn default_plugins() -> Vec<PluginConfig> {
    vec![PluginConfig {
        name: CLIENT_FETCH_PLUGIN.to_string(),
        runtime_config_path: Some(PathBuf::from("./src/misc/hey-api.ts")),
    }]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientRuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            root_path: default_root_path(),
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_path: default_output_path(),
            format: default_format(),
            lint: default_lint(),
            plugins: default_plugins(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClientRuntimeConfig {
    /// `base_url` with a scheme and without a trailing slash.
    pub fn normalized_base_url(&self) -> String {
        let url = self.base_url.trim().trim_end_matches('/');
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        }
    }

    /// `root_path` with exactly one leading slash and no trailing slash;
    /// empty when the API is mounted at the server root.
    pub fn normalized_root_path(&self) -> String {
        let trimmed = self.root_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl CodegenConfig {
    /// `true` when the schema is fetched over HTTP rather than read from disk.
    pub fn input_is_remote(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }

    /// Runtime configuration module of the fetch client plugin, if set.
    pub fn runtime_config_module(&self) -> Option<&Path> {
        self.plugins
            .iter()
            .find(|p| p.name == CLIENT_FETCH_PLUGIN)
            .and_then(|p| p.runtime_config_path.as_deref())
    }

    /// Checks that the generation step has something to read and somewhere
    /// to write, and that no plugin is listed twice.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.trim().is_empty() {
            return Err(ConfigError::Invalid("codegen.input must not be empty".into()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "codegen.output_path must not be empty".into(),
            ));
        }
        for (key, tool) in [("codegen.format", &self.format), ("codegen.lint", &self.lint)] {
            if tool.name().is_some_and(|n| n.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be a tool name or false"
                )));
            }
        }
        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if plugin.name.trim().is_empty() {
                return Err(ConfigError::Invalid("plugin name must not be empty".into()));
            }
            if !seen.insert(plugin.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "plugin {} is listed more than once",
                    plugin.name
                )));
            }
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if the codegen section fails validation.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            AppConfig::default()
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.codegen.validate()?;
    Ok(cfg)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("catalog_test_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_default_codegen_matches_generator_setup() {
        // Arrange / Act
        let cfg = CodegenConfig::default();

        // Assert
        assert_eq!(cfg.input, "http://localhost:8000/openapi.json");
        assert_eq!(cfg.output_path, PathBuf::from("src/client"));
        assert_eq!(cfg.format.name(), Some("prettier"));
        assert_eq!(cfg.lint.name(), Some("eslint"));
        assert_eq!(
            cfg.runtime_config_module(),
            Some(Path::new("./src/misc/hey-api.ts"))
        );
        assert!(cfg.input_is_remote());
    }

    #[test]
    fn test_default_client_points_at_local_api() {
        let cfg = ClientRuntimeConfig::default();
        assert_eq!(cfg.normalized_base_url(), "http://localhost:8000");
        assert_eq!(cfg.normalized_root_path(), "/api/v1");
    }

    #[test]
    fn test_base_url_without_scheme_gets_https() {
        let cfg = ClientRuntimeConfig {
            base_url: "books.example.org/".to_string(),
            ..ClientRuntimeConfig::default()
        };
        assert_eq!(cfg.normalized_base_url(), "https://books.example.org");
    }

    #[test]
    fn test_root_path_is_normalised() {
        let mut cfg = ClientRuntimeConfig::default();
        cfg.root_path = "api/v2/".to_string();
        assert_eq!(cfg.normalized_root_path(), "/api/v2");
        cfg.root_path = "/".to_string();
        assert_eq!(cfg.normalized_root_path(), "");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_client_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[client]
base_url = "https://books.example.org"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.client.base_url, "https://books.example.org");
        assert_eq!(cfg.client.root_path, "/api/v1");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_deserialize_codegen_without_formatter() {
        // Arrange: local schema, custom formatter, plugin without runtime module
        let toml_str = r#"
[codegen]
input = "schema/openapi.json"
output_path = "generated"
format = "biome"

[[codegen.plugins]]
name = "@hey-api/typescript"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert!(!cfg.codegen.input_is_remote());
        assert_eq!(cfg.codegen.format.name(), Some("biome"));
        assert_eq!(cfg.codegen.lint.name(), Some("eslint"));
        assert_eq!(cfg.codegen.runtime_config_module(), None);
    }

    #[test]
    fn test_deserialize_false_switches_tool_off() {
        // Arrange
        let toml_str = r#"
[codegen]
format = false
lint = "oxlint"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert!(cfg.codegen.format.is_off());
        assert_eq!(cfg.codegen.format.name(), None);
        assert_eq!(cfg.codegen.lint.name(), Some("oxlint"));
    }

    #[test]
    fn test_deserialize_true_for_tool_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[codegen]\nformat = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_tool_name() {
        let cfg = CodegenConfig {
            lint: ToolChoice::Named(" ".to_string()),
            ..CodegenConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_disabled_tools_survive_save_and_load() {
        // Arrange
        let dir = scratch_dir();
        let path = dir.join("catalog.toml");
        let mut cfg = AppConfig::default();
        cfg.codegen.format = ToolChoice::Off;
        cfg.codegen.lint = ToolChoice::Off;

        // Act
        save_config(&path, &cfg).expect("save");
        let written = std::fs::read_to_string(&path).unwrap();
        let loaded = load_config(&path).expect("load");

        // Assert
        assert!(written.contains("format = false"));
        assert!(loaded.codegen.format.is_off());
        assert!(loaded.codegen.lint.is_off());
        assert_eq!(loaded, cfg);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_rejects_duplicate_plugins() {
        let mut cfg = CodegenConfig::default();
        cfg.plugins.push(cfg.plugins[0].clone());
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_input() {
        let cfg = CodegenConfig {
            input: "  ".to_string(),
            ..CodegenConfig::default()
        };
        assert_err!(cfg.validate());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert_ok!(CodegenConfig::default().validate());
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = scratch_dir().join("catalog.toml");
        let cfg = load_config(&path).expect("defaults for a missing file");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = scratch_dir();
        let path = dir.join("nested").join("catalog.toml");
        let mut cfg = AppConfig::default();
        cfg.client.base_url = "https://books.example.org".to_string();
        cfg.logging.level = "debug".to_string();

        // Act
        save_config(&path, &cfg).expect("save");
        let loaded = load_config(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_reports_parse_error() {
        // Arrange
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.toml");
        std::fs::write(&path, "[client\nbase_url = 1").unwrap();

        // Act
        let result = load_config(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_rejects_invalid_codegen_section() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.toml");
        std::fs::write(&path, "[codegen]\noutput_path = \"\"\n").unwrap();

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
