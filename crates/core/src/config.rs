//! Catalog settings, resolved in layers: built-in defaults, then a TOML file, then
//! `CATALOG_*` environment variables. The merged result is validated before use.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Files tried, in order, when no explicit path is given.
pub const CONFIG_FILE_CANDIDATES: &[&str] = &["catalog.toml", "config/catalog.toml"];

/// Dotted config key and the environment variables that set it, highest priority first.
pub const ENV_BINDINGS: &[(&str, &[&str])] = &[
    ("database.url", &["CATALOG_DATABASE_URL"]),
    ("database.max_connections", &["CATALOG_DATABASE_MAX_CONNECTIONS"]),
    ("database.timeout_secs", &["CATALOG_DATABASE_TIMEOUT_SECS"]),
    ("server.bind_address", &["CATALOG_SERVER_BIND_ADDRESS"]),
    ("server.port", &["CATALOG_SERVER_PORT"]),
    ("server.request_timeout_secs", &["CATALOG_SERVER_REQUEST_TIMEOUT_SECS"]),
    ("logging.level", &["CATALOG_LOGGING_LEVEL", "CATALOG_LOG_LEVEL"]),
    ("logging.format", &["CATALOG_LOGGING_FORMAT", "CATALOG_LOG_FORMAT"]),
];

#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!(
                "logging.format `{other}` is not one of compact|pretty|json"
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config file references unset environment variable `{0}`")]
    UnsetVariable(String),
    #[error("environment variable `{var}` has invalid value `{value}`")]
    InvalidVariable { var: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://catalog.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    /// Loads from the process environment. An explicit `path` must exist; without one
    /// the first existing [`CONFIG_FILE_CANDIDATES`] entry is used, if any.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = config_file(path);
        Self::from_layers(file.as_deref(), |name: &str| env::var(name).ok())
    }

    fn from_layers(
        file: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = file {
            file_layer(path, &lookup)?.apply_to(&mut config);
        }
        env_layer(&lookup)?.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            return Err(ConfigError::Invalid(
                "database.url must be a sqlite URL (`sqlite://...` or `sqlite::memory:`)"
                    .to_string(),
            ));
        }
        within("database.max_connections", u64::from(self.database.max_connections), 1, 256)?;
        within("database.timeout_secs", self.database.timeout_secs, 1, 300)?;

        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind_address must not be empty".to_string()));
        }
        within("server.port", u64::from(self.server.port), 1, u64::from(u16::MAX))?;
        within("server.request_timeout_secs", self.server.request_timeout_secs, 1, 300)?;

        let level = self.logging.level.trim().to_ascii_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(ConfigError::Invalid(format!(
                "logging.level `{}` is not one of trace|debug|info|warn|error",
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// The file [`AppConfig::load`] would read for `explicit`.
pub fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

/// Reads an environment variable the way the loader does: blank values count as unset.
pub fn read_env(name: &str) -> Option<String> {
    non_blank(env::var(name).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn within(key: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{key} must be in range {min}..={max}, got {value}")))
    }
}

/// One partial source of settings. Unset fields leave the lower layer untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Layer {
    database: DatabaseLayer,
    server: ServerLayer,
    logging: LoggingLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DatabaseLayer {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerLayer {
    bind_address: Option<String>,
    port: Option<u16>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingLayer {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl Layer {
    fn apply_to(self, config: &mut AppConfig) {
        set(&mut config.database.url, self.database.url);
        set(&mut config.database.max_connections, self.database.max_connections);
        set(&mut config.database.timeout_secs, self.database.timeout_secs);
        set(&mut config.server.bind_address, self.server.bind_address);
        set(&mut config.server.port, self.server.port);
        set(&mut config.server.request_timeout_secs, self.server.request_timeout_secs);
        set(&mut config.logging.level, self.logging.level);
        set(&mut config.logging.format, self.logging.format);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn file_layer(path: &Path, lookup: &impl Fn(&str) -> Option<String>) -> Result<Layer, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let expanded = expand_variables(&raw, lookup)?;
    toml::from_str(&expanded).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Replaces every `${NAME}` with the variable's value. Unset names are an error.
fn expand_variables(
    raw: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or_else(|| {
            ConfigError::Invalid("unterminated `${` expression in config file".to_string())
        })?;
        let name = &tail[..end];
        let value = lookup(name).ok_or_else(|| ConfigError::UnsetVariable(name.to_string()))?;
        expanded.push_str(&value);
        rest = &tail[end + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

fn env_layer(lookup: &impl Fn(&str) -> Option<String>) -> Result<Layer, ConfigError> {
    let text = |key: &str| env_value(lookup, key).map(|(_, value)| value);

    Ok(Layer {
        database: DatabaseLayer {
            url: text("database.url"),
            max_connections: env_parsed(lookup, "database.max_connections")?,
            timeout_secs: env_parsed(lookup, "database.timeout_secs")?,
        },
        server: ServerLayer {
            bind_address: text("server.bind_address"),
            port: env_parsed(lookup, "server.port")?,
            request_timeout_secs: env_parsed(lookup, "server.request_timeout_secs")?,
        },
        logging: LoggingLayer {
            level: text("logging.level"),
            format: env_parsed(lookup, "logging.format")?,
        },
    })
}

/// First non-blank variable bound to `key`, with the name it was read from.
fn env_value(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<(&'static str, String)> {
    let (_, names) = ENV_BINDINGS.iter().find(|(bound, _)| *bound == key)?;
    names.iter().find_map(|name| non_blank(lookup(name)).map(|value| (*name, value)))
}

fn env_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    env_value(lookup, key)
        .map(|(var, value)| {
            value.trim().parse().map_err(|_| ConfigError::InvalidVariable { var, value })
        })
        .transpose()
}
