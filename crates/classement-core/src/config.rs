// Configuration loading and parsing (config/classement.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classify::{Classifier, DEFAULT_POSTPONED_TOKEN};

/// Looked up relative to the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/classement.toml";

/// Truncated names end in "...", so narrower columns cannot show anything.
const MIN_NAME_WIDTH: usize = 4;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classify: ClassifyConfig,
    pub standings: StandingsConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Case-insensitive status-label fragments meaning "postponed".
    pub postponed_tokens: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        ClassifyConfig {
            postponed_tokens: vec![DEFAULT_POSTPONED_TOKEN.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct StandingsConfig {
    /// Give every team in the data a row, even with no match played yet.
    pub include_unplayed_teams: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Label of the "no filter" team option.
    pub all_teams_label: String,
    /// Result and fixture lists.
    pub team_name_width: usize,
    /// League table.
    pub standings_name_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            all_teams_label: "Toutes".to_string(),
            team_name_width: 20,
            standings_name_width: 36,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "classement=info,warn".to_string(),
        }
    }
}

impl Config {
    pub fn classifier(&self) -> Classifier {
        Classifier::new(&self.classify.postponed_tokens)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate the config file at `path`, which must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    parse_config(&text, path)
}

/// Load the explicitly named file, or `config/classement.toml` under the
/// working directory when present, or built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    let default_path = std::env::current_dir()
        .map(|cwd| cwd.join(DEFAULT_CONFIG_PATH))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    if default_path.exists() {
        load_config_from(&default_path)
    } else {
        Ok(Config::default())
    }
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config
        .classify
        .postponed_tokens
        .iter()
        .any(|t| t.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "classify.postponed_tokens".into(),
            message: "must not contain empty tokens".into(),
        });
    }

    let widths: &[(&str, usize)] = &[
        ("display.team_name_width", config.display.team_name_width),
        (
            "display.standings_name_width",
            config.display.standings_name_width,
        ),
    ];
    for (name, val) in widths {
        if *val < MIN_NAME_WIDTH {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be at least {MIN_NAME_WIDTH}, got {val}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
