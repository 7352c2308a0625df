//! The immutable configuration record for one invocation.
//!
//! Settings that make sense to keep between runs (block size, client path,
//! sudo, logging) are layered with figment: defaults, the TOML file, then
//! `SAFEDD_*` environment variables, then command-line flags. Everything
//! about the current write (input, target, constraints) comes only from the
//! command line.

use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::matcher::MatchConstraint;
use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::source::InputSpec;

const DEFAULT_CONFIG_PATH: &str = "/etc/safedd/config.toml";

/// Block size operands dd understands
static BLOCK_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*(c|w|b|k|K|kB|KB|xM|[MGTPEZY]B?)?$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub block_size: String,
    pub mc_binary: PathBuf,
    pub use_sudo: bool,
    pub verbose: bool,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_size: "4M".to_string(),
            mc_binary: PathBuf::from("mc"),
            use_sudo: false,
            verbose: false,
            log_json: false,
        }
    }
}

/// Command-line values for [`Settings`]; unset flags leave the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mc_binary: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_sudo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_json: Option<bool>,
}

/// What this particular run was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub input: Option<String>,
    pub newest: bool,
    pub output: Option<String>,
    pub expected_size: Option<String>,
    pub expected_model: Option<String>,
    pub list: bool,
    pub dry_run: bool,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: Option<InputSpec>,
    pub newest: bool,
    pub output: Option<String>,
    pub constraints: MatchConstraint,
    pub block_size: String,
    pub mc_binary: PathBuf,
    pub use_sudo: bool,
    pub list_only: bool,
    pub dry_run: bool,
    pub force: bool,
    pub verbose: bool,
    pub log_json: bool,
}

impl AppConfig {
    pub fn new(invocation: Invocation, overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let figment = Self::layers().merge(Serialized::defaults(overrides));
        Self::from_figment(figment, invocation)
    }

    /// Defaults, config file and environment, without command-line flags.
    pub fn layers() -> Figment {
        let path = env::var_os("SAFEDD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SAFEDD_"))
    }

    pub fn from_figment(figment: Figment, invocation: Invocation) -> Result<Self, ConfigError> {
        let settings: Settings = figment.extract().map_err(Box::new)?;

        let model = match non_empty(invocation.expected_model) {
            Some(pattern) => Some(Regex::new(&pattern).map_err(|source| {
                ConfigError::InvalidModelPattern { pattern, source }
            })?),
            None => None,
        };

        if !BLOCK_SIZE.is_match(&settings.block_size) {
            return Err(ConfigError::InvalidBlockSize(settings.block_size));
        }

        let input = non_empty(invocation.input)
            .map(|input| InputSpec::parse(&input))
            .transpose()?;

        if invocation.newest && input.is_none() {
            return Err(ConfigError::NewestWithoutInput);
        }
        if !invocation.list && input.is_none() {
            return Err(ConfigError::MissingInput);
        }

        Ok(Self {
            input,
            newest: invocation.newest,
            output: non_empty(invocation.output),
            constraints: MatchConstraint {
                size: non_empty(invocation.expected_size),
                model,
            },
            block_size: settings.block_size,
            mc_binary: settings.mc_binary,
            use_sudo: settings.use_sudo,
            list_only: invocation.list,
            dry_run: invocation.dry_run,
            force: invocation.force,
            verbose: settings.verbose,
            log_json: settings.log_json,
        })
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            json: self.log_json,
            verbose: self.verbose,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
