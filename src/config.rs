use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use dirs_next as dirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8228";
pub const DEFAULT_CONFIG_URL: &str = "https://raw.githubusercontent.com/anchore/anchore-engine/master/scripts/docker-compose/config.yaml";
pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yaml";
pub const DEFAULT_ENGINE_LOG: &str = "anchore-engine.log";

/// Connection defaults handed to `anchore-cli`/`anchore-manager` when the
/// caller's environment does not already provide them.
pub const ENGINE_ENV_DEFAULTS: [(&str, &str); 5] = [
    ("ANCHORE_HOST_ID", "localhost"),
    ("ANCHORE_ENDPOINT_HOSTNAME", "localhost"),
    ("ANCHORE_CLI_USER", "admin"),
    ("ANCHORE_CLI_PASS", "foobar"),
    ("ANCHORE_CLI_SSL_VERIFY", "n"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the engine REST API.
    pub engine_url: String,
    /// Where the engine's `config.yaml` is downloaded from during setup.
    pub config_url: String,
    pub config_path: PathBuf,
    /// Log file receiving the engine's stdout and stderr.
    pub engine_log: PathBuf,
    /// Directory that report files are written into.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            config_url: DEFAULT_CONFIG_URL.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            engine_log: PathBuf::from(DEFAULT_ENGINE_LOG),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        let path = config_file_path()?;
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            Self::parse(&contents)
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self, AppError> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, AppError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url())
    }

    pub fn system_url(&self) -> String {
        format!("{}/v1/system/feeds", self.base_url())
    }

    pub fn image_url(&self, digest: &str) -> String {
        format!("{}/v1/images/{}", self.base_url(), digest)
    }

    fn base_url(&self) -> &str {
        self.engine_url.trim_end_matches('/')
    }
}

pub fn config_file_path() -> Result<PathBuf, AppError> {
    let config_root = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| {
            AppError::config("Unable to determine configuration directory for this platform")
        })?;
    Ok(config_root.join("anchore-ci").join("config.toml"))
}

/// Engine connection settings resolved from the environment plus defaults.
#[derive(Debug, Clone)]
pub struct EngineEnv {
    vars: BTreeMap<&'static str, String>,
}

impl EngineEnv {
    pub fn from_process() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Existing values win; defaults fill only the gaps.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = ENGINE_ENV_DEFAULTS
            .iter()
            .map(|&(name, default)| (name, lookup(name).unwrap_or_else(|| default.to_string())))
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn user(&self) -> &str {
        self.get("ANCHORE_CLI_USER").unwrap_or("admin")
    }

    pub fn password(&self) -> SecretString {
        SecretString::from(self.get("ANCHORE_CLI_PASS").unwrap_or("foobar").to_string())
    }

    pub fn ssl_verify(&self) -> bool {
        !matches!(
            self.get("ANCHORE_CLI_SSL_VERIFY").map(str::to_ascii_lowercase).as_deref(),
            Some("n" | "no" | "false" | "0")
        )
    }
}
