use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::paths::resolve_home_dir;

/// Environment overrides look like `APP__SERVER__PORT=8090`.
pub const ENV_PREFIX: &str = "APP__";

const HOME_SUBDIR: &str = ".gatekeeper";

/// Process configuration. `database` and `logging` stay `None` unless the
/// file or the environment sets them; `modules` holds one raw section per module.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Empty means `~/.gatekeeper`. Absolute after loading.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout; 0 disables it.
    pub timeout_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".into(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://...` (relative paths resolve under `home_dir`) or `postgres://...`
    pub url: String,
    pub max_conns: Option<u32>,
    pub busy_timeout_ms: Option<u32>,
}

/// Subsystem (tracing target) to log settings; `default` catches the rest.
pub type LoggingConfig = HashMap<String, LogSection>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSection {
    pub console_level: String,
    /// Relative to `home_dir`; empty disables the file sink.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub fn default_logging() -> LoggingConfig {
    HashMap::from([(
        "default".to_string(),
        LogSection {
            console_level: "info".into(),
            file: "logs/gatekeeper.log".into(),
            file_level: "debug".into(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl AppConfig {
    /// Built-in defaults, used when no config file is given: a SQLite file
    /// under the home dir and the default log sinks.
    pub fn builtin() -> Self {
        Self {
            database: Some(DatabaseConfig {
                url: "sqlite://database/gatekeeper.db".into(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging()),
            ..Self::default()
        }
    }

    /// `path` layered as YAML over the server defaults, then `APP__*` env vars.
    /// Without a path the built-in defaults are used. The home dir is resolved
    /// and created either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path, ENV_PREFIX)?,
            None => Self::builtin(),
        };
        let configured = Some(config.server.home_dir.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let home = resolve_home_dir(configured, HOME_SUBDIR, true)
            .context("failed to resolve server.home_dir")?;
        config.server.home_dir = home.to_string_lossy().into_owned();
        Ok(config)
    }

    fn from_file(path: &Path, env_prefix: &str) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Typed view of `modules.<name>`; a missing section reads as `{}`.
    pub fn module_config<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let raw = self
            .modules
            .get(name)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        serde_json::from_value(raw).with_context(|| format!("invalid config for module '{name}'"))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to render config as YAML")
    }

    /// `--port` and `-v` flags. Verbosity raises the default console level.
    pub fn apply_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        let level = match verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging);
        if let Some(section) = logging.get_mut("default") {
            section.console_level = level.into();
        }
    }
}
