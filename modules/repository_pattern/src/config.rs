//! Configuration for connecting a unit of work

use crate::contract::{Result, TxIsolationLevel};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use sea_orm::ConnectOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables overriding file configuration
pub const ENV_PREFIX: &str = "REPOSITORY_PATTERN_";

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite://...`, `postgres://...`)
    #[serde(default = "default_url")]
    pub url: String,

    /// Pool upper bound
    #[serde(default)]
    pub max_connections: Option<u32>,

    /// Pool lower bound
    #[serde(default)]
    pub min_connections: Option<u32>,

    #[serde(default, with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,

    /// Log every SQL statement through sqlx
    #[serde(default)]
    pub sqlx_logging: bool,

    /// Isolation used by `UnitOfWork::begin`
    #[serde(default)]
    pub default_isolation: TxIsolationLevel,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: None,
            min_connections: None,
            connect_timeout: None,
            idle_timeout: None,
            sqlx_logging: false,
            default_isolation: TxIsolationLevel::Unspecified,
        }
    }
}

fn default_url() -> String {
    "sqlite::memory:".to_owned()
}

impl DatabaseConfig {
    /// Defaults, then the YAML file at `path` if given, then environment
    /// variables prefixed with [`ENV_PREFIX`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)).extract()?)
    }

    /// SeaORM connect options for this configuration
    pub fn connect_options(&self) -> ConnectOptions {
        let mut opts = ConnectOptions::new(self.url.clone());
        if let Some(max) = self.max_connections {
            opts.max_connections(max);
        }
        if let Some(min) = self.min_connections {
            opts.min_connections(min);
        }
        if let Some(timeout) = self.connect_timeout {
            opts.connect_timeout(timeout);
        }
        if let Some(timeout) = self.idle_timeout {
            opts.idle_timeout(timeout);
        }
        opts.sqlx_logging(self.sqlx_logging);
        opts
    }
}
