//! Server configuration

use anyhow::{bail, Context, Result};
use classifier_lib::{
    classifier::TreeConfig,
    pipeline::{SplitConfig, DEFAULT_TEST_RATIO},
    scheduler::{Cadence, DEFAULT_RETRAIN_CRON},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional config file
pub const CONFIG_PATH_ENV: &str = "IRIS_CONFIG";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Public port for prediction, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Admin listener address, loopback unless overridden
    #[serde(default = "default_admin_bind")]
    pub admin_bind: IpAddr,

    #[serde(default = "default_admin_port")]
    pub admin_port: u16,

    /// Cron expression (seconds first) for scheduled retraining
    #[serde(default = "default_retrain_cron")]
    pub retrain_cron: String,

    /// Fixed retrain period; takes precedence over `retrain_cron`
    #[serde(default)]
    pub retrain_interval_secs: Option<u64>,

    /// Fraction of the dataset held out for evaluation
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,

    /// Fixed shuffle seed for reproducible splits
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(default = "default_min_leaf_size")]
    pub min_leaf_size: usize,

    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_secs: u64,

    /// CSV training data; the embedded Iris sample when unset
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "iris-classifier".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_admin_bind() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_admin_port() -> u16 {
    9091
}

fn default_retrain_cron() -> String {
    DEFAULT_RETRAIN_CRON.to_string()
}

fn default_test_ratio() -> f64 {
    DEFAULT_TEST_RATIO
}

fn default_max_depth() -> u32 {
    5
}

fn default_min_leaf_size() -> usize {
    1
}

fn default_refresh_timeout() -> u64 {
    120
}

impl AppConfig {
    /// Load configuration from the optional `IRIS_CONFIG` file and `IRIS_*` environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::build(path, config::Environment::with_prefix("IRIS").try_parsing(true))
    }

    fn build(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(env)
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            bail!("test_ratio must be in (0, 1), got {}", self.test_ratio);
        }
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        if self.min_leaf_size == 0 {
            bail!("min_leaf_size must be at least 1");
        }
        if self.refresh_timeout_secs == 0 {
            bail!("refresh_timeout_secs must be positive");
        }
        if self.api_port == self.admin_port {
            bail!("api_port and admin_port must differ");
        }
        self.cadence()?;
        Ok(())
    }

    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            test_ratio: self.test_ratio,
            seed: self.shuffle_seed,
        }
    }

    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_leaf_size: self.min_leaf_size,
        }
    }

    pub fn cadence(&self) -> Result<Cadence> {
        let cadence = match self.retrain_interval_secs {
            Some(secs) => Cadence::every(Duration::from_secs(secs))?,
            None => Cadence::cron(&self.retrain_cron)?,
        };
        Ok(cadence)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.api_port))
    }

    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.admin_bind, self.admin_port)
    }
}
