use clap::Args;
use std::time::Duration;

use crate::error::{Error, Result};

/// Connection settings for the Crusoe API
#[derive(Args, Debug, Clone)]
pub struct CrusoeConfig {
    /// Crusoe API endpoint
    #[arg(
        long,
        env = "CRUSOE_API_ENDPOINT",
        default_value = "https://api.crusoecloud.com/v1alpha5"
    )]
    pub api_endpoint: String,

    /// API access key
    #[arg(long, env = "CRUSOE_ACCESS_KEY", default_value = "")]
    pub access_key: String,

    /// API secret key
    #[arg(long, env = "CRUSOE_SECRET_KEY", default_value = "", hide_env_values = true)]
    pub secret_key: String,

    /// Project every instance lookup is scoped to
    #[arg(long, env = "CRUSOE_PROJECT_ID", default_value = "")]
    pub project_id: String,

    /// Timeout for a single API request, in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl CrusoeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(Error::Config(
                "CRUSOE_PROJECT_ID environment variable is not set".into(),
            ));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(Error::Config(
                "CRUSOE_ACCESS_KEY and CRUSOE_SECRET_KEY must both be set".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Tuning for the instance liveness tracker
#[derive(Args, Debug, Clone)]
pub struct LivenessConfig {
    /// How long an instance must stay missing before it is reported deleted
    #[arg(long, default_value_t = 300)]
    pub grace_period_secs: u64,

    /// How often stale liveness entries are swept
    #[arg(long, default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// Age after which a liveness entry is dropped (0 keeps entries forever)
    #[arg(long, default_value_t = 1800)]
    pub liveness_retention_secs: u64,
}

impl LivenessConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// `None` when sweeping is disabled
    pub fn retention(&self) -> Option<Duration> {
        (self.liveness_retention_secs > 0).then(|| Duration::from_secs(self.liveness_retention_secs))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs == 0 {
            return Err(Error::Config("sweep interval must be positive".into()));
        }
        if let Some(retention) = self.retention() {
            if retention <= self.grace_period() {
                return Err(Error::Config(format!(
                    "liveness retention ({}s) must exceed the grace period ({}s)",
                    self.liveness_retention_secs, self.grace_period_secs
                )));
            }
        }
        Ok(())
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 300,
            sweep_interval_secs: 300,
            liveness_retention_secs: 1800,
        }
    }
}
