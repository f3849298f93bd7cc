//! Configuration for a reconciliation pass
//!
//! Configuration is read once at startup from environment-style key/value
//! pairs. Missing or malformed required values are fatal before any network
//! call is made.
//!
//! ## Keys
//!
//! | Key | Legacy fallback | Required |
//! |-----|-----------------|----------|
//! | `ZONE_ID` | `AWS_HOSTED_ZONE_ID` | yes |
//! | `DOMAIN_NAME` | `AWS_HOSTED_ZONE_DOMAIN_NAME` | yes |
//! | `DOMAIN_TYPE` | `AWS_HOSTED_ZONE_DOMAIN_TYPE` | yes |
//! | `DOMAIN_TTL` | `AWS_HOSTED_ZONE_DOMAIN_TTL` | yes |
//! | `IP_LOOKUP_URL` | | no (`https://ifconfig.me/ip`) |
//! | `DDNS_LOG_LEVEL` | | no (`info`) |
//! | `DDNS_MODE` | | no (`live`) |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Default public IP lookup endpoint
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://ifconfig.me/ip";

/// Largest TTL the provider accepts (signed 32-bit)
pub const MAX_TTL: i64 = 2_147_483_647;

/// Configuration for one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Target hosted zone identifier
    pub zone_id: String,

    /// Record name, exactly as the provider stores it (e.g. "home.example.com.")
    pub domain_name: String,

    /// Record type (e.g. "A")
    pub domain_type: String,

    /// TTL in seconds, used only on upsert
    pub domain_ttl: i64,

    /// URL of the "what is my IP" service
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Whether changes are submitted or only logged
    #[serde(default)]
    pub mode: RunMode,

    /// Log level for the binary's subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the reconcile event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Submit changes to the provider
    #[default]
    Live,
    /// Decide as usual but never submit the change
    DryRun,
}

impl FromStr for RunMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(RunMode::Live),
            "dry-run" | "dryrun" => Ok(RunMode::DryRun),
            other => Err(crate::Error::config(format!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ))),
        }
    }
}

impl ReconcileConfig {
    /// Create a configuration with defaults for the optional settings
    pub fn new(
        zone_id: impl Into<String>,
        domain_name: impl Into<String>,
        domain_type: impl Into<String>,
        domain_ttl: i64,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            domain_name: domain_name.into(),
            domain_type: domain_type.into(),
            domain_ttl,
            ip_lookup_url: default_ip_lookup_url(),
            mode: RunMode::default(),
            log_level: default_log_level(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the run mode
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the IP lookup URL
    pub fn with_ip_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.ip_lookup_url = url.into();
        self
    }

    /// Load from the process environment, falling back to a dotenv file
    ///
    /// Variables already present in the environment take precedence over
    /// the file. A missing file is not an error; an unreadable one is.
    pub fn load(dotenv_path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = dotenv_path.as_ref();
        let file_vars = if path.exists() {
            read_dotenv(path)?
        } else {
            HashMap::new()
        };

        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Build and validate a configuration from a key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str, legacy: &str| -> Result<String, crate::Error> {
            lookup(key).or_else(|| lookup(legacy)).ok_or_else(|| {
                crate::Error::config(format!(
                    "{} is required. Set it via: export {}=...",
                    key, key
                ))
            })
        };

        let zone_id = required("ZONE_ID", "AWS_HOSTED_ZONE_ID")?;
        let domain_name = required("DOMAIN_NAME", "AWS_HOSTED_ZONE_DOMAIN_NAME")?;
        let domain_type = required("DOMAIN_TYPE", "AWS_HOSTED_ZONE_DOMAIN_TYPE")?;
        let raw_ttl = required("DOMAIN_TTL", "AWS_HOSTED_ZONE_DOMAIN_TTL")?;

        let domain_ttl = raw_ttl.trim().parse::<i64>().map_err(|_| {
            crate::Error::config(format!(
                "DOMAIN_TTL must be an integer number of seconds. Got: '{}'",
                raw_ttl
            ))
        })?;

        let mode = match lookup("DDNS_MODE") {
            Some(raw) => raw.parse()?,
            None => RunMode::default(),
        };

        let config = Self {
            zone_id,
            domain_name,
            domain_type,
            domain_ttl,
            ip_lookup_url: lookup("IP_LOOKUP_URL").unwrap_or_else(default_ip_lookup_url),
            mode,
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(default_log_level),
            event_channel_capacity: default_event_channel_capacity(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("ZONE_ID cannot be empty"));
        }

        if self.domain_name.trim().is_empty() {
            return Err(crate::Error::config("DOMAIN_NAME cannot be empty"));
        }

        if self.domain_type.trim().is_empty() {
            return Err(crate::Error::config("DOMAIN_TYPE cannot be empty"));
        }

        if !(0..=MAX_TTL).contains(&self.domain_ttl) {
            return Err(crate::Error::config(format!(
                "DOMAIN_TTL must be between 0 and {} seconds. Got: {}",
                MAX_TTL, self.domain_ttl
            )));
        }

        if !self.ip_lookup_url.starts_with("https://") && !self.ip_lookup_url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "IP_LOOKUP_URL must use HTTP or HTTPS scheme. Got: {}",
                self.ip_lookup_url
            )));
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(format!(
                    "DDNS_LOG_LEVEL '{}' is not valid. \
                    Valid levels: trace, debug, info, warn, error",
                    self.log_level
                )));
            }
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, crate::Error> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| {
            crate::Error::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn default_ip_lookup_url() -> String {
    DEFAULT_IP_LOOKUP_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_channel_capacity() -> usize {
    16
}
