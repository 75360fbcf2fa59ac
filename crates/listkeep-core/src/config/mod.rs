//! Runtime configuration for the core services.
//!
//! Hosts build a [`CoreConfig`] (usually `CoreConfig::default()`, or from a
//! JSON document via [`parse_config`]) and hand it to
//! [`AppContext::new`](crate::AppContext::new).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_CONNECTIVITY_URL: &str = "https://www.google.com";
const DEFAULT_CONNECTIVITY_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_EXPORT_VERSION: &str = "1.0";

/// Tunables for the record store, journal and transfer codec
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// URL hit with a `HEAD` request to decide online/offline
    #[serde(default = "default_connectivity_url")]
    pub connectivity_url: String,
    /// Timeout for the connectivity probe
    #[serde(default = "default_connectivity_timeout_ms")]
    pub connectivity_timeout_ms: u64,
    /// Version string written into export envelopes
    #[serde(default = "default_export_version")]
    pub export_version: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            connectivity_url: default_connectivity_url(),
            connectivity_timeout_ms: default_connectivity_timeout_ms(),
            export_version: default_export_version(),
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub const fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity_timeout_ms)
    }

    /// Check and normalize values that came from outside the program
    pub fn validate(mut self) -> Result<Self> {
        let url = normalize_text_option(Some(self.connectivity_url)).ok_or_else(|| {
            Error::InvalidInput("config field 'connectivity_url' is required".to_string())
        })?;
        if !is_http_url(&url) {
            return Err(Error::InvalidInput(
                "config field 'connectivity_url' must include http:// or https://".to_string(),
            ));
        }
        self.connectivity_url = url;

        if self.connectivity_timeout_ms == 0 {
            return Err(Error::InvalidInput(
                "config field 'connectivity_timeout_ms' must be greater than zero".to_string(),
            ));
        }

        self.export_version = normalize_text_option(Some(self.export_version))
            .unwrap_or_else(default_export_version);
        Ok(self)
    }
}

/// Parse and validate a configuration document
pub fn parse_config(payload: &str) -> Result<CoreConfig> {
    let config: CoreConfig = serde_json::from_str(payload)
        .map_err(|error| Error::InvalidInput(format!("invalid config JSON: {error}")))?;
    config.validate()
}

fn default_connectivity_url() -> String {
    DEFAULT_CONNECTIVITY_URL.to_string()
}

const fn default_connectivity_timeout_ms() -> u64 {
    DEFAULT_CONNECTIVITY_TIMEOUT_MS
}

fn default_export_version() -> String {
    DEFAULT_EXPORT_VERSION.to_string()
}
