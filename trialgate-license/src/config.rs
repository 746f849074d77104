//! Licensing configuration.

use crate::error::{LicenseError, LicenseResult};
use crate::remote::DEFAULT_TIMEOUT;
use crate::trial::DEFAULT_TRIAL_DAYS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything the gate needs to know about the licensing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// URL the status request is posted to.
    pub endpoint: String,
    /// Application id sent as `app`.
    pub app_id: String,
    /// Base64-encoded PEM public key license tokens are verified against.
    pub public_key: String,
    /// Trial length in days.
    pub trial_days: i64,
    /// Timeout for the status request, in seconds.
    pub timeout_secs: u64,
    /// Application namespace for the persisted license token.
    pub namespace: String,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            app_id: String::new(),
            public_key: String::new(),
            trial_days: DEFAULT_TRIAL_DAYS,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            namespace: "trialgate".to_string(),
        }
    }
}

impl LicenseConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if the file cannot be read and
    /// [`LicenseError::Serialization`] if it is not valid JSON.
    pub fn from_file(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LicenseError::Config(format!("reading {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Checks that the required values are present.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] naming the first missing value.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(LicenseError::Config("endpoint is required".to_string()));
        }
        if self.app_id.trim().is_empty() {
            return Err(LicenseError::Config("app_id is required".to_string()));
        }
        if self.public_key.trim().is_empty() {
            return Err(LicenseError::Config("public_key is required".to_string()));
        }
        if self.trial_days <= 0 {
            return Err(LicenseError::Config("trial_days must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(LicenseError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
