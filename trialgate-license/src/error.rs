//! Error types for the licensing gate.

use thiserror::Error;

/// Licensing-specific errors.
///
/// Every variant is terminal for the current evaluation; nothing in the
/// chain retries.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Neither a tenant id nor a hardware fingerprint could be read.
    #[error("client identity unavailable: {0}")]
    IdentityUnavailable(String),

    /// The configured public key is not base64 PEM of an ECDSA P-256 key.
    #[error("invalid public key: {0}")]
    KeyFormat(String),

    /// A license token is not valid base64.
    #[error("invalid license token encoding: {0}")]
    SignatureFormat(String),

    /// Transport failure talking to the licensing service.
    #[error("network error: {0}")]
    Network(String),

    /// The licensing service answered with something we cannot use.
    #[error("invalid license service response: {0}")]
    ResponseFormat(String),

    /// The licensing service returned a status code we do not model.
    #[error("unhandled licensing status {0}")]
    UnknownStatus(i32),

    /// First-launch date could not be parsed.
    #[error("invalid first launch date {0:?}")]
    DateParse(String),

    /// Trial window is closed and no license was issued.
    #[error("your trial period has ended")]
    TrialExpired,

    /// The license store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
