//! Startup licensing for trialgate applications.
//!
//! This crate decides, once per process start, whether the application is
//! licensed, inside its trial window, or expired:
//! - Client identity from the cloud-join tenant id, or a hardware fingerprint
//! - ECDSA P-256 / SHA-256 verification of license tokens
//! - A single status request to the licensing service
//! - A fixed-length trial clock
//!
//! # Trust
//!
//! The configured public key is the only trust anchor. Tokens read from the
//! local store and tokens returned by the service are both verified against
//! it before being believed; the transport and status codes are not trusted.
//!
//! # Token Format
//!
//! A token is `base64(DER(ECDSA-P256(SHA-256(identity))))`, persisted under
//! the `LicenseKey` value of the application's store.

mod config;
mod device;
mod error;
mod identity;
mod orchestrator;
mod remote;
mod signature;
mod store;
mod trial;

pub use config::LicenseConfig;
pub use device::{HostIdentityProvider, CLOUD_JOIN_KEY, DMI_DIR};
pub use error::{LicenseError, LicenseResult};
pub use identity::{resolve_identity, ClientIdentity, HardwareInfo, IdentityKind, IdentityProvider};
pub use orchestrator::{LicenseDecision, LicenseOrchestrator};
pub use remote::{
    RemoteStatus, StatusClient, StatusRequest, StatusResponse, StatusService, DEFAULT_TIMEOUT,
};
pub use signature::{verify_signature, TrustAnchor};
pub use store::{FileStore, KeyValueStore, MemoryStore, LICENSE_VALUE_NAME};
pub use trial::{days_left, parse_first_launch, DEFAULT_TRIAL_DAYS};
