//! Client identity resolution.
//!
//! A client is identified either by the tenant it is cloud-joined to or,
//! failing that, by a hardware fingerprint of the form
//! `Manufacturer|Model|SerialNumber`. The tenant id always wins when present.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which source the client identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Hardware fingerprint of this machine.
    Device,
    /// Cloud-join tenant id shared by every machine in the tenant.
    Tenant,
}

impl IdentityKind {
    /// Value sent as `type` in the status request.
    #[must_use]
    pub fn request_type(self) -> u8 {
        match self {
            Self::Device => 1,
            Self::Tenant => 2,
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::Tenant => f.write_str("tenant"),
        }
    }
}

/// A resolved client identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    value: String,
    kind: IdentityKind,
}

impl ClientIdentity {
    /// Creates a tenant-scoped identity.
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            value: tenant_id.into(),
            kind: IdentityKind::Tenant,
        }
    }

    /// Creates a device-scoped identity from a hardware fingerprint.
    pub fn device(fingerprint: impl Into<String>) -> Self {
        Self {
            value: fingerprint.into(),
            kind: IdentityKind::Device,
        }
    }

    /// The identity string; this is what license tokens sign.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Where the identity came from.
    #[must_use]
    pub fn kind(&self) -> IdentityKind {
        self.kind
    }
}

/// Hardware fields used for the device fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    /// System manufacturer.
    pub manufacturer: String,
    /// System model.
    pub model: String,
    /// BIOS serial number.
    pub serial_number: String,
}

impl HardwareInfo {
    /// Joins the fields as `Manufacturer|Model|SerialNumber`.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!("{}|{}|{}", self.manufacturer, self.model, self.serial_number)
    }

    fn is_blank(&self) -> bool {
        self.manufacturer.trim().is_empty()
            && self.model.trim().is_empty()
            && self.serial_number.trim().is_empty()
    }
}

/// Source of the raw identity material.
pub trait IdentityProvider {
    /// Tenant id of the cloud-join registration, if this host has one.
    fn tenant_id(&self) -> Option<String>;

    /// Manufacturer, model and serial number of this machine.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::IdentityUnavailable`] if the platform does not
    /// expose the fields.
    fn hardware_info(&self) -> LicenseResult<HardwareInfo>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn tenant_id(&self) -> Option<String> {
        (**self).tenant_id()
    }

    fn hardware_info(&self) -> LicenseResult<HardwareInfo> {
        (**self).hardware_info()
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn tenant_id(&self) -> Option<String> {
        (**self).tenant_id()
    }

    fn hardware_info(&self) -> LicenseResult<HardwareInfo> {
        (**self).hardware_info()
    }
}

/// Resolves the client identity, preferring the tenant id.
///
/// The hardware query is only made when no non-empty tenant id exists.
///
/// # Errors
///
/// Returns [`LicenseError::IdentityUnavailable`] when there is no tenant id
/// and the hardware fields cannot be read or are all empty.
pub fn resolve_identity<P: IdentityProvider + ?Sized>(
    provider: &P,
) -> LicenseResult<ClientIdentity> {
    if let Some(tenant_id) = provider.tenant_id() {
        if !tenant_id.trim().is_empty() {
            debug!("Using tenant based license");
            return Ok(ClientIdentity::tenant(tenant_id));
        }
    }

    debug!("Using device based license");
    let info = provider.hardware_info()?;
    if info.is_blank() {
        return Err(LicenseError::IdentityUnavailable(
            "system information is empty".to_string(),
        ));
    }
    Ok(ClientIdentity::device(info.fingerprint()))
}
