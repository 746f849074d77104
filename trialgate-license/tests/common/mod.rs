//! Shared test helpers for licensing tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::{EncodePublicKey, LineEnding};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use trialgate_license::{
    ClientIdentity, HardwareInfo, IdentityProvider, KeyValueStore, LicenseConfig, LicenseError,
    LicenseResult, MemoryStore, StatusRequest, StatusResponse, StatusService,
};

pub const TENANT_ID: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";
pub const DEVICE_FINGERPRINT: &str = "Dell Inc.|XPS 13 9310|7H2K3L3";

/// Returns a deterministic P-256 signing key from a fixed seed.
pub fn test_signing_key() -> SigningKey {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    SigningKey::from_slice(&seed).unwrap()
}

/// A second, unrelated signing key.
pub fn other_signing_key() -> SigningKey {
    SigningKey::from_slice(&[0x42; 32]).unwrap()
}

/// Base64-encoded PEM public key for `signing_key`, as shipped in config.
pub fn public_key_b64(signing_key: &SigningKey) -> String {
    BASE64.encode(public_key_pem(signing_key).as_bytes())
}

/// PEM public key for `signing_key`.
pub fn public_key_pem(signing_key: &SigningKey) -> String {
    signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

/// DER signature bytes over `identity`.
pub fn sign_der(signing_key: &SigningKey, identity: &str) -> Vec<u8> {
    let signature: Signature = signing_key.sign(identity.as_bytes());
    signature.to_der().as_bytes().to_vec()
}

/// License token for `identity`: base64 of the DER signature.
pub fn sign_identity(signing_key: &SigningKey, identity: &str) -> String {
    BASE64.encode(sign_der(signing_key, identity))
}

/// A valid configuration trusting [`test_signing_key`].
pub fn test_config(endpoint: &str) -> LicenseConfig {
    LicenseConfig {
        endpoint: endpoint.to_string(),
        app_id: "hello".to_string(),
        public_key: public_key_b64(&test_signing_key()),
        ..Default::default()
    }
}

pub fn test_hardware() -> HardwareInfo {
    HardwareInfo {
        manufacturer: "Dell Inc.".to_string(),
        model: "XPS 13 9310".to_string(),
        serial_number: "7H2K3L3".to_string(),
    }
}

/// Identity provider double that counts how often each source is queried.
#[derive(Debug, Default)]
pub struct FakeIdentity {
    tenant: Option<String>,
    hardware: Option<HardwareInfo>,
    pub tenant_calls: AtomicUsize,
    pub hardware_calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn tenant(tenant_id: &str) -> Self {
        Self {
            tenant: Some(tenant_id.to_string()),
            hardware: Some(test_hardware()),
            ..Default::default()
        }
    }

    pub fn device(hardware: HardwareInfo) -> Self {
        Self {
            hardware: Some(hardware),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn hardware_calls(&self) -> usize {
        self.hardware_calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for FakeIdentity {
    fn tenant_id(&self) -> Option<String> {
        self.tenant_calls.fetch_add(1, Ordering::SeqCst);
        self.tenant.clone()
    }

    fn hardware_info(&self) -> LicenseResult<HardwareInfo> {
        self.hardware_calls.fetch_add(1, Ordering::SeqCst);
        self.hardware
            .clone()
            .ok_or_else(|| LicenseError::IdentityUnavailable("cannot read BIOS information".into()))
    }
}

/// Store double that counts reads and writes.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    fail_writes: bool,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            inner: MemoryStore::with_value(name, value),
            ..Default::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.inner.get(name).unwrap()
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, name: &str) -> LicenseResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(name)
    }

    fn set(&self, name: &str, value: &str) -> LicenseResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(LicenseError::Storage("read-only store".into()));
        }
        self.inner.set(name, value)
    }
}

/// Status service double returning a canned response.
#[derive(Debug, Default)]
pub struct FakeStatusService {
    response: Option<StatusResponse>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<StatusRequest>>,
}

impl FakeStatusService {
    pub fn replying(status: i32, message: &str) -> Self {
        Self {
            response: Some(StatusResponse {
                status,
                message: Some(message.to_string()),
            }),
            ..Default::default()
        }
    }

    /// Every request fails with a network error.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<StatusRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl StatusService for FakeStatusService {
    async fn query_status(
        &self,
        app_id: &str,
        identity: &ClientIdentity,
    ) -> LicenseResult<StatusResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push(StatusRequest::new(app_id, identity));
        self.response
            .clone()
            .ok_or_else(|| LicenseError::Network("connection refused".into()))
    }
}
