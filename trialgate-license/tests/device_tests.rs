use trialgate_license::{
    resolve_identity, HostIdentityProvider, IdentityKind, IdentityProvider, LicenseError,
};

#[cfg(not(target_os = "windows"))]
#[test]
fn no_tenant_outside_windows() {
    assert_eq!(HostIdentityProvider::new().tenant_id(), None);
}

#[test]
fn host_hardware_is_read_or_unavailable() {
    match HostIdentityProvider::new().hardware_info() {
        Ok(info) => assert_eq!(info.fingerprint().matches('|').count(), 2),
        Err(err) => assert!(matches!(err, LicenseError::IdentityUnavailable(_))),
    }
}

#[test]
fn host_identity_is_stable() {
    let provider = HostIdentityProvider::new();
    match (resolve_identity(&provider), resolve_identity(&provider)) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(LicenseError::IdentityUnavailable(_)), Err(LicenseError::IdentityUnavailable(_))) => {}
        other => panic!("unstable identity resolution: {other:?}"),
    }
}

#[cfg(not(target_os = "windows"))]
#[test]
fn host_identity_is_device_based_outside_windows() {
    if let Ok(identity) = resolve_identity(&HostIdentityProvider::new()) {
        assert_eq!(identity.kind(), IdentityKind::Device);
    }
}
