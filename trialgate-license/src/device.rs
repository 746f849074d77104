//! Host identity provider.
//!
//! Reads the cloud-join tenant id and the system/BIOS fields of the machine
//! the process is running on. Every platform query is read-only.

use crate::error::{LicenseError, LicenseResult};
use crate::identity::{HardwareInfo, IdentityProvider};
use std::path::Path;
#[cfg(any(target_os = "windows", target_os = "macos"))]
use std::process::Command;

/// Registry key holding one subkey per cloud-join registration.
pub const CLOUD_JOIN_KEY: &str =
    r"HKLM\SYSTEM\CurrentControlSet\Control\CloudDomainJoin\JoinInfo";

/// Directory exposing DMI tables on Linux.
pub const DMI_DIR: &str = "/sys/class/dmi/id";

/// [`IdentityProvider`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostIdentityProvider;

impl HostIdentityProvider {
    /// Creates a provider for the current host.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdentityProvider for HostIdentityProvider {
    fn tenant_id(&self) -> Option<String> {
        get_tenant_id()
    }

    fn hardware_info(&self) -> LicenseResult<HardwareInfo> {
        get_hardware_info()
    }
}

/// Gets the tenant id of the first cloud-join registration.
fn get_tenant_id() -> Option<String> {
    #[cfg(target_os = "windows")]
    {
        Command::new("reg")
            .args(["query", CLOUD_JOIN_KEY, "/s", "/v", "TenantId"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|out| parse_reg_tenant_id(&out))
    }

    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}

/// Gets manufacturer, model and serial number.
fn get_hardware_info() -> LicenseResult<HardwareInfo> {
    #[cfg(target_os = "windows")]
    {
        let script = "$c = Get-CimInstance Win32_ComputerSystem; \
                      $b = Get-CimInstance Win32_BIOS; \
                      [string]$c.Manufacturer; [string]$c.Model; [string]$b.SerialNumber";
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()
            .map_err(|e| unavailable(format!("cannot read BIOS information: {e}")))?;
        if !output.status.success() {
            return Err(unavailable("cannot read BIOS information"));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_cim_output(&stdout).ok_or_else(|| unavailable("cannot read BIOS information"))
    }

    #[cfg(target_os = "macos")]
    {
        let output = Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .map_err(|e| unavailable(format!("cannot run ioreg: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ioreg_output(&stdout).ok_or_else(|| unavailable("cannot read platform information"))
    }

    #[cfg(target_os = "linux")]
    {
        read_dmi(Path::new(DMI_DIR))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err(unavailable("hardware information not supported on this platform"))
    }
}

fn unavailable(msg: impl Into<String>) -> LicenseError {
    LicenseError::IdentityUnavailable(msg.into())
}

/// Extracts the first `TenantId` value from `reg query /s` output.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_reg_tenant_id(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("TenantId"), Some("REG_SZ")) => {
                let value = parts.collect::<Vec<_>>().join(" ");
                (!value.is_empty()).then_some(value)
            }
            _ => None,
        }
    })
}

/// Parses the three lines printed by the CIM query. Each field is printed
/// as a string, so a null field still yields an empty line.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_cim_output(output: &str) -> Option<HardwareInfo> {
    let mut lines = output.lines().map(str::trim);
    Some(HardwareInfo {
        manufacturer: lines.next()?.to_string(),
        model: lines.next()?.to_string(),
        serial_number: lines.next()?.to_string(),
    })
}

/// Parses `ioreg -rd1 -c IOPlatformExpertDevice` output.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_ioreg_output(output: &str) -> Option<HardwareInfo> {
    let field = |name: &str| {
        let needle = format!("\"{name}\" = ");
        output.lines().find_map(|l| {
            l.split_once(&needle).map(|(_, v)| {
                v.trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .trim_matches('"')
                    .trim_end_matches('\0')
                    .to_string()
            })
        })
    };

    Some(HardwareInfo {
        manufacturer: field("manufacturer")?,
        model: field("model")?,
        serial_number: field("IOPlatformSerialNumber")?,
    })
}

/// Reads vendor, product name and serial from a DMI directory.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn read_dmi(dir: &Path) -> LicenseResult<HardwareInfo> {
    let read = |name: &str| {
        let path = dir.join(name);
        std::fs::read_to_string(&path)
            .map(|s| s.trim().to_string())
            .map_err(|e| unavailable(format!("cannot read {}: {e}", path.display())))
    };

    Ok(HardwareInfo {
        manufacturer: read("sys_vendor")?,
        model: read("product_name")?,
        serial_number: read("product_serial")?,
    })
}
