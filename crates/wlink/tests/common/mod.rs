//! Common test utilities for integration tests.
//!
//! Provides lookups for the wireless devices present on the test host and
//! helper macros for conditional test execution. Loading `mac80211_hwsim`
//! (`modprobe mac80211_hwsim radios=2`) gives the tests two simulated
//! radios to work with.

use std::path::Path;

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Wireless interfaces on this host, sorted by name.
pub fn wireless_interfaces() -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir("/sys/class/net")
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| wlink::util::ifname::is_wireless(name))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Whether at least one wiphy is registered.
pub fn has_wiphy() -> bool {
    Path::new("/sys/class/ieee80211")
        .read_dir()
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// First wireless interface as `(name, ifindex)`.
pub fn first_wireless() -> Option<(String, u32)> {
    wireless_interfaces()
        .into_iter()
        .find_map(|name| wlink::util::resolve(&name).ok())
}

/// Skip the test if not running as root.
///
/// Use this at the beginning of integration tests that require root privileges.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

/// Skip the test if no wireless device is present.
#[macro_export]
macro_rules! require_wiphy {
    () => {
        if !crate::common::has_wiphy() {
            eprintln!("Skipping test: no wiphy (try `modprobe mac80211_hwsim`)");
            return Ok(());
        }
    };
}
