//! Interface name and index utilities.
//!
//! nl80211 addresses interfaces by index; these helpers translate the names
//! users type via `/sys/class/net`.

use crate::netlink::{Error, Result};

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidParam("empty interface name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(Error::InvalidParam(format!(
            "interface name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name.contains('/') || name.contains('\0') || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidParam(format!(
            "invalid interface name: {name:?}"
        )));
    }

    Ok(())
}

/// Convert an interface index to name.
pub fn index_to_name(index: u32) -> Result<String> {
    let not_found = || Error::InterfaceNotFound {
        name: format!("index {index}"),
    };
    if index == 0 {
        return Err(not_found());
    }

    for entry in std::fs::read_dir(SYS_CLASS_NET)?.flatten() {
        let content = match std::fs::read_to_string(entry.path().join("ifindex")) {
            Ok(content) => content,
            Err(_) => continue,
        };
        if content.trim().parse::<u32>().ok() == Some(index) {
            return Ok(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Err(not_found())
}

/// Convert an interface name to index.
pub fn name_to_index(name: &str) -> Result<u32> {
    validate(name)?;

    let not_found = || Error::InterfaceNotFound {
        name: name.to_string(),
    };
    std::fs::read_to_string(format!("{SYS_CLASS_NET}/{name}/ifindex"))
        .map_err(|_| not_found())?
        .trim()
        .parse()
        .map_err(|_| not_found())
}

/// Whether an interface is backed by a wireless device.
pub fn is_wireless(name: &str) -> bool {
    validate(name).is_ok()
        && std::path::Path::new(&format!("{SYS_CLASS_NET}/{name}/phy80211")).exists()
}

/// Parse an interface name or index.
///
/// A numeric string is an index and is resolved to its name; anything
/// else is a name.
pub fn resolve(s: &str) -> Result<(String, u32)> {
    match s.parse::<u32>() {
        Ok(index) => Ok((index_to_name(index)?, index)),
        Err(_) => Ok((s.to_string(), name_to_index(s)?)),
    }
}

/// Interface name for display, `if<N>` when the lookup fails.
pub fn name_or_index(index: u32) -> String {
    index_to_name(index).unwrap_or_else(|_| format!("if{index}"))
}
