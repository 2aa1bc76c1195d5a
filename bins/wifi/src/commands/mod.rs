//! Subcommands of the wifi utility.

pub mod dev;
pub mod monitor;
pub mod phy;
pub mod reg;
pub mod scan;
pub mod station;
pub mod survey;

use std::io::Write;

use anyhow::{Context, bail};
use serde::Serialize;

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub pretty: bool,
}

impl Output {
    /// Print `value` as JSON. Returns `false` in text mode so the caller
    /// prints its own rendition.
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<bool> {
        if !self.json {
            return Ok(false);
        }
        let mut stdout = std::io::stdout().lock();
        if self.pretty {
            serde_json::to_writer_pretty(&mut stdout, value)?;
        } else {
            serde_json::to_writer(&mut stdout, value)?;
        }
        writeln!(stdout)?;
        Ok(true)
    }
}

/// Interface name or index to ifindex.
pub fn ifindex(dev: &str) -> anyhow::Result<u32> {
    let (_, index) =
        wlink::util::resolve(dev).with_context(|| format!("cannot find device \"{dev}\""))?;
    Ok(index)
}

/// `phy0` or `0` to a wiphy index.
pub fn parse_phy(s: &str) -> anyhow::Result<u32> {
    s.strip_prefix("phy")
        .unwrap_or(s)
        .parse()
        .with_context(|| format!("invalid phy \"{s}\""))
}

/// `aa:bb:cc:dd:ee:ff` to bytes.
pub fn parse_mac(s: &str) -> anyhow::Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = s.split(':');
    for byte in &mut mac {
        let part = parts.next().with_context(|| format!("invalid MAC \"{s}\""))?;
        *byte = u8::from_str_radix(part, 16).with_context(|| format!("invalid MAC \"{s}\""))?;
    }
    if parts.next().is_some() {
        bail!("invalid MAC \"{s}\"");
    }
    Ok(mac)
}

/// mBm to a dBm string.
pub fn mbm(value: i32) -> String {
    format!("{:.2} dBm", f64::from(value) / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_phy() {
        assert_eq!(parse_phy("phy2").unwrap(), 2);
        assert_eq!(parse_phy("0").unwrap(), 0);
        assert!(parse_phy("wlan0").is_err());
    }

    #[test]
    fn test_parse_mac() {
        assert_eq!(
            parse_mac("02:00:00:00:01:ff").unwrap(),
            [0x02, 0, 0, 0, 0x01, 0xff]
        );
        assert!(parse_mac("02:00:00:00:01").is_err());
        assert!(parse_mac("02:00:00:00:01:ff:00").is_err());
        assert!(parse_mac("zz:00:00:00:01:ff").is_err());
    }

    #[test]
    fn test_mbm() {
        assert_eq!(mbm(2000), "20.00 dBm");
        assert_eq!(mbm(-150), "-1.50 dBm");
    }
}
