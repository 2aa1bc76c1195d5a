//! wifi phy - wireless physical devices.

use clap::{Args, Subcommand};
use wlink::SocketManager;
use wlink::netlink::genl::nl80211::{TxPowerSetting, WiphyInfo};

use super::{Output, mbm, parse_phy};

#[derive(Args)]
pub struct PhyCmd {
    #[command(subcommand)]
    action: Option<PhyAction>,
}

#[derive(Subcommand)]
enum PhyAction {
    /// Show one or all wiphys.
    Show {
        /// Wiphy (`phy0` or `0`).
        phy: Option<String>,
    },

    /// Select the antennas a wiphy uses.
    Antenna {
        phy: String,
        /// Transmit antenna bitmask.
        #[arg(value_parser = parse_mask)]
        tx: u32,
        /// Receive antenna bitmask.
        #[arg(value_parser = parse_mask)]
        rx: u32,
    },

    /// Set the transmit power: `auto`, `limit <mBm>` or `fixed <mBm>`.
    Txpower {
        phy: String,
        mode: TxPowerMode,
        /// Power level in mBm (100 mBm = 1 dBm).
        level: Option<i32>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum TxPowerMode {
    Auto,
    Limit,
    Fixed,
}

fn parse_mask(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid antenna mask {s:?}: {e}"))
}

impl PhyCmd {
    pub async fn run(self, mgr: &SocketManager, out: Output) -> anyhow::Result<()> {
        match self.action.unwrap_or(PhyAction::Show { phy: None }) {
            PhyAction::Show { phy: None } => {
                let wiphys = mgr.get_all_wiphy_info().await?;
                if !out.json(&wiphys)? {
                    for wiphy in &wiphys {
                        print_wiphy(wiphy);
                    }
                }
            }
            PhyAction::Show { phy: Some(phy) } => {
                let wiphy = mgr.get_wiphy_info(parse_phy(&phy)?).await?;
                if !out.json(&wiphy)? {
                    print_wiphy(&wiphy);
                }
            }
            PhyAction::Antenna { phy, tx, rx } => {
                mgr.set_antennas(parse_phy(&phy)?, tx, rx).await?;
            }
            PhyAction::Txpower { phy, mode, level } => {
                let setting = match (mode, level) {
                    (TxPowerMode::Auto, _) => TxPowerSetting::Automatic,
                    (TxPowerMode::Limit, Some(level)) => TxPowerSetting::Limited(level),
                    (TxPowerMode::Fixed, Some(level)) => TxPowerSetting::Fixed(level),
                    (_, None) => anyhow::bail!("a power level in mBm is required"),
                };
                mgr.set_tx_power(parse_phy(&phy)?, setting).await?;
            }
        }
        Ok(())
    }
}

fn print_wiphy(wiphy: &WiphyInfo) {
    println!("Wiphy {}", wiphy.name);
    if let (Some(tx), Some(rx)) = (wiphy.antenna_avail_tx, wiphy.antenna_avail_rx) {
        println!("\tAvailable Antennas: TX {tx:#x} RX {rx:#x}");
    }
    if let (Some(tx), Some(rx)) = (wiphy.antenna_cfg_tx, wiphy.antenna_cfg_rx) {
        println!("\tConfigured Antennas: TX {tx:#x} RX {rx:#x}");
    }
    if let Some(n) = wiphy.max_scan_ssids {
        println!("\tmax # scan SSIDs: {n}");
    }
    for band in &wiphy.bands {
        println!("\tBand {}:", band.band);
        if let Some(capa) = band.ht_capa {
            println!("\t\tHT Capabilities: {capa:#06x}");
        }
        if let Some(capa) = band.vht_capa {
            println!("\t\tVHT Capabilities: {capa:#010x}");
        }
        if !band.bitrates.is_empty() {
            let rates: Vec<String> = band
                .bitrates
                .iter()
                .map(|r| format!("{}.{}", r / 10, r % 10))
                .collect();
            println!("\t\tBitrates (Mbps): {}", rates.join(" "));
        }
        println!("\t\tFrequencies:");
        for ch in &band.channels {
            let mut flags = Vec::new();
            if ch.disabled {
                flags.push("disabled".to_string());
            }
            if ch.no_ir {
                flags.push("no IR".to_string());
            }
            if ch.radar {
                flags.push("radar detection".to_string());
            }
            if let Some(state) = ch.dfs_state {
                flags.push(format!("DFS {state:?}"));
            }
            let power = ch
                .max_tx_power
                .map(|p| format!(" ({})", mbm(p as i32)))
                .unwrap_or_default();
            let number = ch.channel.map(|c| format!(" [{c}]")).unwrap_or_default();
            if flags.is_empty() {
                println!("\t\t\t* {} MHz{}{}", ch.freq, number, power);
            } else {
                println!("\t\t\t* {} MHz{}{} ({})", ch.freq, number, power, flags.join(", "));
            }
        }
    }
    let iftypes: Vec<String> = wiphy.iftypes.iter().map(ToString::to_string).collect();
    if !iftypes.is_empty() {
        println!("\tSupported interface modes: {}", iftypes.join(", "));
    }
}
