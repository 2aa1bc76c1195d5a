//! wifi dev - wireless interfaces.

use clap::{Args, Subcommand};
use wlink::SocketManager;
use wlink::netlink::genl::nl80211::{IfaceInfo, InterfaceType, format_mac};

use super::{Output, ifindex, mbm};

#[derive(Args)]
pub struct DevCmd {
    #[command(subcommand)]
    action: Option<DevAction>,
}

#[derive(Subcommand)]
enum DevAction {
    /// Show one or all wireless interfaces.
    Show {
        /// Interface name or index.
        dev: Option<String>,
    },

    /// Change the interface type (managed, ap, monitor, ...).
    Type {
        dev: String,
        #[arg(value_parser = parse_iftype)]
        iftype: InterfaceType,
    },

    /// Enable or disable 4-address frames.
    #[command(name = "4addr")]
    FourAddr {
        dev: String,
        #[arg(value_parser = parse_on_off, action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn parse_iftype(s: &str) -> Result<InterfaceType, String> {
    s.parse().map_err(|e: wlink::Error| e.to_string())
}

fn parse_on_off(s: &str) -> Result<bool, String> {
    match s {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(format!("expected on or off, got {s:?}")),
    }
}

impl DevCmd {
    pub async fn run(self, mgr: &SocketManager, out: Output) -> anyhow::Result<()> {
        match self.action.unwrap_or(DevAction::Show { dev: None }) {
            DevAction::Show { dev: None } => {
                let ifaces = mgr.get_all_interfaces().await?;
                if !out.json(&ifaces)? {
                    let mut by_phy = ifaces.clone();
                    by_phy.sort_by_key(|i| (i.wiphy, i.ifindex));
                    let mut phy = None;
                    for iface in &by_phy {
                        if phy != Some(iface.wiphy) {
                            println!("phy#{}", iface.wiphy);
                            phy = Some(iface.wiphy);
                        }
                        print_iface(iface);
                    }
                }
            }
            DevAction::Show { dev: Some(dev) } => {
                let iface = mgr.get_interface_info(ifindex(&dev)?).await?;
                if !out.json(&iface)? {
                    print_iface(&iface);
                }
            }
            DevAction::Type { dev, iftype } => {
                mgr.set_interface_type(ifindex(&dev)?, iftype).await?;
            }
            DevAction::FourAddr { dev, enabled } => {
                mgr.set_4addr(ifindex(&dev)?, enabled).await?;
            }
        }
        Ok(())
    }
}

fn print_iface(iface: &IfaceInfo) {
    println!("\tInterface {}", iface.name);
    println!("\t\tifindex {}", iface.ifindex);
    if let Some(wdev) = iface.wdev {
        println!("\t\twdev {wdev:#x}");
    }
    if let Some(mac) = &iface.mac {
        println!("\t\taddr {}", format_mac(mac));
    }
    if let Some(ssid) = iface.ssid_str() {
        println!("\t\tssid {ssid}");
    }
    println!("\t\ttype {}", iface.iftype);
    if let Some(ch) = &iface.channel {
        let center = ch
            .center_freq1
            .map(|f| format!(", center1: {f} MHz"))
            .unwrap_or_default();
        println!("\t\tchannel {} MHz, width: {}{}", ch.freq, ch.width, center);
    }
    if let Some(power) = iface.tx_power {
        println!("\t\ttxpower {}", mbm(power));
    }
    if iface.use_4addr {
        println!("\t\t4addr: on");
    }
}
