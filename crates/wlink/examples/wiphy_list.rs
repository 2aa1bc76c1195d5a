//! List wireless devices, their bands and their interfaces.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example wiphy_list
//! ```
//!
//! # Requirements
//!
//! - cfg80211 loaded and at least one wiphy (`modprobe mac80211_hwsim` works)
//! - No special privileges required for read operations

use wlink::netlink::genl::nl80211::{SocketManager, format_mac};

#[tokio::main]
async fn main() -> wlink::Result<()> {
    let mgr = SocketManager::builder().no_events().build().await?;

    let wiphys = mgr.get_all_wiphy_info().await?;
    let ifaces = mgr.get_all_interfaces().await?;

    for wiphy in &wiphys {
        println!(
            "{} (#{}): {} tx / {} rx chains",
            wiphy.name,
            wiphy.id,
            wiphy.tx_chains(),
            wiphy.rx_chains()
        );
        for band in &wiphy.bands {
            let usable = band.channels.iter().filter(|c| !c.disabled).count();
            println!(
                "  {}: {} channels ({} usable), {} bitrates",
                band.band,
                band.channels.len(),
                usable,
                band.bitrates.len()
            );
        }
        for iface in ifaces.iter().filter(|i| i.wiphy == wiphy.id) {
            let mac = iface.mac.as_ref().map(format_mac).unwrap_or_default();
            println!("  {} [{}] {} {}", iface.name, iface.ifindex, iface.iftype, mac);
        }
    }

    if wiphys.is_empty() {
        println!("no wireless devices");
    }

    let stats = mgr.stats();
    println!(
        "\n{} requests, {} ok, {} failed",
        stats.req_sent, stats.req_success, stats.req_failed
    );

    Ok(())
}
