//! wifi station - associated stations.

use clap::Args;
use wlink::SocketManager;
use wlink::netlink::genl::nl80211::{RateInfo, StationInfo, format_mac};

use super::{Output, ifindex, parse_mac};

#[derive(Args)]
pub struct StationCmd {
    /// Interface name or index.
    dev: String,

    /// Only this station.
    mac: Option<String>,
}

impl StationCmd {
    pub async fn run(self, mgr: &SocketManager, out: Output) -> anyhow::Result<()> {
        let ifindex = ifindex(&self.dev)?;
        let stations = match &self.mac {
            Some(mac) => vec![mgr.get_station_info(ifindex, parse_mac(mac)?).await?],
            None => mgr.get_all_stations(ifindex).await?,
        };
        if !out.json(&stations)? {
            for sta in &stations {
                print_station(sta, &self.dev);
            }
        }
        Ok(())
    }
}

fn rate(rate: &RateInfo) -> String {
    let mut s = rate
        .bitrate
        .map(|r| format!("{}.{} MBit/s", r / 10, r % 10))
        .unwrap_or_else(|| "unknown".to_string());
    if let Some(width) = rate.width {
        s.push_str(&format!(" {width}MHz"));
    }
    if let Some(mcs) = rate.mcs {
        s.push_str(&format!(" MCS {mcs}"));
    }
    if let (Some(mcs), Some(nss)) = (rate.vht_mcs, rate.vht_nss) {
        s.push_str(&format!(" VHT-MCS {mcs} VHT-NSS {nss}"));
    }
    if rate.short_gi {
        s.push_str(" short GI");
    }
    s
}

fn print_station(sta: &StationInfo, dev: &str) {
    println!("Station {} (on {})", format_mac(&sta.mac), dev);
    let counters = [
        ("inactive time", sta.inactive_time_ms.map(|v| format!("{v} ms"))),
        ("rx bytes", sta.rx_bytes.map(|v| v.to_string())),
        ("rx packets", sta.rx_packets.map(|v| v.to_string())),
        ("tx bytes", sta.tx_bytes.map(|v| v.to_string())),
        ("tx packets", sta.tx_packets.map(|v| v.to_string())),
        ("tx retries", sta.tx_retries.map(|v| v.to_string())),
        ("tx failed", sta.tx_failed.map(|v| v.to_string())),
        ("signal", sta.signal.map(|v| format!("{v} dBm"))),
        ("signal avg", sta.signal_avg.map(|v| format!("{v} dBm"))),
        ("tx bitrate", sta.tx_rate.as_ref().map(rate)),
        ("rx bitrate", sta.rx_rate.as_ref().map(rate)),
        ("connected time", sta.connected_time_s.map(|v| format!("{v} seconds"))),
    ];
    for (label, value) in counters {
        if let Some(value) = value {
            println!("\t{label}:\t{value}");
        }
    }
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("\tauthorized:\t{}", yes_no(sta.flags.authorized));
    println!("\tauthenticated:\t{}", yes_no(sta.flags.authenticated));
    println!("\tassociated:\t{}", yes_no(sta.flags.associated));
    println!("\tWMM/WME:\t{}", yes_no(sta.flags.wme));
    println!("\tMFP:\t\t{}", yes_no(sta.flags.mfp));
}
