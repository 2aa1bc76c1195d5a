//! wifi scan - trigger scans and read the scan cache.

use std::time::Duration;

use anyhow::bail;
use clap::Args;
use tokio_stream::StreamExt;
use wlink::SocketManager;
use wlink::netlink::genl::nl80211::{
    EventKind, Filter, ScanParams, ScanResult, format_mac, freq_to_channel, scan_flag,
};

use super::{Output, ifindex};

/// Upper bound on how long a triggered scan may take.
const SCAN_WAIT: Duration = Duration::from_secs(30);

#[derive(Args)]
pub struct ScanCmd {
    /// Interface name or index.
    dev: String,

    /// Trigger a fresh scan and wait for it before dumping.
    #[arg(long)]
    trigger: bool,

    /// Only scan these frequencies (MHz).
    #[arg(long = "freq")]
    freqs: Vec<u32>,

    /// Probe for these SSIDs instead of the wildcard.
    #[arg(long = "ssid")]
    ssids: Vec<String>,

    /// Flush the scan cache first.
    #[arg(long)]
    flush: bool,

    /// Use a random source MAC.
    #[arg(long)]
    randomise: bool,
}

impl ScanCmd {
    pub async fn run(self, mgr: &SocketManager, out: Output) -> anyhow::Result<()> {
        let ifindex = ifindex(&self.dev)?;
        if self.trigger {
            self.trigger(mgr, ifindex).await?;
        }

        let mut results = mgr.get_scan_results(ifindex).await?;
        results.sort_by_key(|bss| std::cmp::Reverse(bss.signal_mbm.unwrap_or(i32::MIN)));
        if !out.json(&results)? {
            for bss in &results {
                print_bss(bss, &self.dev);
            }
        }
        Ok(())
    }

    async fn trigger(&self, mgr: &SocketManager, ifindex: u32) -> anyhow::Result<()> {
        let mut params = self
            .freqs
            .iter()
            .fold(ScanParams::new(), |p, freq| p.freq(*freq));
        for ssid in &self.ssids {
            params = params.ssid(ssid.as_bytes());
        }
        if self.flush {
            params = params.flags(scan_flag::FLUSH);
        }
        if self.randomise {
            params = params.flags(scan_flag::RANDOM_ADDR);
        }

        // subscribe before triggering so the completion cannot be missed
        let mut events = mgr.event_stream(Filter::Any, Filter::Id(ifindex))?;
        mgr.start_scan(ifindex, &params)?.await?;

        let done = async {
            while let Some(event) = events.next().await {
                match event.kind {
                    EventKind::ScanDone => return Ok(()),
                    EventKind::ScanAborted => bail!("scan aborted"),
                    _ => {}
                }
            }
            bail!("event stream closed")
        };
        match tokio::time::timeout(SCAN_WAIT, done).await {
            Ok(result) => result,
            Err(_) => bail!("scan did not finish within {SCAN_WAIT:?}"),
        }
    }
}

fn print_bss(bss: &ScanResult, dev: &str) {
    let assoc = if bss.associated { " -- associated" } else { "" };
    println!("BSS {}(on {}){}", format_mac(&bss.bssid), dev, assoc);
    let channel = freq_to_channel(bss.freq)
        .map(|c| format!(" (channel {c})"))
        .unwrap_or_default();
    println!("\tfreq: {}{}", bss.freq, channel);
    if let Some(interval) = bss.beacon_interval {
        println!("\tbeacon interval: {interval} TUs");
    }
    if let Some(capa) = bss.capability {
        println!("\tcapability: {capa:#06x}");
    }
    if let Some(signal) = bss.signal_mbm {
        println!("\tsignal: {}", super::mbm(signal));
    }
    if let Some(ms) = bss.seen_ms_ago {
        println!("\tlast seen: {ms} ms ago");
    }
    if let Some(ssid) = &bss.ssid {
        println!("\tSSID: {}", String::from_utf8_lossy(ssid));
    }
}
