//! wifi monitor - print nl80211 events.
//!
//! Uses the event stream of the socket manager, so the listener is scoped
//! by wiphy and interface the same way library listeners are.

use clap::Args;
use tokio_stream::StreamExt;
use wlink::SocketManager;
use wlink::netlink::genl::nl80211::{Event, EventBody, Filter, format_mac};

use super::{Output, ifindex, parse_phy};

#[derive(Args)]
pub struct MonitorCmd {
    /// Only events of this interface.
    dev: Option<String>,

    /// Only events of this wiphy.
    #[arg(long)]
    phy: Option<String>,
}

impl MonitorCmd {
    pub async fn run(self, mgr: &SocketManager, out: Output) -> anyhow::Result<()> {
        let ifindex = self.dev.as_deref().map(ifindex).transpose()?;
        let wiphy = self.phy.as_deref().map(parse_phy).transpose()?;

        let mut events = mgr.event_stream(Filter::from(wiphy), Filter::from(ifindex))?;
        eprintln!("Monitoring nl80211 events (Ctrl+C to stop)...");

        loop {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    if !out.json(&event)? {
                        println!("{}", format_event(&event));
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        let stats = mgr.stats();
        eprintln!(
            "{} events received, {} handled",
            stats.evt_received, stats.evt_handled
        );
        Ok(())
    }
}

fn format_event(event: &Event) -> String {
    let mut line = String::new();
    if let Some(wiphy) = event.wiphy {
        line.push_str(&format!("phy#{wiphy} "));
    }
    if let Some(ifindex) = event.ifindex {
        line.push_str(&format!("({}) ", wlink::util::name_or_index(ifindex)));
    }
    line.push_str(&format!("{:?}", event.kind));

    match &event.body {
        EventBody::Iface(iface) => {
            if let Some(name) = &iface.name {
                line.push_str(&format!(" {name}"));
            }
            if let Some(mac) = &iface.mac {
                line.push_str(&format!(" {}", format_mac(mac)));
            }
        }
        EventBody::Scan(scan) if !scan.freqs.is_empty() => {
            let freqs: Vec<String> = scan.freqs.iter().map(u32::to_string).collect();
            line.push_str(&format!(" frequencies: {}", freqs.join(" ")));
        }
        EventBody::Vendor(vendor) => {
            line.push_str(&format!(
                " vendor {:06x}.{} ({} bytes)",
                vendor.oui,
                vendor.subcmd,
                vendor.data.len()
            ));
        }
        EventBody::Frame(frame) => {
            line.push_str(&format!(" {} bytes", frame.frame.len()));
            if let Some(freq) = frame.freq {
                line.push_str(&format!(" on {freq} MHz"));
            }
            if let Some(cookie) = frame.cookie {
                line.push_str(&format!(" cookie {cookie:#x} ack={}", frame.ack));
            }
        }
        EventBody::Radar(radar) => {
            line.push_str(&format!(" event {}", radar.event));
            if let Some(chandef) = &radar.chandef {
                line.push_str(&format!(" on {} MHz", chandef.freq));
            }
            if radar.background {
                line.push_str(" (background)");
            }
        }
        _ => {}
    }
    line
}
