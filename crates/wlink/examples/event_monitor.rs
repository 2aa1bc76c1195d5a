//! Print nl80211 events, optionally for one interface only.
//!
//! Registers one listener per slot to show the handler table, then
//! triggers a scan if asked to.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example event_monitor
//! sudo cargo run --example event_monitor -- wlan0 --scan
//! ```

use std::sync::Arc;

use wlink::netlink::genl::nl80211::{
    Event, EventBody, EventHandlers, Filter, ScanParams, SocketManager,
};

fn describe(event: &Event) -> String {
    match &event.body {
        EventBody::Iface(iface) => format!(
            "interface {} ({})",
            iface.name.as_deref().unwrap_or("?"),
            iface.iftype.unwrap_or_default()
        ),
        EventBody::Scan(scan) => format!("{} frequencies", scan.freqs.len()),
        EventBody::Vendor(vendor) => format!(
            "oui {:06x} subcmd {} ({} bytes)",
            vendor.oui,
            vendor.subcmd,
            vendor.data.len()
        ),
        EventBody::Frame(frame) => format!("{} byte frame, ack={}", frame.frame.len(), frame.ack),
        EventBody::Radar(radar) => match radar.chandef {
            Some(chandef) => format!("radar event {} on {} MHz", radar.event, chandef.freq),
            None => format!("radar event {}", radar.event),
        },
        EventBody::Other(attrs) => format!("{} attribute bytes", attrs.len()),
    }
}

#[tokio::main]
async fn main() -> wlink::Result<()> {
    let mut args = std::env::args().skip(1);
    let ifname = args.next();
    let scan = args.any(|a| a == "--scan");

    let ifindex = ifname
        .as_deref()
        .map(wlink::util::name_to_index)
        .transpose()?;

    let mgr = SocketManager::new().await?;

    let print = Arc::new(|event: &Event| {
        println!(
            "[{:?}] wiphy={:?} ifindex={:?} {}",
            event.kind,
            event.wiphy,
            event.ifindex,
            describe(event)
        );
    });
    let listener = mgr.add_listener(Filter::Any, Filter::from(ifindex), EventHandlers::all(print))?;
    println!("listening ({:?} tier), Ctrl-C to stop", listener.tier());

    if let (true, Some(ifindex)) = (scan, ifindex) {
        mgr.start_scan(ifindex, &ScanParams::default())?.await?;
    }

    tokio::signal::ctrl_c().await?;
    mgr.remove_listener(&listener)?;

    let stats = mgr.stats();
    println!(
        "{} events, {} handled, {} unhandled",
        stats.evt_received, stats.evt_handled, stats.evt_unhandled
    );
    Ok(())
}
