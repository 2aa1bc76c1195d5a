//! Scan control and event delivery.
//!
//! Needs root to trigger scans and an interface that is up.

use std::time::Duration;

use tokio_stream::StreamExt;
use wlink::Result;
use wlink::netlink::genl::nl80211::{EventKind, Filter, ScanParams, SocketManager};

use crate::common;

#[tokio::test]
async fn test_scan_events() -> Result<()> {
    require_root!();
    require_wiphy!();
    let Some((_, ifindex)) = common::first_wireless() else {
        eprintln!("Skipping test: no wireless interface");
        return Ok(());
    };

    let mgr = SocketManager::new().await?;
    let mut events = mgr.event_stream(Filter::Any, Filter::Id(ifindex))?;

    match mgr.start_scan(ifindex, &ScanParams::default())?.await {
        Ok(_) => {}
        // interface down or already scanning
        Err(e) if e.errno() == Some(libc::ENETDOWN) || e.is_busy() => {
            eprintln!("Skipping test: cannot scan ({e})");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    let mut kinds = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, events.next()).await {
        assert_eq!(event.ifindex, Some(ifindex));
        kinds.push(event.kind);
        if matches!(event.kind, EventKind::ScanDone | EventKind::ScanAborted) {
            break;
        }
    }

    assert_eq!(kinds.first(), Some(&EventKind::ScanStarted));
    assert!(matches!(
        kinds.last(),
        Some(EventKind::ScanDone | EventKind::ScanAborted)
    ));
    assert!(mgr.stats().evt_handled >= 2);

    let results = mgr.get_scan_results(ifindex).await?;
    for bss in &results {
        assert!(bss.freq > 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_listener_removed_with_stream() -> Result<()> {
    require_wiphy!();

    let mgr = SocketManager::new().await?;
    let events = mgr.event_stream(Filter::Any, Filter::Any)?;
    let listener = events.listener().clone();
    drop(events);
    assert!(mgr.remove_listener(&listener).is_err());
    Ok(())
}
