//! Event listeners: filters, handler slots and dispatch ordering.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::event::{Event, EventKind};
use super::vendor::VendorEventHandler;
use crate::netlink::error::Error;

/// Match rule for one axis (wiphy or ifindex) of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Only this value.
    Id(u32),
    /// Every value, including events that do not carry the field.
    Any,
    /// Only events that do not carry the field.
    Undef,
}

impl Filter {
    pub fn matches(self, value: Option<u32>) -> bool {
        match self {
            Filter::Any => true,
            Filter::Id(id) => value == Some(id),
            Filter::Undef => value.is_none(),
        }
    }
}

impl From<u32> for Filter {
    fn from(id: u32) -> Self {
        Filter::Id(id)
    }
}

impl From<Option<u32>> for Filter {
    /// `None` is [`Filter::Any`].
    fn from(id: Option<u32>) -> Self {
        id.map_or(Filter::Any, Filter::Id)
    }
}

/// Dispatch precedence of a listener, fixed at registration.
///
/// Ordered: interface-specific listeners run first, then per-wiphy
/// defaults, then global listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerTier {
    IfaceSpecific,
    WiphyDefault,
    Global,
}

impl ListenerTier {
    pub fn of(wiphy: Filter, ifindex: Filter) -> Self {
        if ifindex != Filter::Any {
            ListenerTier::IfaceSpecific
        } else if wiphy != Filter::Any {
            ListenerTier::WiphyDefault
        } else {
            ListenerTier::Global
        }
    }
}

/// Callback for one event kind. Runs on the manager's driver task.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Optional handler per event kind.
///
/// ```ignore
/// let handlers = EventHandlers::new()
///     .on_iface_created(Arc::new(|ev| println!("new {:?}", ev.iface())))
///     .on_scan_done(Arc::new(|ev| println!("scan done on {:?}", ev.ifindex)));
/// ```
#[derive(Clone, Default)]
pub struct EventHandlers {
    generic: Option<EventHandler>,
    iface_created: Option<EventHandler>,
    iface_deleted: Option<EventHandler>,
    scan_started: Option<EventHandler>,
    scan_aborted: Option<EventHandler>,
    scan_done: Option<EventHandler>,
    vendor: Option<EventHandler>,
    mgmt_rx: Option<EventHandler>,
    frame_tx_status: Option<EventHandler>,
    radar: Option<EventHandler>,
    vendor_handlers: Vec<Arc<dyn VendorEventHandler>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same handler in every slot.
    pub fn all(handler: EventHandler) -> Self {
        Self {
            generic: Some(handler.clone()),
            iface_created: Some(handler.clone()),
            iface_deleted: Some(handler.clone()),
            scan_started: Some(handler.clone()),
            scan_aborted: Some(handler.clone()),
            scan_done: Some(handler.clone()),
            vendor: Some(handler.clone()),
            mgmt_rx: Some(handler.clone()),
            frame_tx_status: Some(handler.clone()),
            radar: Some(handler),
            vendor_handlers: Vec::new(),
        }
    }

    /// nl80211 events without a dedicated slot.
    pub fn on_generic(mut self, handler: EventHandler) -> Self {
        self.generic = Some(handler);
        self
    }

    pub fn on_iface_created(mut self, handler: EventHandler) -> Self {
        self.iface_created = Some(handler);
        self
    }

    pub fn on_iface_deleted(mut self, handler: EventHandler) -> Self {
        self.iface_deleted = Some(handler);
        self
    }

    pub fn on_scan_started(mut self, handler: EventHandler) -> Self {
        self.scan_started = Some(handler);
        self
    }

    pub fn on_scan_aborted(mut self, handler: EventHandler) -> Self {
        self.scan_aborted = Some(handler);
        self
    }

    pub fn on_scan_done(mut self, handler: EventHandler) -> Self {
        self.scan_done = Some(handler);
        self
    }

    /// Raw vendor events, before any [`VendorEventHandler`].
    pub fn on_vendor(mut self, handler: EventHandler) -> Self {
        self.vendor = Some(handler);
        self
    }

    pub fn on_mgmt_rx(mut self, handler: EventHandler) -> Self {
        self.mgmt_rx = Some(handler);
        self
    }

    pub fn on_frame_tx_status(mut self, handler: EventHandler) -> Self {
        self.frame_tx_status = Some(handler);
        self
    }

    pub fn on_radar(mut self, handler: EventHandler) -> Self {
        self.radar = Some(handler);
        self
    }

    pub fn vendor_handler(mut self, handler: Arc<dyn VendorEventHandler>) -> Self {
        self.vendor_handlers.push(handler);
        self
    }

    fn slot(&self, kind: EventKind) -> Option<&EventHandler> {
        match kind {
            EventKind::InterfaceCreated => self.iface_created.as_ref(),
            EventKind::InterfaceDeleted => self.iface_deleted.as_ref(),
            EventKind::ScanStarted => self.scan_started.as_ref(),
            EventKind::ScanAborted => self.scan_aborted.as_ref(),
            EventKind::ScanDone => self.scan_done.as_ref(),
            EventKind::Vendor => self.vendor.as_ref(),
            EventKind::MgmtFrameRx => self.mgmt_rx.as_ref(),
            EventKind::FrameTxStatus => self.frame_tx_status.as_ref(),
            EventKind::Radar => self.radar.as_ref(),
            EventKind::Other => self.generic.as_ref(),
        }
    }

    /// Run the handlers for `event`. Returns whether any of them handled it.
    pub(crate) fn deliver(&self, listener: u64, event: &Event) -> bool {
        let mut handled = false;

        if let Some(handler) = self.slot(event.kind) {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_ok() {
                handled = true;
            } else {
                tracing::warn!(listener, cmd = event.cmd, "event handler panicked");
            }
        }

        if let Some(vendor) = event.vendor() {
            for decoder in self.vendor_handlers.iter().filter(|h| h.oui() == vendor.oui) {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    decoder.handle(event.wiphy, event.ifindex, vendor)
                }));
                match outcome {
                    Ok(Ok(())) => handled = true,
                    Ok(Err(Error::NotImplemented(_))) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(listener, oui = vendor.oui, subcmd = vendor.subcmd, error = %e, "vendor event rejected");
                        handled = true;
                    }
                    Err(_) => {
                        tracing::warn!(listener, oui = vendor.oui, "vendor event handler panicked");
                    }
                }
            }
        }

        handled
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut slots = Vec::new();
        for (name, slot) in [
            ("generic", &self.generic),
            ("iface_created", &self.iface_created),
            ("iface_deleted", &self.iface_deleted),
            ("scan_started", &self.scan_started),
            ("scan_aborted", &self.scan_aborted),
            ("scan_done", &self.scan_done),
            ("vendor", &self.vendor),
            ("mgmt_rx", &self.mgmt_rx),
            ("frame_tx_status", &self.frame_tx_status),
            ("radar", &self.radar),
        ] {
            if slot.is_some() {
                slots.push(name);
            }
        }
        f.debug_struct("EventHandlers")
            .field("slots", &slots)
            .field("vendor_handlers", &self.vendor_handlers.len())
            .finish()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle does not unregister the listener; use
/// [`SocketManager::remove_listener`](super::SocketManager::remove_listener).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub(crate) id: u64,
    pub(crate) manager: u64,
    wiphy: Filter,
    ifindex: Filter,
    tier: ListenerTier,
}

impl Listener {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn wiphy(&self) -> Filter {
        self.wiphy
    }

    pub fn ifindex(&self) -> Filter {
        self.ifindex
    }

    pub fn tier(&self) -> ListenerTier {
        self.tier
    }
}

/// Listener table row.
pub(crate) struct ListenerEntry {
    pub(crate) id: u64,
    wiphy: Filter,
    ifindex: Filter,
    tier: ListenerTier,
    pub(crate) handlers: Arc<EventHandlers>,
}

impl ListenerEntry {
    pub(crate) fn new(id: u64, wiphy: Filter, ifindex: Filter, handlers: EventHandlers) -> Self {
        Self {
            id,
            wiphy,
            ifindex,
            tier: ListenerTier::of(wiphy, ifindex),
            handlers: Arc::new(handlers),
        }
    }

    pub(crate) fn handle(&self, manager: u64) -> Listener {
        Listener {
            id: self.id,
            manager,
            wiphy: self.wiphy,
            ifindex: self.ifindex,
            tier: self.tier,
        }
    }

    fn matches(&self, event: &Event) -> bool {
        self.wiphy.matches(event.wiphy) && self.ifindex.matches(event.ifindex)
    }
}

/// Listeners matching `event`, in dispatch order.
///
/// Ids grow with registration, so sorting by `(tier, id)` keeps
/// registration order within a tier.
pub(crate) fn select(entries: &[ListenerEntry], event: &Event) -> Vec<(u64, Arc<EventHandlers>)> {
    let mut matched: Vec<&ListenerEntry> = entries.iter().filter(|e| e.matches(event)).collect();
    matched.sort_by_key(|e| (e.tier, e.id));
    matched
        .into_iter()
        .map(|e| (e.id, Arc::clone(&e.handlers)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::netlink::builder::AttrList;
    use crate::netlink::error::Result;
    use crate::netlink::genl::nl80211::event::VendorEvent;
    use crate::netlink::genl::nl80211::{Nl80211Attr, Nl80211Cmd, fixtures};

    fn scan_done(wiphy: Option<u32>, ifindex: Option<u32>) -> Event {
        let mut attrs = AttrList::new();
        if let Some(wiphy) = wiphy {
            attrs = attrs.u32(Nl80211Attr::Wiphy as u16, wiphy);
        }
        if let Some(ifindex) = ifindex {
            attrs = attrs.u32(Nl80211Attr::Ifindex as u16, ifindex);
        }
        fixtures::parse_event(&fixtures::event(Nl80211Cmd::NewScanResults, &attrs))
    }

    #[test]
    fn test_filter_matching() {
        assert!(Filter::Any.matches(None));
        assert!(Filter::Any.matches(Some(3)));
        assert!(Filter::Id(3).matches(Some(3)));
        assert!(!Filter::Id(3).matches(Some(4)));
        assert!(!Filter::Id(3).matches(None));
        assert!(Filter::Undef.matches(None));
        assert!(!Filter::Undef.matches(Some(0)));
        assert_eq!(Filter::from(None), Filter::Any);
    }

    #[test]
    fn test_tier() {
        assert_eq!(ListenerTier::of(Filter::Any, Filter::Id(16)), ListenerTier::IfaceSpecific);
        assert_eq!(ListenerTier::of(Filter::Id(0), Filter::Undef), ListenerTier::IfaceSpecific);
        assert_eq!(ListenerTier::of(Filter::Id(0), Filter::Any), ListenerTier::WiphyDefault);
        assert_eq!(ListenerTier::of(Filter::Undef, Filter::Any), ListenerTier::WiphyDefault);
        assert_eq!(ListenerTier::of(Filter::Any, Filter::Any), ListenerTier::Global);
        assert!(ListenerTier::IfaceSpecific < ListenerTier::WiphyDefault);
        assert!(ListenerTier::WiphyDefault < ListenerTier::Global);
    }

    #[test]
    fn test_select_orders_by_tier_then_registration() {
        let entries = vec![
            ListenerEntry::new(1, Filter::Any, Filter::Any, EventHandlers::new()),
            ListenerEntry::new(2, Filter::Id(0), Filter::Any, EventHandlers::new()),
            ListenerEntry::new(3, Filter::Any, Filter::Id(16), EventHandlers::new()),
            ListenerEntry::new(4, Filter::Id(1), Filter::Any, EventHandlers::new()),
            ListenerEntry::new(5, Filter::Any, Filter::Any, EventHandlers::new()),
        ];
        let ids: Vec<u64> = select(&entries, &scan_done(Some(0), Some(16)))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1, 5]);

        let ids: Vec<u64> = select(&entries, &scan_done(None, None))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn test_absent_slot_is_not_handled() {
        let event = scan_done(Some(0), None);
        let handlers = EventHandlers::new().on_iface_created(Arc::new(|_| {}));
        assert!(!handlers.deliver(1, &event));

        let handlers = handlers.on_scan_done(Arc::new(|_| {}));
        assert!(handlers.deliver(1, &event));
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let event = scan_done(Some(0), None);
        let handlers = EventHandlers::new().on_scan_done(Arc::new(|_| panic!("boom")));
        assert!(!handlers.deliver(1, &event));
    }

    struct Decoder {
        oui: u32,
        seen: Mutex<Vec<u32>>,
    }

    impl VendorEventHandler for Decoder {
        fn oui(&self) -> u32 {
            self.oui
        }

        fn handle(&self, _wiphy: Option<u32>, _ifindex: Option<u32>, event: &VendorEvent) -> Result<()> {
            if event.subcmd != 1 {
                return Err(Error::NotImplemented(format!("subcmd {}", event.subcmd)));
            }
            self.seen.lock().unwrap().push(event.subcmd);
            Ok(())
        }
    }

    fn vendor_event(oui: u32, subcmd: u32) -> Event {
        let attrs = AttrList::new()
            .u32(Nl80211Attr::Wiphy as u16, 0)
            .u32(Nl80211Attr::VendorId as u16, oui)
            .u32(Nl80211Attr::VendorSubcmd as u16, subcmd)
            .bytes(Nl80211Attr::VendorData as u16, vec![0xaa]);
        fixtures::parse_event(&fixtures::event(Nl80211Cmd::Vendor, &attrs))
    }

    #[test]
    fn test_vendor_handlers_selected_by_oui() {
        let decoder = Arc::new(Decoder {
            oui: 0x001374,
            seen: Mutex::new(Vec::new()),
        });
        let handlers = EventHandlers::new().vendor_handler(decoder.clone());

        assert!(handlers.deliver(1, &vendor_event(0x001374, 1)));
        // unsupported subcommand
        assert!(!handlers.deliver(1, &vendor_event(0x001374, 2)));
        // other vendor
        assert!(!handlers.deliver(1, &vendor_event(0x00904c, 1)));

        assert_eq!(*decoder.seen.lock().unwrap(), vec![1]);
    }
}
