//! Unsolicited nl80211 events.

use super::parse::parse_chandef;
use super::types::{ChannelDef, InterfaceType};
use super::{Nl80211Attr, Nl80211Cmd, radar};
use crate::netlink::attr::AttrMap;
use crate::netlink::genl::GenlMessage;

/// Handler slot an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EventKind {
    InterfaceCreated,
    InterfaceDeleted,
    ScanStarted,
    ScanAborted,
    ScanDone,
    Vendor,
    MgmtFrameRx,
    FrameTxStatus,
    Radar,
    /// Any other nl80211 command.
    Other,
}

impl EventKind {
    pub fn from_cmd(cmd: u8) -> Self {
        match Nl80211Cmd::from_u8(cmd) {
            Some(Nl80211Cmd::NewInterface) => Self::InterfaceCreated,
            Some(Nl80211Cmd::DelInterface) => Self::InterfaceDeleted,
            Some(Nl80211Cmd::TriggerScan) => Self::ScanStarted,
            Some(Nl80211Cmd::ScanAborted) => Self::ScanAborted,
            Some(Nl80211Cmd::NewScanResults) => Self::ScanDone,
            Some(Nl80211Cmd::Vendor) => Self::Vendor,
            Some(Nl80211Cmd::Frame) => Self::MgmtFrameRx,
            Some(Nl80211Cmd::FrameTxStatus) => Self::FrameTxStatus,
            Some(Nl80211Cmd::RadarDetect) => Self::Radar,
            _ => Self::Other,
        }
    }
}

/// Interface created / deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IfaceEvent {
    pub name: Option<String>,
    pub iftype: Option<InterfaceType>,
    pub mac: Option<[u8; 6]>,
}

/// Scan started / aborted / results available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanEvent {
    pub freqs: Vec<u32>,
    pub ssids: Vec<Vec<u8>>,
}

/// Vendor-specific event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VendorEvent {
    pub oui: u32,
    pub subcmd: u32,
    /// `NL80211_ATTR_VENDOR_DATA`, empty when absent.
    pub data: Vec<u8>,
}

/// Received management frame or transmit status of one we sent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrameEvent {
    pub frame: Vec<u8>,
    pub freq: Option<u32>,
    pub signal_dbm: Option<i32>,
    pub cookie: Option<u64>,
    /// Transmit status only: the frame was acknowledged.
    pub ack: bool,
}

/// Radar / DFS event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RadarEvent {
    /// One of the [`radar`] constants.
    pub event: u32,
    pub chandef: Option<ChannelDef>,
    /// Reported by the background (zero-wait) radar chain.
    pub background: bool,
}

impl RadarEvent {
    pub fn is_detected(&self) -> bool {
        self.event == radar::DETECTED
    }
}

/// Typed body of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EventBody {
    Iface(IfaceEvent),
    Scan(ScanEvent),
    Vendor(VendorEvent),
    Frame(FrameEvent),
    Radar(RadarEvent),
    /// Raw attribute area of an event without a typed body.
    Other(Vec<u8>),
}

/// One decoded nl80211 event. Owned, so listeners may keep it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event {
    pub cmd: u8,
    pub kind: EventKind,
    pub wiphy: Option<u32>,
    pub ifindex: Option<u32>,
    pub wdev: Option<u64>,
    pub body: EventBody,
}

impl Event {
    /// Decode an unsolicited message.
    pub fn parse(msg: &GenlMessage<'_>) -> Self {
        let attrs = msg.attrs();
        let kind = EventKind::from_cmd(msg.cmd());
        let body = match kind {
            EventKind::InterfaceCreated | EventKind::InterfaceDeleted => {
                EventBody::Iface(IfaceEvent {
                    name: attrs.string(Nl80211Attr::Ifname as u16),
                    iftype: attrs.u32(Nl80211Attr::Iftype as u16).map(InterfaceType::from),
                    mac: attrs.mac(Nl80211Attr::Mac as u16),
                })
            }
            EventKind::ScanStarted | EventKind::ScanAborted | EventKind::ScanDone => {
                EventBody::Scan(parse_scan(&attrs))
            }
            EventKind::Vendor => EventBody::Vendor(VendorEvent {
                oui: attrs.u32(Nl80211Attr::VendorId as u16).unwrap_or(0),
                subcmd: attrs.u32(Nl80211Attr::VendorSubcmd as u16).unwrap_or(0),
                data: attrs
                    .get(Nl80211Attr::VendorData as u16)
                    .map(<[u8]>::to_vec)
                    .unwrap_or_default(),
            }),
            EventKind::MgmtFrameRx | EventKind::FrameTxStatus => EventBody::Frame(FrameEvent {
                frame: attrs
                    .get(Nl80211Attr::Frame as u16)
                    .map(<[u8]>::to_vec)
                    .unwrap_or_default(),
                freq: attrs.u32(Nl80211Attr::WiphyFreq as u16),
                signal_dbm: attrs.i32(Nl80211Attr::RxSignalDbm as u16),
                cookie: attrs.u64(Nl80211Attr::Cookie as u16),
                ack: attrs.has(Nl80211Attr::Ack as u16),
            }),
            EventKind::Radar => EventBody::Radar(RadarEvent {
                event: attrs.u32(Nl80211Attr::RadarEvent as u16).unwrap_or(radar::DETECTED),
                chandef: parse_chandef(&attrs),
                background: attrs.has(Nl80211Attr::RadarBackground as u16),
            }),
            EventKind::Other => EventBody::Other(msg.payload().to_vec()),
        };

        Self {
            cmd: msg.cmd(),
            kind,
            wiphy: attrs.u32(Nl80211Attr::Wiphy as u16),
            ifindex: attrs.u32(Nl80211Attr::Ifindex as u16),
            wdev: attrs.u64(Nl80211Attr::Wdev as u16),
            body,
        }
    }

    pub fn iface(&self) -> Option<&IfaceEvent> {
        match &self.body {
            EventBody::Iface(ev) => Some(ev),
            _ => None,
        }
    }

    pub fn scan(&self) -> Option<&ScanEvent> {
        match &self.body {
            EventBody::Scan(ev) => Some(ev),
            _ => None,
        }
    }

    pub fn vendor(&self) -> Option<&VendorEvent> {
        match &self.body {
            EventBody::Vendor(ev) => Some(ev),
            _ => None,
        }
    }

    pub fn frame(&self) -> Option<&FrameEvent> {
        match &self.body {
            EventBody::Frame(ev) => Some(ev),
            _ => None,
        }
    }

    pub fn radar(&self) -> Option<&RadarEvent> {
        match &self.body {
            EventBody::Radar(ev) => Some(ev),
            _ => None,
        }
    }

    /// Attribute area of an untyped event.
    pub fn raw_attrs(&self) -> Option<AttrMap<'_>> {
        match &self.body {
            EventBody::Other(raw) => Some(AttrMap::parse(raw)),
            _ => None,
        }
    }
}

fn parse_scan(attrs: &AttrMap<'_>) -> ScanEvent {
    ScanEvent {
        freqs: attrs
            .nested_iter(Nl80211Attr::ScanFrequencies as u16)
            .filter_map(|(_, f)| crate::netlink::attr::get::u32_ne(f).ok())
            .collect(),
        ssids: attrs
            .nested_iter(Nl80211Attr::ScanSsids as u16)
            .map(|(_, s)| s.to_vec())
            .collect(),
    }
}
