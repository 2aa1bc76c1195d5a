//! Vendor commands and vendor event decoding.

use super::Nl80211Attr;
use super::event::VendorEvent;
use super::parse::vendor_payloads;
use super::request::{HandlerStatus, ReplyHandler};
use crate::netlink::builder::{AttrList, AttrValue};
use crate::netlink::error::Result;
use crate::netlink::genl::GenlMessage;

/// Payload of a vendor command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorData {
    /// Opaque bytes, sent as-is.
    Raw(Vec<u8>),
    /// Attribute tree, sent as a nested attribute.
    Attrs(AttrList),
}

impl VendorData {
    pub(crate) fn into_value(self) -> AttrValue {
        match self {
            VendorData::Raw(bytes) => AttrValue::Bytes(bytes),
            VendorData::Attrs(list) => AttrValue::Nested(list),
        }
    }
}

/// Decoder for the vendor events of one OUI.
///
/// Registered on a listener with
/// [`SocketManager::augment_vendor_handler`](super::SocketManager::augment_vendor_handler).
/// Subcommands the decoder does not know should return
/// [`Error::NotImplemented`](crate::Error::NotImplemented); the event then
/// does not count as handled by this decoder.
pub trait VendorEventHandler: Send + Sync + 'static {
    /// IEEE OUI the handler decodes (e.g. `0x001374`).
    fn oui(&self) -> u32;

    fn handle(&self, wiphy: Option<u32>, ifindex: Option<u32>, event: &VendorEvent) -> Result<()>;
}

/// Collects every `NL80211_ATTR_VENDOR_DATA` payload of a vendor reply.
#[derive(Debug, Default)]
pub struct VendorReply {
    payloads: Vec<Vec<u8>>,
}

impl VendorReply {
    pub fn into_payloads(self) -> Vec<Vec<u8>> {
        self.payloads
    }
}

impl ReplyHandler for VendorReply {
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus {
        self.payloads.extend(vendor_payloads(msg.payload()));
        HandlerStatus::Ok
    }
}

/// Attributes of an `NL80211_CMD_VENDOR` request.
pub(crate) fn vendor_attrs(oui: u32, subcmd: u32, data: Option<VendorData>) -> AttrList {
    let mut attrs = AttrList::new()
        .u32(Nl80211Attr::VendorId as u16, oui)
        .u32(Nl80211Attr::VendorSubcmd as u16, subcmd);
    if let Some(data) = data {
        attrs.push(Nl80211Attr::VendorData as u16, data.into_value());
    }
    attrs
}
