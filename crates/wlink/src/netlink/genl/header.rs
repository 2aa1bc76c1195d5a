//! Generic Netlink message header.
//!
//! GENL messages have an additional header after the standard netlink header:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ nlmsghdr (16 bytes)                     │
//! │   nlmsg_len, nlmsg_type (family_id),    │
//! │   nlmsg_flags, nlmsg_seq, nlmsg_pid     │
//! ├─────────────────────────────────────────┤
//! │ genlmsghdr (4 bytes)                    │
//! │   cmd (u8), version (u8), reserved (u16)│
//! ├─────────────────────────────────────────┤
//! │ Attributes (TLV format)                 │
//! └─────────────────────────────────────────┘
//! ```

use std::mem;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::netlink::attr::AttrMap;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::NlMsgHdr;

/// Generic Netlink message header.
///
/// This header immediately follows the standard netlink header in GENL messages.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    /// Command identifier (family-specific)
    pub cmd: u8,
    /// Interface version
    pub version: u8,
    /// Reserved for future use
    pub reserved: u16,
}

/// Size of the GENL header in bytes.
pub const GENL_HDRLEN: usize = mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    /// Create a new GENL header with the given command and version.
    #[inline]
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Get the header as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Create a header from a byte slice.
    ///
    /// Returns `None` if the slice is too short.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(hdr, _)| hdr)
    }
}

/// A received generic netlink data message.
///
/// Borrows the receive buffer; handlers that need the content past the
/// callback copy it out.
#[derive(Debug, Clone, Copy)]
pub struct GenlMessage<'a> {
    header: &'a NlMsgHdr,
    genl: GenlMsgHdr,
    attrs: &'a [u8],
}

impl<'a> GenlMessage<'a> {
    /// Split a netlink payload into the GENL header and attribute area.
    pub fn parse(header: &'a NlMsgHdr, payload: &'a [u8]) -> Result<Self> {
        let genl = GenlMsgHdr::from_bytes(payload).ok_or(Error::Truncated {
            expected: GENL_HDRLEN,
            actual: payload.len(),
        })?;
        Ok(Self {
            header,
            genl,
            attrs: &payload[GENL_HDRLEN..],
        })
    }

    /// Family-specific command.
    pub fn cmd(&self) -> u8 {
        self.genl.cmd
    }

    pub fn version(&self) -> u8 {
        self.genl.version
    }

    /// Netlink message type (the family id).
    pub fn family(&self) -> u16 {
        self.header.nlmsg_type
    }

    pub fn seq(&self) -> u32 {
        self.header.nlmsg_seq
    }

    /// Whether the message is part of a multi-part reply.
    pub fn is_multi(&self) -> bool {
        self.header.is_multi()
    }

    /// Raw attribute area.
    pub fn payload(&self) -> &'a [u8] {
        self.attrs
    }

    /// Index the top-level attributes.
    pub fn attrs(&self) -> AttrMap<'a> {
        AttrMap::parse(self.attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genl_header_size() {
        assert_eq!(GENL_HDRLEN, 4);
    }

    #[test]
    fn test_genl_header_from_bytes() {
        let data = [0x03, 0x01, 0x00, 0x00]; // cmd=3, version=1
        let hdr = GenlMsgHdr::from_bytes(&data).unwrap();
        assert_eq!(hdr.cmd, 3);
        assert_eq!(hdr.version, 1);
    }

    #[test]
    fn test_genl_header_from_bytes_too_short() {
        let data = [0x03, 0x01, 0x00]; // Only 3 bytes
        assert!(GenlMsgHdr::from_bytes(&data).is_none());
    }

    #[test]
    fn test_message_view() {
        let mut hdr = NlMsgHdr::new(0x1c, 0);
        hdr.nlmsg_seq = 42;
        let payload = [7u8, 0, 0, 0, 8, 0, 3, 0, 5, 0, 0, 0];
        let msg = GenlMessage::parse(&hdr, &payload).unwrap();
        assert_eq!(msg.cmd(), 7);
        assert_eq!(msg.family(), 0x1c);
        assert_eq!(msg.seq(), 42);
        assert_eq!(msg.attrs().u32(3), Some(5));

        assert!(GenlMessage::parse(&hdr, &[1, 0]).is_err());
    }
}
