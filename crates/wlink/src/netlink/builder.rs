//! Message builder for constructing netlink messages.
//!
//! Attributes are described logically with [`AttrList`] and serialized
//! depth-first into the message buffer. Lengths are validated before any
//! byte is written, so an oversized attribute is an error instead of a
//! silently wrapped `nla_len`.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Value carried by one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    /// Null-terminated string.
    Str(String),
    /// Fixed-length binary payload.
    Bytes(Vec<u8>),
    /// Zero-length attribute, presence only.
    Flag,
    /// Nested attribute level.
    Nested(AttrList),
}

impl AttrValue {
    fn payload_len(&self) -> usize {
        match self {
            AttrValue::U8(_) => 1,
            AttrValue::U16(_) => 2,
            AttrValue::U32(_) | AttrValue::I32(_) => 4,
            AttrValue::U64(_) => 8,
            AttrValue::Str(s) => s.len() + 1,
            AttrValue::Bytes(b) => b.len(),
            AttrValue::Flag => 0,
            AttrValue::Nested(list) => list.encoded_len(),
        }
    }
}

/// A single typed attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub kind: u16,
    pub value: AttrValue,
}

impl Attr {
    /// Wire length including header and alignment padding.
    fn encoded_len(&self) -> usize {
        nla_align(NLA_HDRLEN + self.value.payload_len())
    }

    fn check(&self) -> Result<()> {
        let len = NLA_HDRLEN + self.value.payload_len();
        if len > u16::MAX as usize {
            return Err(Error::InvalidAttribute(format!(
                "attribute {} is {} bytes, exceeds nla_len range",
                self.kind, len
            )));
        }
        if let AttrValue::Nested(list) = &self.value {
            for attr in &list.attrs {
                attr.check()?;
            }
        }
        Ok(())
    }

    fn write(&self, buf: &mut Vec<u8>) {
        let payload_len = self.value.payload_len();
        let kind = match self.value {
            AttrValue::Nested(_) => self.kind | NLA_F_NESTED,
            _ => self.kind,
        };
        buf.extend_from_slice(NlAttr::new(kind, payload_len).as_bytes());
        match &self.value {
            AttrValue::U8(v) => buf.push(*v),
            AttrValue::U16(v) => buf.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::U32(v) => buf.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::U64(v) => buf.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::I32(v) => buf.extend_from_slice(&v.to_ne_bytes()),
            AttrValue::Str(s) => {
                buf.extend_from_slice(s.as_bytes());
                buf.push(0);
            }
            AttrValue::Bytes(b) => buf.extend_from_slice(b),
            AttrValue::Flag => {}
            AttrValue::Nested(list) => {
                for attr in &list.attrs {
                    attr.write(buf);
                }
            }
        }
        let aligned = nla_align(buf.len());
        buf.resize(aligned, 0);
    }
}

/// Ordered list of attributes, the logical form of an attribute tree.
///
/// ```ignore
/// let attrs = AttrList::new()
///     .u32(Nl80211Attr::Wiphy as u16, 0)
///     .flag(Nl80211Attr::SplitWiphyDump as u16);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrList {
    attrs: Vec<Attr>,
}

impl AttrList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute.
    pub fn push(&mut self, kind: u16, value: AttrValue) {
        self.attrs.push(Attr { kind, value });
    }

    /// Append an attribute, builder style.
    pub fn with(mut self, kind: u16, value: AttrValue) -> Self {
        self.push(kind, value);
        self
    }

    pub fn u8(self, kind: u16, value: u8) -> Self {
        self.with(kind, AttrValue::U8(value))
    }

    pub fn u16(self, kind: u16, value: u16) -> Self {
        self.with(kind, AttrValue::U16(value))
    }

    pub fn u32(self, kind: u16, value: u32) -> Self {
        self.with(kind, AttrValue::U32(value))
    }

    pub fn u64(self, kind: u16, value: u64) -> Self {
        self.with(kind, AttrValue::U64(value))
    }

    pub fn i32(self, kind: u16, value: i32) -> Self {
        self.with(kind, AttrValue::I32(value))
    }

    pub fn string(self, kind: u16, value: impl Into<String>) -> Self {
        self.with(kind, AttrValue::Str(value.into()))
    }

    pub fn bytes(self, kind: u16, value: impl Into<Vec<u8>>) -> Self {
        self.with(kind, AttrValue::Bytes(value.into()))
    }

    pub fn flag(self, kind: u16) -> Self {
        self.with(kind, AttrValue::Flag)
    }

    pub fn nested(self, kind: u16, list: AttrList) -> Self {
        self.with(kind, AttrValue::Nested(list))
    }

    /// The attributes in insertion order.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Whether an attribute of this type is already in the list (top level).
    pub fn contains(&self, kind: u16) -> bool {
        self.attrs.iter().any(|a| a.kind == kind)
    }

    /// Total wire length of the list.
    pub fn encoded_len(&self) -> usize {
        self.attrs.iter().map(Attr::encoded_len).sum()
    }

    /// Serialize the list into a standalone buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Serialize the list at the end of `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        for attr in &self.attrs {
            attr.check()?;
        }
        for attr in &self.attrs {
            attr.write(buf);
        }
        Ok(())
    }
}

/// Builder for constructing netlink messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let header = NlMsgHdr::new(msg_type, flags);
        let mut buf = vec![0u8; NLMSG_HDRLEN];
        buf[..std::mem::size_of::<NlMsgHdr>()].copy_from_slice(header.as_bytes());
        Self { buf }
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Append raw bytes to the message (with alignment padding).
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        let aligned = nlmsg_align(self.buf.len());
        self.buf.resize(aligned, 0);
    }

    /// Append a fixed-size wire struct to the message.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.append_bytes(data.as_bytes());
    }

    /// Append a single attribute with a raw payload.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) -> Result<()> {
        AttrList::new()
            .bytes(attr_type, data)
            .write_to(&mut self.buf)
    }

    /// Append a whole attribute tree.
    pub fn append_attrs(&mut self, attrs: &AttrList) -> Result<()> {
        attrs.write_to(&mut self.buf)
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        let bytes = seq.to_ne_bytes();
        self.buf[8..12].copy_from_slice(&bytes);
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        let bytes = pid.to_ne_bytes();
        self.buf[12..16].copy_from_slice(&bytes);
    }

    /// Finalize and return the message bytes.
    pub fn finish(mut self) -> Vec<u8> {
        // Update message length in header
        let len = self.buf.len() as u32;
        let len_bytes = len.to_ne_bytes();
        self.buf[0..4].copy_from_slice(&len_bytes);
        self.buf
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
