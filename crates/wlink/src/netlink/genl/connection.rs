//! Generic Netlink family resolution through the control family.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracing::{debug, trace};

use super::header::{GenlMessage, GenlMsgHdr};
use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::AttrMap;
use crate::netlink::builder::{AttrList, MessageBuilder};
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{MessageIter, NLM_F_ACK, NLM_F_REQUEST, NlMsgError};
use crate::netlink::socket::NetlinkSocket;

/// How long the control family gets to answer a lookup.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Information about a Generic Netlink family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Header size (additional bytes after genlmsghdr).
    pub hdr_size: u32,
    /// Maximum attribute number.
    pub max_attr: u32,
    /// Multicast groups: name -> group ID.
    pub mcast_groups: HashMap<String, u32>,
}

impl FamilyInfo {
    /// Look up a multicast group id by name.
    pub fn mcast_group(&self, name: &str) -> Option<u32> {
        self.mcast_groups.get(name).copied()
    }
}

/// Short-lived connection to the generic netlink control family.
///
/// Only used to resolve family ids and multicast groups; the request
/// engine talks to the resolved family over its own socket.
pub struct GenlConnection {
    socket: NetlinkSocket,
    seq: AtomicU32,
}

impl GenlConnection {
    /// Create a new Generic Netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
            seq: AtomicU32::new(1),
        })
    }

    /// Query the kernel for information about a family.
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let mut builder = MessageBuilder::new(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK);
        builder.append(&GenlMsgHdr::new(CtrlCmd::GetFamily as u8, 1));
        builder.append_attrs(&AttrList::new().string(CtrlAttr::FamilyName as u16, name))?;
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.try_send(&msg)?;
        debug!(family = name, seq, "resolving generic netlink family");

        let lookup = async {
            loop {
                let data = self.socket.recv_msg().await?;
                if let Some(info) = parse_family_response(&data, seq, name)? {
                    return Ok(info);
                }
            }
        };

        match tokio::time::timeout(RESOLVE_TIMEOUT, lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                seq,
                budget: RESOLVE_TIMEOUT,
            }),
        }
    }
}

/// Parse one datagram received in answer to `CTRL_CMD_GETFAMILY`.
///
/// Returns `Ok(None)` when the datagram holds nothing for `seq` (or only
/// the trailing ACK), so the caller keeps reading.
pub(crate) fn parse_family_response(
    data: &[u8],
    seq: u32,
    name: &str,
) -> Result<Option<FamilyInfo>> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != seq {
            trace!(seq = header.nlmsg_seq, "ignoring unrelated control message");
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            if err.is_ack() {
                continue;
            }
            // ENOENT means family not found
            if err.error == -libc::ENOENT {
                return Err(Error::FamilyNotFound {
                    name: name.to_string(),
                });
            }
            return Err(Error::from_errno(err.error));
        }

        if header.is_done() {
            continue;
        }

        let msg = GenlMessage::parse(header, payload)?;
        return parse_family_attrs(&msg.attrs()).map(Some);
    }

    Ok(None)
}

fn parse_family_attrs(attrs: &AttrMap<'_>) -> Result<FamilyInfo> {
    let id = attrs
        .u16(CtrlAttr::FamilyId as u16)
        .ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;

    let mut mcast_groups = HashMap::new();
    // CTRL_ATTR_MCAST_GROUPS is an array of nested {name, id} entries
    for (_idx, group) in attrs.nested_iter(CtrlAttr::McastGroups as u16) {
        let group = AttrMap::parse(group);
        let name = group.string(CtrlAttrMcastGrp::Name as u16);
        let grp_id = group.u32(CtrlAttrMcastGrp::Id as u16);
        if let (Some(name), Some(id)) = (name, grp_id) {
            mcast_groups.insert(name, id);
        }
    }

    Ok(FamilyInfo {
        id,
        version: attrs.u32(CtrlAttr::Version as u16).unwrap_or(0) as u8,
        hdr_size: attrs.u32(CtrlAttr::HdrSize as u16).unwrap_or(0),
        max_attr: attrs.u32(CtrlAttr::MaxAttr as u16).unwrap_or(0),
        mcast_groups,
    })
}
