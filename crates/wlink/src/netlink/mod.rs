//! Async netlink plumbing for the nl80211 engine.
//!
//! The layers, bottom up:
//!
//! - [`socket`]: the non-blocking `NETLINK_GENERIC` socket and the
//!   [`Transport`] seam the engine talks through
//! - [`message`], [`attr`], [`builder`]: netlink headers and TLV attributes
//! - [`genl`]: generic netlink family resolution and the nl80211 engine
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wlink::netlink::genl::nl80211::SocketManager;
//!
//! # async fn example() -> wlink::Result<()> {
//! let mgr = SocketManager::shared().await?;
//!
//! for iface in mgr.get_all_interfaces().await? {
//!     println!("{}: phy{} {}", iface.name, iface.wiphy, iface.iftype);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attr;
pub mod builder;
mod error;
pub mod genl;
pub mod message;
pub mod socket;

pub use attr::{AttrIter, AttrMap, NlAttr};
pub use builder::{AttrList, AttrValue, MessageBuilder};
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use socket::{NetlinkSocket, Transport};
