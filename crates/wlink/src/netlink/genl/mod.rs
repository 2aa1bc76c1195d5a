//! Generic Netlink (GENL) support.
//!
//! Generic Netlink extends the standard netlink protocol with:
//! - Dynamic family ID allocation (resolved via control family)
//! - Family-specific commands and attributes
//! - Multicast group support per family
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ SocketManager (nl80211 high-level API)  │
//! └───────┬─────────────────────┬───────────┘
//!         │ requests / events   │ family lookup
//! ┌───────▼──────────────┐ ┌────▼────────────┐
//! │ Transport            │ │ GenlConnection  │
//! │ (NetlinkSocket)      │ │ (control family)│
//! └──────────────────────┘ └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use wlink::netlink::genl::GenlConnection;
//!
//! # async fn example() -> wlink::Result<()> {
//! let conn = GenlConnection::new()?;
//!
//! let family = conn.get_family("nl80211").await?;
//! println!("nl80211 family ID: {}", family.id);
//! # Ok(())
//! # }
//! ```

mod connection;
mod header;

pub use connection::{FamilyInfo, GenlConnection};
pub use header::{GENL_HDRLEN, GenlMessage, GenlMsgHdr};

pub mod nl80211;

// Control family constants (fixed, not dynamically assigned)
pub const GENL_ID_CTRL: u16 = 0x10;

/// Control family commands
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Unspec = 0,
    NewFamily = 1,
    DelFamily = 2,
    GetFamily = 3,
}

/// Control family attributes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    Unspec = 0,
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    Ops = 6,
    McastGroups = 7,
}

/// Control family multicast group attributes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrMcastGrp {
    Unspec = 0,
    Name = 1,
    Id = 2,
}
