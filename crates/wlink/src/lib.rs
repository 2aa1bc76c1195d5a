//! Async nl80211 library for Linux WiFi radios.
//!
//! `wlink` drives the kernel's nl80211 generic netlink family: it resolves
//! the family, correlates requests with their replies (including multi-part
//! dumps), enforces per-request time budgets, and fans unsolicited kernel
//! events out to listeners scoped by wiphy and interface.
//!
//! # Features
//!
//! - `serde` - `Serialize` for the read-models (wiphy, interface, station...)
//! - `integration` - enables the integration tests against the running kernel
//!
//! # Example
//!
//! ```rust,no_run
//! use wlink::netlink::genl::nl80211::{ScanParams, SocketManager};
//!
//! #[tokio::main]
//! async fn main() -> wlink::Result<()> {
//!     let mgr = SocketManager::new().await?;
//!
//!     for wiphy in mgr.get_all_wiphy_info().await? {
//!         println!("{}: {} tx / {} rx chains", wiphy.name, wiphy.tx_chains(), wiphy.rx_chains());
//!     }
//!
//!     let ifindex = wlink::util::name_to_index("wlan0")?;
//!     mgr.start_scan(ifindex, &ScanParams::default())?.await?;
//!     Ok(())
//! }
//! ```
//!
//! # Event Monitoring
//!
//! ```rust,no_run
//! use tokio_stream::StreamExt;
//! use wlink::netlink::genl::nl80211::{Filter, SocketManager};
//!
//! # async fn example() -> wlink::Result<()> {
//! let mgr = SocketManager::new().await?;
//! let mut events = mgr.event_stream(Filter::Any, Filter::Any)?;
//!
//! while let Some(event) = events.next().await {
//!     println!("{:?} wiphy={:?} ifindex={:?}", event.kind, event.wiphy, event.ifindex);
//! }
//! # Ok(())
//! # }
//! ```

pub mod netlink;
pub mod util;

// Re-export common types at crate root for convenience
pub use netlink::genl::nl80211::SocketManager;
pub use netlink::{Error, Result};
