//! nl80211 request/event engine.
//!
//! A [`SocketManager`] owns one generic netlink socket bound to the nl80211
//! family. It correlates replies to outstanding requests by sequence number,
//! aggregates multi-part dumps, expires requests that get no answer, and fans
//! unsolicited kernel events out to [`Listener`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use wlink::netlink::genl::nl80211::SocketManager;
//!
//! # async fn example() -> wlink::Result<()> {
//! let mgr = SocketManager::new().await?;
//!
//! for wiphy in mgr.get_all_wiphy_info().await? {
//!     println!("{}: {} bands", wiphy.name, wiphy.bands.len());
//! }
//!
//! let iface = mgr.get_interface_info(3).await?;
//! println!("{} on phy{} ({})", iface.name, iface.wiphy, iface.iftype);
//! # Ok(())
//! # }
//! ```
//!
//! # Events
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wlink::netlink::genl::nl80211::{EventHandlers, Filter, SocketManager};
//!
//! # async fn example() -> wlink::Result<()> {
//! let mgr = SocketManager::new().await?;
//!
//! let handlers = EventHandlers::new()
//!     .on_scan_done(Arc::new(|ev| println!("scan done on {:?}", ev.ifindex)));
//! let listener = mgr.add_listener(Filter::Id(0), Filter::Any, handlers)?;
//! // ...
//! mgr.remove_listener(&listener)?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod event;
#[cfg(test)]
pub(crate) mod fixtures;
mod listener;
mod manager;
mod parse;
mod request;
mod stats;
mod stream;
mod types;
mod vendor;

pub use event::{
    Event, EventBody, EventKind, FrameEvent, IfaceEvent, RadarEvent, ScanEvent, VendorEvent,
};
pub use listener::{EventHandler, EventHandlers, Filter, Listener, ListenerTier};
pub use manager::{ManagerConfig, ManagerConfigBuilder, SocketManager};
pub use request::{Ack, HandlerStatus, Reply, ReplyHandler, Request};
pub use stats::StatCounters;
pub use stream::EventStream;
pub use types::{
    BandInfo, ChannelDef, ChannelInfo, ChannelSurveyInfo, ChannelWidth, DfsState, FrameTx,
    IfaceInfo, InterfaceType, RateInfo, ScanParams, ScanResult, StationFlags, StationInfo,
    TxPowerSetting, WiphyBand, WiphyInfo, format_mac, freq_to_channel,
};
pub use vendor::{VendorData, VendorEventHandler, VendorReply};

use std::time::Duration;

/// nl80211 Generic Netlink family name.
pub const NL80211_GENL_NAME: &str = "nl80211";

/// nl80211 Generic Netlink version.
pub const NL80211_GENL_VERSION: u8 = 0;

/// Default budget for requests awaited in place.
pub const REQUEST_SYNC_TIMEOUT: Duration = Duration::from_secs(1);

/// Default budget for requests resolved through a [`Reply`].
pub const REQUEST_ASYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// nl80211 multicast group names.
pub mod mcast {
    pub const CONFIG: &str = "config";
    pub const SCAN: &str = "scan";
    pub const REGULATORY: &str = "regulatory";
    pub const MLME: &str = "mlme";
    pub const VENDOR: &str = "vendor";

    /// Groups every manager joins unless configured otherwise.
    pub const DEFAULT: &[&str] = &[CONFIG, SCAN, REGULATORY, MLME, VENDOR];
}

/// nl80211 commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nl80211Cmd {
    Unspec = 0,
    GetWiphy = 1,
    SetWiphy = 2,
    NewWiphy = 3,
    DelWiphy = 4,
    GetInterface = 5,
    SetInterface = 6,
    NewInterface = 7,
    DelInterface = 8,
    GetStation = 17,
    NewStation = 19,
    DelStation = 20,
    ReqSetReg = 27,
    GetScan = 32,
    TriggerScan = 33,
    NewScanResults = 34,
    ScanAborted = 35,
    RegChange = 36,
    GetSurvey = 50,
    NewSurveyResults = 51,
    Frame = 59,
    FrameTxStatus = 60,
    RadarDetect = 94,
    Vendor = 103,
    AbortScan = 114,
}

impl Nl80211Cmd {
    /// Map a wire command number to a known command.
    pub fn from_u8(cmd: u8) -> Option<Self> {
        use Nl80211Cmd::*;
        Some(match cmd {
            0 => Unspec,
            1 => GetWiphy,
            2 => SetWiphy,
            3 => NewWiphy,
            4 => DelWiphy,
            5 => GetInterface,
            6 => SetInterface,
            7 => NewInterface,
            8 => DelInterface,
            17 => GetStation,
            19 => NewStation,
            20 => DelStation,
            27 => ReqSetReg,
            32 => GetScan,
            33 => TriggerScan,
            34 => NewScanResults,
            35 => ScanAborted,
            36 => RegChange,
            50 => GetSurvey,
            51 => NewSurveyResults,
            59 => Frame,
            60 => FrameTxStatus,
            94 => RadarDetect,
            103 => Vendor,
            114 => AbortScan,
            _ => return None,
        })
    }

    /// Commands answered with a multi-part dump.
    pub fn is_dump(self) -> bool {
        matches!(self, Nl80211Cmd::GetScan | Nl80211Cmd::GetSurvey)
    }
}

/// nl80211 top-level attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nl80211Attr {
    Unspec = 0,
    Wiphy = 1,
    WiphyName = 2,
    Ifindex = 3,
    Ifname = 4,
    Iftype = 5,
    Mac = 6,
    StaInfo = 21,
    WiphyBands = 22,
    SupportedIftypes = 32,
    RegAlpha2 = 33,
    WiphyFreq = 38,
    WiphyChannelType = 39,
    Ie = 42,
    MaxNumScanSsids = 43,
    ScanFrequencies = 44,
    ScanSsids = 45,
    Generation = 46,
    Bss = 47,
    Frame = 51,
    Ssid = 52,
    MaxScanIeLen = 56,
    FourAddr = 83,
    SurveyInfo = 84,
    Duration = 87,
    Cookie = 88,
    Ack = 92,
    WiphyTxPowerSetting = 97,
    WiphyTxPowerLevel = 98,
    WiphyAntennaTx = 105,
    WiphyAntennaRx = 106,
    OffchannelTxOk = 108,
    WiphyAntennaAvailTx = 113,
    WiphyAntennaAvailRx = 114,
    DontWaitForAck = 142,
    RxSignalDbm = 151,
    Wdev = 153,
    ScanFlags = 158,
    ChannelWidth = 159,
    CenterFreq1 = 160,
    CenterFreq2 = 161,
    RadarEvent = 168,
    SplitWiphyDump = 174,
    VendorId = 195,
    VendorSubcmd = 196,
    VendorData = 197,
    ExtFeatures = 217,
    SurveyRadioStats = 218,
    RadarBackground = 308,
}

/// Per-band attributes (nested in `WiphyBands`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandAttr {
    Freqs = 1,
    Rates = 2,
    HtMcsSet = 3,
    HtCapa = 4,
    VhtMcsSet = 7,
    VhtCapa = 8,
}

/// Per-channel attributes (nested in `BandAttr::Freqs`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqAttr {
    Freq = 1,
    Disabled = 2,
    NoIr = 3,
    Radar = 5,
    MaxTxPower = 6,
    DfsState = 7,
    DfsTime = 8,
    DfsCacTime = 13,
}

/// Station info attributes (nested in `StaInfo`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaInfoAttr {
    InactiveTime = 1,
    RxBytes = 2,
    TxBytes = 3,
    Signal = 7,
    TxBitrate = 8,
    RxPackets = 9,
    TxPackets = 10,
    TxRetries = 11,
    TxFailed = 12,
    SignalAvg = 13,
    RxBitrate = 14,
    ConnectedTime = 16,
    StaFlags = 17,
    RxBytes64 = 23,
    TxBytes64 = 24,
}

/// Rate info attributes (nested in `TxBitrate` / `RxBitrate`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateInfoAttr {
    Bitrate = 1,
    Mcs = 2,
    Width40 = 3,
    ShortGi = 4,
    Bitrate32 = 5,
    VhtMcs = 6,
    VhtNss = 7,
    Width80 = 8,
    Width80p80 = 9,
    Width160 = 10,
}

/// Survey attributes (nested in `SurveyInfo`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyAttr {
    Frequency = 1,
    Noise = 2,
    InUse = 3,
    Time = 4,
    TimeBusy = 5,
    TimeExtBusy = 6,
    TimeRx = 7,
    TimeTx = 8,
    TimeScan = 9,
}

/// BSS attributes (nested in `Bss`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BssAttr {
    Bssid = 1,
    Frequency = 2,
    Tsf = 3,
    BeaconInterval = 4,
    Capability = 5,
    InformationElements = 6,
    SignalMbm = 7,
    SignalUnspec = 8,
    Status = 9,
    SeenMsAgo = 10,
}

/// Station flag bits of `StaInfoAttr::StaFlags` (`struct nl80211_sta_flag_update`).
pub mod sta_flag {
    pub const AUTHORIZED: u32 = 1;
    pub const SHORT_PREAMBLE: u32 = 2;
    pub const WME: u32 = 3;
    pub const MFP: u32 = 4;
    pub const AUTHENTICATED: u32 = 5;
    pub const TDLS_PEER: u32 = 6;
    pub const ASSOCIATED: u32 = 7;
}

/// `NL80211_SCAN_FLAG_*` bits.
pub mod scan_flag {
    pub const LOW_PRIORITY: u32 = 1 << 0;
    pub const FLUSH: u32 = 1 << 1;
    pub const AP: u32 = 1 << 2;
    pub const RANDOM_ADDR: u32 = 1 << 3;
}

/// `NL80211_TX_POWER_*` modes.
pub mod tx_power {
    pub const AUTOMATIC: u32 = 0;
    pub const LIMITED: u32 = 1;
    pub const FIXED: u32 = 2;
}

/// `NL80211_RADAR_*` event types.
pub mod radar {
    pub const DETECTED: u32 = 0;
    pub const CAC_FINISHED: u32 = 1;
    pub const CAC_ABORTED: u32 = 2;
    pub const NOP_FINISHED: u32 = 3;
    pub const PRE_CAC_EXPIRED: u32 = 4;
    pub const CAC_STARTED: u32 = 5;
}
