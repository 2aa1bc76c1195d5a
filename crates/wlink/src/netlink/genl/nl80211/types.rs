//! nl80211 read-models and request option types.
//!
//! Everything here is a plain value: parsed out of a reply, handed to the
//! caller, never pointing back into the engine.

use std::fmt;
use std::str::FromStr;

use crate::netlink::error::Error;

/// Interface type (`enum nl80211_iftype`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum InterfaceType {
    #[default]
    Unspecified,
    Adhoc,
    Station,
    Ap,
    ApVlan,
    Wds,
    Monitor,
    MeshPoint,
    P2pClient,
    P2pGo,
    P2pDevice,
    Ocb,
    Nan,
    Unknown(u32),
}

impl From<u32> for InterfaceType {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Unspecified,
            1 => Self::Adhoc,
            2 => Self::Station,
            3 => Self::Ap,
            4 => Self::ApVlan,
            5 => Self::Wds,
            6 => Self::Monitor,
            7 => Self::MeshPoint,
            8 => Self::P2pClient,
            9 => Self::P2pGo,
            10 => Self::P2pDevice,
            11 => Self::Ocb,
            12 => Self::Nan,
            other => Self::Unknown(other),
        }
    }
}

impl InterfaceType {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::Adhoc => 1,
            Self::Station => 2,
            Self::Ap => 3,
            Self::ApVlan => 4,
            Self::Wds => 5,
            Self::Monitor => 6,
            Self::MeshPoint => 7,
            Self::P2pClient => 8,
            Self::P2pGo => 9,
            Self::P2pDevice => 10,
            Self::Ocb => 11,
            Self::Nan => 12,
            Self::Unknown(v) => v,
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Adhoc => write!(f, "IBSS"),
            Self::Station => write!(f, "managed"),
            Self::Ap => write!(f, "AP"),
            Self::ApVlan => write!(f, "AP/VLAN"),
            Self::Wds => write!(f, "WDS"),
            Self::Monitor => write!(f, "monitor"),
            Self::MeshPoint => write!(f, "mesh point"),
            Self::P2pClient => write!(f, "P2P-client"),
            Self::P2pGo => write!(f, "P2P-GO"),
            Self::P2pDevice => write!(f, "P2P-device"),
            Self::Ocb => write!(f, "outside context of a BSS"),
            Self::Nan => write!(f, "NAN"),
            Self::Unknown(v) => write!(f, "unknown ({})", v),
        }
    }
}

impl FromStr for InterfaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "managed" | "station" | "sta" => Self::Station,
            "ap" => Self::Ap,
            "ibss" | "adhoc" => Self::Adhoc,
            "monitor" => Self::Monitor,
            "mesh" | "mp" => Self::MeshPoint,
            "wds" => Self::Wds,
            "ocb" => Self::Ocb,
            "p2p-client" => Self::P2pClient,
            "p2p-go" => Self::P2pGo,
            _ => {
                return Err(Error::InvalidParam(format!(
                    "unknown interface type: {}",
                    s
                )));
            }
        })
    }
}

/// Channel width (`enum nl80211_chan_width`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ChannelWidth {
    #[default]
    NoHt20,
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz80p80,
    Mhz160,
    Mhz5,
    Mhz10,
    Mhz320,
    Unknown(u32),
}

impl From<u32> for ChannelWidth {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::NoHt20,
            1 => Self::Mhz20,
            2 => Self::Mhz40,
            3 => Self::Mhz80,
            4 => Self::Mhz80p80,
            5 => Self::Mhz160,
            6 => Self::Mhz5,
            7 => Self::Mhz10,
            13 => Self::Mhz320,
            other => Self::Unknown(other),
        }
    }
}

impl ChannelWidth {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::NoHt20 => 0,
            Self::Mhz20 => 1,
            Self::Mhz40 => 2,
            Self::Mhz80 => 3,
            Self::Mhz80p80 => 4,
            Self::Mhz160 => 5,
            Self::Mhz5 => 6,
            Self::Mhz10 => 7,
            Self::Mhz320 => 13,
            Self::Unknown(v) => v,
        }
    }

    /// Width in MHz, if known.
    pub fn mhz(self) -> Option<u32> {
        match self {
            Self::NoHt20 | Self::Mhz20 => Some(20),
            Self::Mhz40 => Some(40),
            Self::Mhz80 | Self::Mhz80p80 => Some(80),
            Self::Mhz160 => Some(160),
            Self::Mhz5 => Some(5),
            Self::Mhz10 => Some(10),
            Self::Mhz320 => Some(320),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ChannelWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHt20 => write!(f, "20 MHz (no HT)"),
            Self::Mhz80p80 => write!(f, "80+80 MHz"),
            Self::Unknown(v) => write!(f, "unknown ({})", v),
            other => write!(f, "{} MHz", other.mhz().unwrap_or(0)),
        }
    }
}

/// Frequency band (`enum nl80211_band`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum WiphyBand {
    Ghz2,
    Ghz5,
    Ghz60,
    Ghz6,
    Unknown(u16),
}

impl From<u16> for WiphyBand {
    fn from(v: u16) -> Self {
        match v {
            0 => Self::Ghz2,
            1 => Self::Ghz5,
            2 => Self::Ghz60,
            3 => Self::Ghz6,
            other => Self::Unknown(other),
        }
    }
}

impl WiphyBand {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ghz2 => 0,
            Self::Ghz5 => 1,
            Self::Ghz60 => 2,
            Self::Ghz6 => 3,
            Self::Unknown(v) => v,
        }
    }
}

impl fmt::Display for WiphyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ghz2 => write!(f, "2.4 GHz"),
            Self::Ghz5 => write!(f, "5 GHz"),
            Self::Ghz60 => write!(f, "60 GHz"),
            Self::Ghz6 => write!(f, "6 GHz"),
            Self::Unknown(v) => write!(f, "band {}", v),
        }
    }
}

/// DFS state of a channel (`enum nl80211_dfs_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DfsState {
    Usable,
    Unavailable,
    Available,
    Unknown(u32),
}

impl From<u32> for DfsState {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Usable,
            1 => Self::Unavailable,
            2 => Self::Available,
            other => Self::Unknown(other),
        }
    }
}

impl DfsState {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Usable => 0,
            Self::Unavailable => 1,
            Self::Available => 2,
            Self::Unknown(v) => v,
        }
    }
}

/// Channel definition: control frequency, width and center frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelDef {
    pub freq: u32,
    pub width: ChannelWidth,
    pub center_freq1: Option<u32>,
    pub center_freq2: Option<u32>,
}

impl ChannelDef {
    /// A 20 MHz channel centered on `freq`.
    pub fn new(freq: u32) -> Self {
        Self {
            freq,
            width: ChannelWidth::Mhz20,
            center_freq1: Some(freq),
            center_freq2: None,
        }
    }

    pub fn width(mut self, width: ChannelWidth, center_freq1: u32) -> Self {
        self.width = width;
        self.center_freq1 = Some(center_freq1);
        self
    }

    pub fn center_freq2(mut self, freq: u32) -> Self {
        self.center_freq2 = Some(freq);
        self
    }
}

/// Convert a center frequency in MHz to an IEEE 802.11 channel number.
pub fn freq_to_channel(freq: u32) -> Option<u32> {
    match freq {
        2484 => Some(14),
        2412..=2472 => Some((freq - 2407) / 5),
        // 6 GHz: channel 2 is a special case
        5935 => Some(2),
        5955..=7115 => Some((freq - 5950) / 5),
        5000..=5925 => Some((freq - 5000) / 5),
        58320..=70200 => Some((freq - 56160) / 2160),
        _ => None,
    }
}

/// Basic information about a network interface on a wiphy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IfaceInfo {
    pub ifindex: u32,
    pub name: String,
    pub wiphy: u32,
    pub wdev: Option<u64>,
    pub mac: Option<[u8; 6]>,
    pub iftype: InterfaceType,
    pub ssid: Option<Vec<u8>>,
    /// Operating channel, when the interface is up on one.
    pub channel: Option<ChannelDef>,
    /// Current transmit power in mBm.
    pub tx_power: Option<i32>,
    pub use_4addr: bool,
}

impl IfaceInfo {
    /// SSID as lossy UTF-8.
    pub fn ssid_str(&self) -> Option<String> {
        self.ssid
            .as_ref()
            .map(|s| String::from_utf8_lossy(s).into_owned())
    }
}

/// One channel of a band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelInfo {
    pub freq: u32,
    pub channel: Option<u32>,
    pub disabled: bool,
    pub no_ir: bool,
    pub radar: bool,
    pub dfs_state: Option<DfsState>,
    /// Milliseconds spent in the current DFS state.
    pub dfs_time: Option<u32>,
    pub dfs_cac_time: Option<u32>,
    /// Maximum transmit power in mBm.
    pub max_tx_power: Option<u32>,
}

/// Capabilities of one band.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BandInfo {
    pub band: WiphyBand,
    pub channels: Vec<ChannelInfo>,
    /// Bitrates in units of 100 kbps.
    pub bitrates: Vec<u32>,
    pub ht_capa: Option<u16>,
    pub ht_mcs_set: Option<Vec<u8>>,
    pub vht_capa: Option<u32>,
    pub vht_mcs_set: Option<Vec<u8>>,
}

impl BandInfo {
    pub fn new(band: WiphyBand) -> Self {
        Self {
            band,
            channels: Vec::new(),
            bitrates: Vec::new(),
            ht_capa: None,
            ht_mcs_set: None,
            vht_capa: None,
            vht_mcs_set: None,
        }
    }

    /// Find a channel by center frequency.
    pub fn channel(&self, freq: u32) -> Option<&ChannelInfo> {
        self.channels.iter().find(|c| c.freq == freq)
    }
}

/// Capabilities of a wireless physical device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WiphyInfo {
    pub id: u32,
    pub name: String,
    pub max_scan_ssids: Option<u8>,
    pub max_scan_ie_len: Option<u16>,
    pub iftypes: Vec<InterfaceType>,
    pub antenna_avail_tx: Option<u32>,
    pub antenna_avail_rx: Option<u32>,
    pub antenna_cfg_tx: Option<u32>,
    pub antenna_cfg_rx: Option<u32>,
    pub bands: Vec<BandInfo>,
    /// `NL80211_EXT_FEATURE_*` bitmap, byte-indexed.
    pub ext_features: Vec<u8>,
}

impl WiphyInfo {
    /// Number of available transmit chains.
    pub fn tx_chains(&self) -> u32 {
        self.antenna_avail_tx.map_or(0, u32::count_ones)
    }

    /// Number of available receive chains.
    pub fn rx_chains(&self) -> u32 {
        self.antenna_avail_rx.map_or(0, u32::count_ones)
    }

    pub fn band(&self, band: WiphyBand) -> Option<&BandInfo> {
        self.bands.iter().find(|b| b.band == band)
    }

    /// Whether the `NL80211_EXT_FEATURE_*` bit `feature` is set.
    pub fn has_ext_feature(&self, feature: u32) -> bool {
        let byte = (feature / 8) as usize;
        self.ext_features
            .get(byte)
            .is_some_and(|b| b & (1 << (feature % 8)) != 0)
    }

    pub fn supports_iftype(&self, iftype: InterfaceType) -> bool {
        self.iftypes.contains(&iftype)
    }
}

/// Bitrate description of a station's last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RateInfo {
    /// Bitrate in units of 100 kbps.
    pub bitrate: Option<u32>,
    pub mcs: Option<u8>,
    pub vht_mcs: Option<u8>,
    pub vht_nss: Option<u8>,
    pub short_gi: bool,
    pub width: Option<u32>,
}

/// Station flags (mask/set pairs reduced to the set bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StationFlags {
    pub authorized: bool,
    pub short_preamble: bool,
    pub wme: bool,
    pub mfp: bool,
    pub authenticated: bool,
    pub tdls_peer: bool,
    pub associated: bool,
}

/// Per-station counters and link state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StationInfo {
    pub mac: [u8; 6],
    pub ifindex: u32,
    pub inactive_time_ms: Option<u32>,
    pub connected_time_s: Option<u32>,
    pub rx_bytes: Option<u64>,
    pub tx_bytes: Option<u64>,
    pub rx_packets: Option<u32>,
    pub tx_packets: Option<u32>,
    pub tx_retries: Option<u32>,
    pub tx_failed: Option<u32>,
    /// Signal strength of the last frame, dBm.
    pub signal: Option<i8>,
    pub signal_avg: Option<i8>,
    pub tx_rate: Option<RateInfo>,
    pub rx_rate: Option<RateInfo>,
    pub flags: StationFlags,
}

/// Survey data for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelSurveyInfo {
    pub freq: u32,
    pub in_use: bool,
    /// Noise floor, dBm.
    pub noise: Option<i8>,
    /// Times in milliseconds.
    pub time: Option<u64>,
    pub time_busy: Option<u64>,
    pub time_ext_busy: Option<u64>,
    pub time_rx: Option<u64>,
    pub time_tx: Option<u64>,
    pub time_scan: Option<u64>,
}

impl ChannelSurveyInfo {
    /// Busy time as a percentage of active time.
    pub fn load(&self) -> Option<u32> {
        match (self.time, self.time_busy) {
            (Some(total), Some(busy)) if total > 0 => Some((busy * 100 / total) as u32),
            _ => None,
        }
    }
}

/// One BSS from the scan cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanResult {
    pub bssid: [u8; 6],
    pub freq: u32,
    pub tsf: Option<u64>,
    pub beacon_interval: Option<u16>,
    pub capability: Option<u16>,
    /// Signal strength in mBm.
    pub signal_mbm: Option<i32>,
    pub seen_ms_ago: Option<u32>,
    pub ssid: Option<Vec<u8>>,
    pub ies: Vec<u8>,
    pub associated: bool,
}

/// Transmit power setting of a wiphy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TxPowerSetting {
    /// Let the driver decide.
    Automatic,
    /// Limit to at most this many mBm.
    Limited(i32),
    /// Fix at this many mBm.
    Fixed(i32),
}

/// Scan trigger options. The default is an active wildcard scan on every
/// supported channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanParams {
    /// SSIDs to probe for. Empty probes the wildcard SSID.
    pub ssids: Vec<Vec<u8>>,
    /// Frequencies to scan; all when empty.
    pub freqs: Vec<u32>,
    /// Extra IEs appended to probe requests.
    pub ies: Vec<u8>,
    /// `NL80211_SCAN_FLAG_*` bits.
    pub flags: u32,
}

impl ScanParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ssid(mut self, ssid: impl Into<Vec<u8>>) -> Self {
        self.ssids.push(ssid.into());
        self
    }

    pub fn freq(mut self, freq: u32) -> Self {
        self.freqs.push(freq);
        self
    }

    pub fn ies(mut self, ies: impl Into<Vec<u8>>) -> Self {
        self.ies = ies.into();
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }
}

/// Management frame transmission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTx {
    pub frame: Vec<u8>,
    /// Off-channel frequency; the current channel when `None`.
    pub freq: Option<u32>,
    /// Off-channel dwell time in ms.
    pub duration: Option<u32>,
    pub no_ack: bool,
    pub offchannel_ok: bool,
}

impl FrameTx {
    pub fn new(frame: impl Into<Vec<u8>>) -> Self {
        Self {
            frame: frame.into(),
            freq: None,
            duration: None,
            no_ack: false,
            offchannel_ok: false,
        }
    }

    pub fn offchannel(mut self, freq: u32, duration_ms: u32) -> Self {
        self.freq = Some(freq);
        self.duration = Some(duration_ms);
        self.offchannel_ok = true;
        self
    }

    pub fn no_ack(mut self) -> Self {
        self.no_ack = true;
        self
    }
}

/// Format a MAC address as colon-separated hex.
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}
