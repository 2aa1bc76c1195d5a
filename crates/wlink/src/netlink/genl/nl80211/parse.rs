//! Attribute tree to read-model conversions.

use super::types::{
    BandInfo, ChannelDef, ChannelInfo, ChannelSurveyInfo, ChannelWidth, DfsState, IfaceInfo,
    InterfaceType, RateInfo, ScanResult, StationFlags, StationInfo, WiphyBand, WiphyInfo,
    freq_to_channel,
};
use super::{BandAttr, BssAttr, FreqAttr, Nl80211Attr, RateInfoAttr, StaInfoAttr, SurveyAttr, sta_flag};
use crate::netlink::attr::{AttrIter, AttrMap, get};
use crate::netlink::error::{Error, Result};

/// Extract the operating channel of an interface or event.
pub(crate) fn parse_chandef(attrs: &AttrMap<'_>) -> Option<ChannelDef> {
    let freq = attrs.u32(Nl80211Attr::WiphyFreq as u16)?;
    Some(ChannelDef {
        freq,
        width: attrs
            .u32(Nl80211Attr::ChannelWidth as u16)
            .map(ChannelWidth::from)
            .unwrap_or_default(),
        center_freq1: attrs.u32(Nl80211Attr::CenterFreq1 as u16),
        center_freq2: attrs.u32(Nl80211Attr::CenterFreq2 as u16),
    })
}

pub(crate) fn parse_iface(attrs: &AttrMap<'_>) -> Result<IfaceInfo> {
    let wiphy = attrs
        .u32(Nl80211Attr::Wiphy as u16)
        .ok_or_else(|| Error::InvalidMessage("interface without wiphy".into()))?;

    Ok(IfaceInfo {
        ifindex: attrs.u32(Nl80211Attr::Ifindex as u16).unwrap_or(0),
        name: attrs.string(Nl80211Attr::Ifname as u16).unwrap_or_default(),
        wiphy,
        wdev: attrs.u64(Nl80211Attr::Wdev as u16),
        mac: attrs.mac(Nl80211Attr::Mac as u16),
        iftype: attrs
            .u32(Nl80211Attr::Iftype as u16)
            .map(InterfaceType::from)
            .unwrap_or_default(),
        ssid: attrs.get(Nl80211Attr::Ssid as u16).map(<[u8]>::to_vec),
        channel: parse_chandef(attrs),
        tx_power: attrs.i32(Nl80211Attr::WiphyTxPowerLevel as u16),
        use_4addr: attrs.u8(Nl80211Attr::FourAddr as u16).unwrap_or(0) != 0,
    })
}

fn parse_channel(attrs: &AttrMap<'_>) -> Option<ChannelInfo> {
    let freq = attrs.u32(FreqAttr::Freq as u16)?;
    Some(ChannelInfo {
        freq,
        channel: freq_to_channel(freq),
        disabled: attrs.has(FreqAttr::Disabled as u16),
        no_ir: attrs.has(FreqAttr::NoIr as u16),
        radar: attrs.has(FreqAttr::Radar as u16),
        dfs_state: attrs.u32(FreqAttr::DfsState as u16).map(DfsState::from),
        dfs_time: attrs.u32(FreqAttr::DfsTime as u16),
        dfs_cac_time: attrs.u32(FreqAttr::DfsCacTime as u16),
        max_tx_power: attrs.u32(FreqAttr::MaxTxPower as u16),
    })
}

fn merge_band(band: &mut BandInfo, attrs: &AttrMap<'_>) {
    for (_idx, freq) in attrs.nested_iter(BandAttr::Freqs as u16) {
        if let Some(channel) = parse_channel(&AttrMap::parse(freq)) {
            band.channels.push(channel);
        }
    }
    for (_idx, rate) in attrs.nested_iter(BandAttr::Rates as u16) {
        // NL80211_BITRATE_ATTR_RATE = 1
        if let Some(rate) = AttrMap::parse(rate).u32(1) {
            band.bitrates.push(rate);
        }
    }
    if let Some(capa) = attrs.u16(BandAttr::HtCapa as u16) {
        band.ht_capa = Some(capa);
    }
    if let Some(set) = attrs.get(BandAttr::HtMcsSet as u16) {
        band.ht_mcs_set = Some(set.to_vec());
    }
    if let Some(capa) = attrs.u32(BandAttr::VhtCapa as u16) {
        band.vht_capa = Some(capa);
    }
    if let Some(set) = attrs.get(BandAttr::VhtMcsSet as u16) {
        band.vht_mcs_set = Some(set.to_vec());
    }
}

/// Fold one message of a (possibly split) wiphy dump into `info`.
///
/// Later parts extend the band and channel lists of earlier ones; scalar
/// attributes take the value of the last part carrying them.
pub(crate) fn merge_wiphy(info: &mut WiphyInfo, attrs: &AttrMap<'_>) {
    if let Some(id) = attrs.u32(Nl80211Attr::Wiphy as u16) {
        info.id = id;
    }
    if let Some(name) = attrs.string(Nl80211Attr::WiphyName as u16) {
        info.name = name;
    }
    if let Some(n) = attrs.u8(Nl80211Attr::MaxNumScanSsids as u16) {
        info.max_scan_ssids = Some(n);
    }
    if let Some(n) = attrs.u16(Nl80211Attr::MaxScanIeLen as u16) {
        info.max_scan_ie_len = Some(n);
    }
    if let Some(v) = attrs.u32(Nl80211Attr::WiphyAntennaAvailTx as u16) {
        info.antenna_avail_tx = Some(v);
    }
    if let Some(v) = attrs.u32(Nl80211Attr::WiphyAntennaAvailRx as u16) {
        info.antenna_avail_rx = Some(v);
    }
    if let Some(v) = attrs.u32(Nl80211Attr::WiphyAntennaTx as u16) {
        info.antenna_cfg_tx = Some(v);
    }
    if let Some(v) = attrs.u32(Nl80211Attr::WiphyAntennaRx as u16) {
        info.antenna_cfg_rx = Some(v);
    }
    if attrs.has(Nl80211Attr::SupportedIftypes as u16) {
        // flag attributes whose type is the iftype number
        info.iftypes = attrs
            .nested_iter(Nl80211Attr::SupportedIftypes as u16)
            .map(|(kind, _)| InterfaceType::from(kind as u32))
            .collect();
    }
    if let Some(bits) = attrs.get(Nl80211Attr::ExtFeatures as u16) {
        info.ext_features = bits.to_vec();
    }

    for (index, band_data) in attrs.nested_iter(Nl80211Attr::WiphyBands as u16) {
        let band_id = WiphyBand::from(index);
        let pos = match info.bands.iter().position(|b| b.band == band_id) {
            Some(pos) => pos,
            None => {
                info.bands.push(BandInfo::new(band_id));
                info.bands.len() - 1
            }
        };
        merge_band(&mut info.bands[pos], &AttrMap::parse(band_data));
    }
}

pub(crate) fn parse_rate(attrs: &AttrMap<'_>) -> RateInfo {
    let width = if attrs.has(RateInfoAttr::Width160 as u16) {
        Some(160)
    } else if attrs.has(RateInfoAttr::Width80p80 as u16) || attrs.has(RateInfoAttr::Width80 as u16)
    {
        Some(80)
    } else if attrs.has(RateInfoAttr::Width40 as u16) {
        Some(40)
    } else {
        None
    };

    RateInfo {
        bitrate: attrs
            .u32(RateInfoAttr::Bitrate32 as u16)
            .or_else(|| attrs.u16(RateInfoAttr::Bitrate as u16).map(u32::from)),
        mcs: attrs.u8(RateInfoAttr::Mcs as u16),
        vht_mcs: attrs.u8(RateInfoAttr::VhtMcs as u16),
        vht_nss: attrs.u8(RateInfoAttr::VhtNss as u16),
        short_gi: attrs.has(RateInfoAttr::ShortGi as u16),
        width,
    }
}

fn parse_sta_flags(data: &[u8]) -> StationFlags {
    // struct nl80211_sta_flag_update { u32 mask; u32 set; }
    let set = data.get(4..).and_then(|d| get::u32_ne(d).ok()).unwrap_or(0);
    let bit = |n: u32| set & (1 << n) != 0;
    StationFlags {
        authorized: bit(sta_flag::AUTHORIZED),
        short_preamble: bit(sta_flag::SHORT_PREAMBLE),
        wme: bit(sta_flag::WME),
        mfp: bit(sta_flag::MFP),
        authenticated: bit(sta_flag::AUTHENTICATED),
        tdls_peer: bit(sta_flag::TDLS_PEER),
        associated: bit(sta_flag::ASSOCIATED),
    }
}

pub(crate) fn parse_station(attrs: &AttrMap<'_>) -> Result<StationInfo> {
    let mac = attrs
        .mac(Nl80211Attr::Mac as u16)
        .ok_or_else(|| Error::InvalidMessage("station without MAC".into()))?;
    let sta = attrs
        .nested(Nl80211Attr::StaInfo as u16)
        .unwrap_or_default();

    Ok(StationInfo {
        mac,
        ifindex: attrs.u32(Nl80211Attr::Ifindex as u16).unwrap_or(0),
        inactive_time_ms: sta.u32(StaInfoAttr::InactiveTime as u16),
        connected_time_s: sta.u32(StaInfoAttr::ConnectedTime as u16),
        rx_bytes: sta
            .u64(StaInfoAttr::RxBytes64 as u16)
            .or_else(|| sta.u32(StaInfoAttr::RxBytes as u16).map(u64::from)),
        tx_bytes: sta
            .u64(StaInfoAttr::TxBytes64 as u16)
            .or_else(|| sta.u32(StaInfoAttr::TxBytes as u16).map(u64::from)),
        rx_packets: sta.u32(StaInfoAttr::RxPackets as u16),
        tx_packets: sta.u32(StaInfoAttr::TxPackets as u16),
        tx_retries: sta.u32(StaInfoAttr::TxRetries as u16),
        tx_failed: sta.u32(StaInfoAttr::TxFailed as u16),
        signal: sta.i8(StaInfoAttr::Signal as u16),
        signal_avg: sta.i8(StaInfoAttr::SignalAvg as u16),
        tx_rate: sta
            .nested(StaInfoAttr::TxBitrate as u16)
            .map(|r| parse_rate(&r)),
        rx_rate: sta
            .nested(StaInfoAttr::RxBitrate as u16)
            .map(|r| parse_rate(&r)),
        flags: sta
            .get(StaInfoAttr::StaFlags as u16)
            .map(parse_sta_flags)
            .unwrap_or_default(),
    })
}

/// Parse one survey entry. Entries without a frequency are skipped.
pub(crate) fn parse_survey(attrs: &AttrMap<'_>) -> Option<ChannelSurveyInfo> {
    let survey = attrs.nested(Nl80211Attr::SurveyInfo as u16)?;
    Some(ChannelSurveyInfo {
        freq: survey.u32(SurveyAttr::Frequency as u16)?,
        in_use: survey.has(SurveyAttr::InUse as u16),
        noise: survey.i8(SurveyAttr::Noise as u16),
        time: survey.u64(SurveyAttr::Time as u16),
        time_busy: survey.u64(SurveyAttr::TimeBusy as u16),
        time_ext_busy: survey.u64(SurveyAttr::TimeExtBusy as u16),
        time_rx: survey.u64(SurveyAttr::TimeRx as u16),
        time_tx: survey.u64(SurveyAttr::TimeTx as u16),
        time_scan: survey.u64(SurveyAttr::TimeScan as u16),
    })
}

/// Find the SSID element (id 0) in a run of information elements.
pub(crate) fn ssid_from_ies(ies: &[u8]) -> Option<Vec<u8>> {
    let mut rest = ies;
    while rest.len() >= 2 {
        let (id, len) = (rest[0], rest[1] as usize);
        let body = rest.get(2..2 + len)?;
        if id == 0 {
            return Some(body.to_vec());
        }
        rest = &rest[2 + len..];
    }
    None
}

pub(crate) fn parse_bss(attrs: &AttrMap<'_>) -> Option<ScanResult> {
    let bss = attrs.nested(Nl80211Attr::Bss as u16)?;
    let ies = bss
        .get(BssAttr::InformationElements as u16)
        .unwrap_or(&[])
        .to_vec();
    Some(ScanResult {
        bssid: bss.mac(BssAttr::Bssid as u16)?,
        freq: bss.u32(BssAttr::Frequency as u16).unwrap_or(0),
        tsf: bss.u64(BssAttr::Tsf as u16),
        beacon_interval: bss.u16(BssAttr::BeaconInterval as u16),
        capability: bss.u16(BssAttr::Capability as u16),
        signal_mbm: bss.i32(BssAttr::SignalMbm as u16),
        seen_ms_ago: bss.u32(BssAttr::SeenMsAgo as u16),
        ssid: ssid_from_ies(&ies),
        ies,
        // NL80211_BSS_STATUS_ASSOCIATED = 1
        associated: bss.u32(BssAttr::Status as u16) == Some(1),
    })
}

/// Collect every `NL80211_ATTR_VENDOR_DATA` payload of a message.
///
/// The attribute may legitimately repeat, so this walks the raw buffer
/// instead of the last-wins index.
pub(crate) fn vendor_payloads(payload: &[u8]) -> Vec<Vec<u8>> {
    AttrIter::new(payload)
        .filter(|(kind, _)| *kind == Nl80211Attr::VendorData as u16)
        .map(|(_, data)| data.to_vec())
        .collect()
}
