//! High-level nl80211 operations on a [`SocketManager`].
//!
//! Getters and setters await their reply with the sync budget. Scan control
//! and the async vendor command hand back a [`Reply`] instead.

use std::collections::BTreeMap;

use super::manager::SocketManager;
use super::parse::{merge_wiphy, parse_bss, parse_iface, parse_station, parse_survey};
use super::request::{Ack, Collect, HandlerStatus, Reply, ReplyHandler, Request};
use super::types::{
    ChannelDef, ChannelSurveyInfo, FrameTx, IfaceInfo, InterfaceType, ScanParams, ScanResult,
    StationInfo, TxPowerSetting, WiphyInfo, format_mac,
};
use super::vendor::{VendorData, VendorReply, vendor_attrs};
use super::{Nl80211Attr, Nl80211Cmd, tx_power};
use crate::netlink::builder::AttrList;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::GenlMessage;

/// Folds a (split) wiphy dump into one record per wiphy.
#[derive(Debug, Default)]
struct WiphyDump {
    wiphys: BTreeMap<u32, WiphyInfo>,
}

impl ReplyHandler for WiphyDump {
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus {
        let attrs = msg.attrs();
        let Some(id) = attrs.u32(Nl80211Attr::Wiphy as u16) else {
            return HandlerStatus::Continue;
        };
        let info = self.wiphys.entry(id).or_default();
        merge_wiphy(info, &attrs);
        HandlerStatus::Ok
    }
}

/// Attributes describing a channel definition.
pub(crate) fn chandef_attrs(chandef: &ChannelDef) -> AttrList {
    let mut attrs = AttrList::new()
        .u32(Nl80211Attr::WiphyFreq as u16, chandef.freq)
        .u32(Nl80211Attr::ChannelWidth as u16, chandef.width.as_u32());
    if let Some(freq) = chandef.center_freq1 {
        attrs = attrs.u32(Nl80211Attr::CenterFreq1 as u16, freq);
    }
    if let Some(freq) = chandef.center_freq2 {
        attrs = attrs.u32(Nl80211Attr::CenterFreq2 as u16, freq);
    }
    attrs
}

fn scan_attrs(params: &ScanParams) -> AttrList {
    let mut attrs = AttrList::new();
    // an empty SSID is the wildcard
    let ssids = if params.ssids.is_empty() {
        AttrList::new().bytes(1, Vec::new())
    } else {
        params
            .ssids
            .iter()
            .enumerate()
            .fold(AttrList::new(), |list, (i, ssid)| list.bytes(i as u16 + 1, ssid.clone()))
    };
    attrs = attrs.nested(Nl80211Attr::ScanSsids as u16, ssids);
    if !params.freqs.is_empty() {
        let freqs = params
            .freqs
            .iter()
            .enumerate()
            .fold(AttrList::new(), |list, (i, freq)| list.u32(i as u16 + 1, *freq));
        attrs = attrs.nested(Nl80211Attr::ScanFrequencies as u16, freqs);
    }
    if !params.ies.is_empty() {
        attrs = attrs.bytes(Nl80211Attr::Ie as u16, params.ies.clone());
    }
    if params.flags != 0 {
        attrs = attrs.u32(Nl80211Attr::ScanFlags as u16, params.flags);
    }
    attrs
}

fn valid_alpha2(alpha2: &str) -> bool {
    alpha2 == "00" || (alpha2.len() == 2 && alpha2.bytes().all(|b| b.is_ascii_alphabetic()))
}

impl SocketManager {
    // ========================================================================
    // Interfaces
    // ========================================================================

    /// Get information about one interface.
    ///
    /// A non-wireless or unknown `ifindex` fails with the kernel's error
    /// (typically `ENODEV`).
    pub async fn get_interface_info(&self, ifindex: u32) -> Result<IfaceInfo> {
        let handler = Collect::new(|msg: &GenlMessage<'_>| parse_iface(&msg.attrs()).map(Some));
        let req = Request::new(Nl80211Cmd::GetInterface).ifindex(ifindex);
        self.send_sync(req, handler)
            .await
            .map_err(|e| e.with_context(format!("get interface {ifindex}")))?
            .into_items()
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidMessage(format!("no interface data for {ifindex}")))
    }

    /// Get every wireless interface.
    pub async fn get_all_interfaces(&self) -> Result<Vec<IfaceInfo>> {
        let handler = Collect::new(|msg: &GenlMessage<'_>| Ok(parse_iface(&msg.attrs()).ok()));
        let req = Request::new(Nl80211Cmd::GetInterface).dump();
        Ok(self.send_sync(req, handler).await?.into_items())
    }

    /// Current transmit power of an interface, in mBm.
    pub async fn get_tx_power(&self, ifindex: u32) -> Result<Option<i32>> {
        Ok(self.get_interface_info(ifindex).await?.tx_power)
    }

    pub async fn set_interface_type(&self, ifindex: u32, iftype: InterfaceType) -> Result<()> {
        let req = Request::new(Nl80211Cmd::SetInterface)
            .ifindex(ifindex)
            .attrs(AttrList::new().u32(Nl80211Attr::Iftype as u16, iftype.as_u32()));
        self.send_sync(req, Ack)
            .await
            .map_err(|e| e.with_context(format!("set interface {ifindex} type {iftype}")))?;
        Ok(())
    }

    /// Enable or disable 4-address (WDS) frames on an interface.
    pub async fn set_4addr(&self, ifindex: u32, enabled: bool) -> Result<()> {
        let req = Request::new(Nl80211Cmd::SetInterface)
            .ifindex(ifindex)
            .attrs(AttrList::new().u8(Nl80211Attr::FourAddr as u16, u8::from(enabled)));
        self.send_sync(req, Ack)
            .await
            .map_err(|e| e.with_context(format!("set interface {ifindex} 4addr")))?;
        Ok(())
    }

    // ========================================================================
    // Wiphys
    // ========================================================================

    /// Get the capabilities of one wiphy, merged from a split dump.
    pub async fn get_wiphy_info(&self, wiphy: u32) -> Result<WiphyInfo> {
        let req = Request::new(Nl80211Cmd::GetWiphy).dump().attrs(
            AttrList::new()
                .u32(Nl80211Attr::Wiphy as u16, wiphy)
                .flag(Nl80211Attr::SplitWiphyDump as u16),
        );
        let mut dump = self
            .send_sync(req, WiphyDump::default())
            .await
            .map_err(|e| e.with_context(format!("get wiphy {wiphy}")))?;
        dump.wiphys
            .remove(&wiphy)
            .ok_or_else(|| Error::from_errno_with_context(-libc::ENODEV, format!("get wiphy {wiphy}")))
    }

    /// Get the capabilities of every wiphy, ordered by index.
    pub async fn get_all_wiphy_info(&self) -> Result<Vec<WiphyInfo>> {
        let req = Request::new(Nl80211Cmd::GetWiphy)
            .dump()
            .attrs(AttrList::new().flag(Nl80211Attr::SplitWiphyDump as u16));
        let dump = self.send_sync(req, WiphyDump::default()).await?;
        Ok(dump.wiphys.into_values().collect())
    }

    /// Select the antennas a wiphy uses. Masks must be non-zero.
    pub async fn set_antennas(&self, wiphy: u32, tx_mask: u32, rx_mask: u32) -> Result<()> {
        if tx_mask == 0 || rx_mask == 0 {
            return Err(Error::InvalidParam("antenna masks must be non-zero".into()));
        }
        let req = Request::new(Nl80211Cmd::SetWiphy).attrs(
            AttrList::new()
                .u32(Nl80211Attr::Wiphy as u16, wiphy)
                .u32(Nl80211Attr::WiphyAntennaTx as u16, tx_mask)
                .u32(Nl80211Attr::WiphyAntennaRx as u16, rx_mask),
        );
        self.send_sync(req, Ack)
            .await
            .map_err(|e| e.with_context(format!("set wiphy {wiphy} antennas")))?;
        Ok(())
    }

    pub async fn set_tx_power(&self, wiphy: u32, setting: TxPowerSetting) -> Result<()> {
        let mut attrs = AttrList::new().u32(Nl80211Attr::Wiphy as u16, wiphy);
        attrs = match setting {
            TxPowerSetting::Automatic => {
                attrs.u32(Nl80211Attr::WiphyTxPowerSetting as u16, tx_power::AUTOMATIC)
            }
            TxPowerSetting::Limited(mbm) => attrs
                .u32(Nl80211Attr::WiphyTxPowerSetting as u16, tx_power::LIMITED)
                .i32(Nl80211Attr::WiphyTxPowerLevel as u16, mbm),
            TxPowerSetting::Fixed(mbm) => attrs
                .u32(Nl80211Attr::WiphyTxPowerSetting as u16, tx_power::FIXED)
                .i32(Nl80211Attr::WiphyTxPowerLevel as u16, mbm),
        };
        let req = Request::new(Nl80211Cmd::SetWiphy).attrs(attrs);
        self.send_sync(req, Ack)
            .await
            .map_err(|e| e.with_context(format!("set wiphy {wiphy} tx power")))?;
        Ok(())
    }

    /// Request a regulatory domain change (`"US"`, `"DE"`, `"00"` for world).
    pub async fn set_regulatory_domain(&self, alpha2: &str) -> Result<()> {
        if !valid_alpha2(alpha2) {
            return Err(Error::InvalidParam(format!(
                "invalid regulatory domain: {alpha2:?}"
            )));
        }
        let req = Request::new(Nl80211Cmd::ReqSetReg).attrs(
            AttrList::new().string(Nl80211Attr::RegAlpha2 as u16, alpha2.to_ascii_uppercase()),
        );
        self.send_sync(req, Ack)
            .await
            .map_err(|e| e.with_context(format!("set regulatory domain {alpha2}")))?;
        Ok(())
    }

    /// Start a CAC on the background radar chain.
    pub async fn start_background_dfs(&self, ifindex: u32, chandef: ChannelDef) -> Result<()> {
        let req = Request::new(Nl80211Cmd::RadarDetect)
            .ifindex(ifindex)
            .attrs(chandef_attrs(&chandef).flag(Nl80211Attr::RadarBackground as u16));
        self.send_sync(req, Ack).await.map_err(|e| {
            e.with_context(format!("start background dfs on {} MHz", chandef.freq))
        })?;
        Ok(())
    }

    /// Stop the background radar chain.
    pub async fn stop_background_dfs(&self, ifindex: u32) -> Result<()> {
        let req = Request::new(Nl80211Cmd::RadarDetect)
            .ifindex(ifindex)
            .attrs(AttrList::new().flag(Nl80211Attr::RadarBackground as u16));
        self.send_sync(req, Ack)
            .await
            .map_err(|e| e.with_context("stop background dfs"))?;
        Ok(())
    }

    // ========================================================================
    // Stations, survey, scan cache
    // ========================================================================

    pub async fn get_station_info(&self, ifindex: u32, mac: [u8; 6]) -> Result<StationInfo> {
        let handler =
            Collect::new(|msg: &GenlMessage<'_>| parse_station(&msg.attrs()).map(Some));
        let req = Request::new(Nl80211Cmd::GetStation)
            .ifindex(ifindex)
            .attrs(AttrList::new().bytes(Nl80211Attr::Mac as u16, mac));
        self.send_sync(req, handler)
            .await
            .map_err(|e| e.with_context(format!("get station {}", format_mac(&mac))))?
            .into_items()
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidMessage("no station data".into()))
    }

    /// Every station associated with an interface.
    pub async fn get_all_stations(&self, ifindex: u32) -> Result<Vec<StationInfo>> {
        let handler =
            Collect::new(|msg: &GenlMessage<'_>| Ok(parse_station(&msg.attrs()).ok()));
        let req = Request::new(Nl80211Cmd::GetStation).ifindex(ifindex).dump();
        Ok(self.send_sync(req, handler).await?.into_items())
    }

    /// Channel survey of an interface's radio.
    pub async fn get_survey_info(&self, ifindex: u32) -> Result<Vec<ChannelSurveyInfo>> {
        let handler = Collect::new(|msg: &GenlMessage<'_>| Ok(parse_survey(&msg.attrs())));
        let req = Request::new(Nl80211Cmd::GetSurvey).ifindex(ifindex);
        Ok(self.send_sync(req, handler).await?.into_items())
    }

    /// BSSs in the kernel's scan cache.
    pub async fn get_scan_results(&self, ifindex: u32) -> Result<Vec<ScanResult>> {
        let handler = Collect::new(|msg: &GenlMessage<'_>| Ok(parse_bss(&msg.attrs())));
        let req = Request::new(Nl80211Cmd::GetScan).ifindex(ifindex);
        Ok(self.send_sync(req, handler).await?.into_items())
    }

    // ========================================================================
    // Scan control
    // ========================================================================

    /// Trigger a scan. The reply resolves when the kernel accepted it;
    /// completion arrives as a scan-done event.
    pub fn start_scan(&self, ifindex: u32, params: &ScanParams) -> Result<Reply<Ack>> {
        let req = Request::new(Nl80211Cmd::TriggerScan)
            .ifindex(ifindex)
            .attrs(scan_attrs(params));
        self.send_async(req, Ack)
    }

    pub fn abort_scan(&self, ifindex: u32) -> Result<Reply<Ack>> {
        self.send_async(Request::new(Nl80211Cmd::AbortScan).ifindex(ifindex), Ack)
    }

    // ========================================================================
    // Vendor commands and frames
    // ========================================================================

    /// Run a vendor command and collect every vendor data payload of the
    /// reply.
    pub async fn send_vendor_cmd(
        &self,
        ifindex: u32,
        oui: u32,
        subcmd: u32,
        data: Option<VendorData>,
    ) -> Result<Vec<Vec<u8>>> {
        let req = Request::new(Nl80211Cmd::Vendor)
            .ifindex(ifindex)
            .attrs(vendor_attrs(oui, subcmd, data));
        let reply = self
            .send_sync(req, VendorReply::default())
            .await
            .map_err(|e| e.with_context(format!("vendor command {oui:06x}/{subcmd}")))?;
        Ok(reply.into_payloads())
    }

    pub fn send_vendor_cmd_async(
        &self,
        ifindex: u32,
        oui: u32,
        subcmd: u32,
        data: Option<VendorData>,
    ) -> Result<Reply<VendorReply>> {
        let req = Request::new(Nl80211Cmd::Vendor)
            .ifindex(ifindex)
            .attrs(vendor_attrs(oui, subcmd, data));
        self.send_async(req, VendorReply::default())
    }

    /// Transmit a management frame. Returns the cookie the matching
    /// tx-status event carries.
    pub async fn send_mgmt_frame(&self, ifindex: u32, frame: &FrameTx) -> Result<u64> {
        if frame.frame.is_empty() {
            return Err(Error::InvalidParam("empty management frame".into()));
        }
        let mut attrs = AttrList::new().bytes(Nl80211Attr::Frame as u16, frame.frame.clone());
        if let Some(freq) = frame.freq {
            attrs = attrs.u32(Nl80211Attr::WiphyFreq as u16, freq);
        }
        if let Some(duration) = frame.duration {
            attrs = attrs.u32(Nl80211Attr::Duration as u16, duration);
        }
        if frame.offchannel_ok {
            attrs = attrs.flag(Nl80211Attr::OffchannelTxOk as u16);
        }
        if frame.no_ack {
            attrs = attrs.flag(Nl80211Attr::DontWaitForAck as u16);
        }

        let handler =
            Collect::new(|msg: &GenlMessage<'_>| Ok(msg.attrs().u64(Nl80211Attr::Cookie as u16)));
        let req = Request::new(Nl80211Cmd::Frame).ifindex(ifindex).attrs(attrs);
        self.send_sync(req, handler)
            .await
            .map_err(|e| e.with_context(format!("send frame on {ifindex}")))?
            .into_items()
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidMessage("frame reply without cookie".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::netlink::attr::AttrMap;
    use crate::netlink::genl::nl80211::fixtures::{self, MockTransport};
    use crate::netlink::genl::nl80211::manager::ManagerConfig;
    use crate::netlink::genl::nl80211::types::{
        BandInfo, ChannelInfo, ChannelWidth, DfsState, WiphyBand, freq_to_channel,
    };
    use crate::netlink::genl::nl80211::{BandAttr, StaInfoAttr, SurveyAttr, scan_flag};
    use crate::netlink::message::{NLM_F_DUMP, NLM_F_MULTI};

    fn manager(transport: &Arc<MockTransport>) -> SocketManager {
        SocketManager::with_transport(
            transport.clone(),
            fixtures::FAMILY,
            ManagerConfig::default(),
        )
        .unwrap()
    }

    fn channel(freq: u32) -> ChannelInfo {
        ChannelInfo {
            freq,
            channel: freq_to_channel(freq),
            max_tx_power: Some(2000),
            ..Default::default()
        }
    }

    fn sample_wiphy() -> WiphyInfo {
        let mut band2 = BandInfo::new(WiphyBand::Ghz2);
        band2.channels = vec![channel(2412), channel(2437), channel(2462)];
        band2.bitrates = vec![10, 20, 55, 110];
        band2.ht_capa = Some(0x1ef);

        let mut band5 = BandInfo::new(WiphyBand::Ghz5);
        band5.channels = vec![
            channel(5180),
            ChannelInfo {
                radar: true,
                no_ir: true,
                dfs_state: Some(DfsState::Usable),
                dfs_time: Some(1200),
                dfs_cac_time: Some(60_000),
                ..channel(5500)
            },
            ChannelInfo {
                disabled: true,
                ..channel(5865)
            },
        ];
        band5.vht_capa = Some(0x339071b2);
        band5.vht_mcs_set = Some(vec![0xfa, 0xff, 0, 0, 0xfa, 0xff, 0, 0]);

        WiphyInfo {
            id: 0,
            name: "phy0".into(),
            max_scan_ssids: Some(4),
            max_scan_ie_len: Some(2257),
            iftypes: vec![InterfaceType::Station, InterfaceType::Ap, InterfaceType::Monitor],
            antenna_avail_tx: Some(0b11),
            antenna_avail_rx: Some(0b111),
            antenna_cfg_tx: Some(0b01),
            antenna_cfg_rx: Some(0b011),
            bands: vec![band2, band5],
            ext_features: vec![0x08, 0x00, 0x41],
        }
    }

    #[tokio::test]
    async fn test_wiphy_round_trip() {
        let expected = sample_wiphy();
        let attrs = fixtures::wiphy_attrs(&expected);
        let transport = MockTransport::new();
        transport.respond(move |req| {
            assert_eq!(req.flags & NLM_F_DUMP, NLM_F_DUMP);
            assert!(req.attrs().has(Nl80211Attr::SplitWiphyDump as u16));
            vec![
                fixtures::genl_msg(req.seq, NLM_F_MULTI, Nl80211Cmd::NewWiphy as u8, &attrs),
                fixtures::done(req.seq),
            ]
        });
        let mgr = manager(&transport);

        let info = mgr.get_wiphy_info(0).await.unwrap();
        assert_eq!(info, expected);
        assert_eq!(info.tx_chains(), 2);
        assert_eq!(info.rx_chains(), 3);
        assert_eq!(info.band(WiphyBand::Ghz5).unwrap().channels.len(), 3);
    }

    #[tokio::test]
    async fn test_split_wiphy_dump_is_merged() {
        let transport = MockTransport::new();
        transport.respond(|req| {
            let parts = [
                AttrList::new()
                    .u32(Nl80211Attr::Wiphy as u16, 1)
                    .string(Nl80211Attr::WiphyName as u16, "phy1"),
                AttrList::new().u32(Nl80211Attr::Wiphy as u16, 1).nested(
                    Nl80211Attr::WiphyBands as u16,
                    AttrList::new().nested(
                        0,
                        AttrList::new().nested(
                            BandAttr::Freqs as u16,
                            AttrList::new().nested(0, AttrList::new().u32(1, 2412)),
                        ),
                    ),
                ),
                AttrList::new().u32(Nl80211Attr::Wiphy as u16, 1).nested(
                    Nl80211Attr::WiphyBands as u16,
                    AttrList::new().nested(
                        0,
                        AttrList::new().nested(
                            BandAttr::Freqs as u16,
                            AttrList::new().nested(1, AttrList::new().u32(1, 2417)),
                        ),
                    ),
                ),
            ];
            let mut out: Vec<Vec<u8>> = parts
                .iter()
                .map(|p| fixtures::genl_msg(req.seq, NLM_F_MULTI, Nl80211Cmd::NewWiphy as u8, p))
                .collect();
            out.push(fixtures::done(req.seq));
            out
        });
        let mgr = manager(&transport);

        let wiphys = mgr.get_all_wiphy_info().await.unwrap();
        assert_eq!(wiphys.len(), 1);
        assert_eq!(wiphys[0].name, "phy1");
        let freqs: Vec<u32> = wiphys[0].bands[0].channels.iter().map(|c| c.freq).collect();
        assert_eq!(freqs, vec![2412, 2417]);
    }

    #[tokio::test]
    async fn test_unknown_wiphy_is_enodev() {
        let transport = MockTransport::new();
        transport.respond(|req| vec![fixtures::done(req.seq)]);
        let mgr = manager(&transport);

        let err = mgr.get_wiphy_info(9).await.unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENODEV));
        assert!(err.to_string().contains("get wiphy 9"));
    }

    #[tokio::test]
    async fn test_get_interface_info() {
        let transport = MockTransport::new();
        transport.respond(|req| {
            assert_eq!(req.cmd, Nl80211Cmd::GetInterface as u8);
            let ifindex = req.attrs().u32(Nl80211Attr::Ifindex as u16).unwrap();
            vec![
                fixtures::genl_msg(
                    req.seq,
                    0,
                    Nl80211Cmd::NewInterface as u8,
                    &AttrList::new()
                        .u32(Nl80211Attr::Ifindex as u16, ifindex)
                        .string(Nl80211Attr::Ifname as u16, "wlan0")
                        .u32(Nl80211Attr::Wiphy as u16, 0)
                        .u32(Nl80211Attr::Iftype as u16, 2)
                        .i32(Nl80211Attr::WiphyTxPowerLevel as u16, 2200),
                ),
                fixtures::ack(req.seq),
            ]
        });
        let mgr = manager(&transport);

        let iface = mgr.get_interface_info(4).await.unwrap();
        assert_eq!(iface.ifindex, 4);
        assert_eq!(iface.name, "wlan0");
        assert_eq!(iface.iftype, InterfaceType::Station);
        assert_eq!(mgr.get_tx_power(4).await.unwrap(), Some(2200));
    }

    #[tokio::test]
    async fn test_non_wireless_interface_fails_with_kernel_error() {
        let transport = MockTransport::new();
        transport.respond(|req| vec![fixtures::error(req.seq, -libc::ENODEV)]);
        let mgr = manager(&transport);

        let err = mgr.get_interface_info(1).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("get interface 1"));
    }

    #[tokio::test]
    async fn test_station_and_survey_dumps() {
        let transport = MockTransport::new();
        transport.respond(|req| {
            let body = if req.cmd == Nl80211Cmd::GetStation as u8 {
                AttrList::new()
                    .u32(Nl80211Attr::Ifindex as u16, 3)
                    .bytes(Nl80211Attr::Mac as u16, [2, 0, 0, 0, 0, 1])
                    .nested(
                        Nl80211Attr::StaInfo as u16,
                        AttrList::new()
                            .u8(StaInfoAttr::Signal as u16, (-52i8) as u8)
                            .u64(StaInfoAttr::RxBytes64 as u16, 4096),
                    )
            } else {
                AttrList::new().u32(Nl80211Attr::Ifindex as u16, 3).nested(
                    Nl80211Attr::SurveyInfo as u16,
                    AttrList::new()
                        .u32(SurveyAttr::Frequency as u16, 2412)
                        .u8(SurveyAttr::Noise as u16, (-95i8) as u8)
                        .flag(SurveyAttr::InUse as u16),
                )
            };
            vec![
                fixtures::genl_msg(req.seq, NLM_F_MULTI, 0x13, &body),
                fixtures::done(req.seq),
            ]
        });
        let mgr = manager(&transport);

        let stations = mgr.get_all_stations(3).await.unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].signal, Some(-52));
        assert_eq!(stations[0].rx_bytes, Some(4096));

        let survey = mgr.get_survey_info(3).await.unwrap();
        assert_eq!(survey.len(), 1);
        assert!(survey[0].in_use);
        assert_eq!(survey[0].noise, Some(-95));

        let sent = transport.sent();
        assert_eq!(sent[0].flags & NLM_F_DUMP, NLM_F_DUMP);
        assert_eq!(sent[1].cmd, Nl80211Cmd::GetSurvey as u8);
        assert_eq!(sent[1].flags & NLM_F_DUMP, NLM_F_DUMP);
    }

    #[tokio::test]
    async fn test_setters_encode_attributes() {
        let transport = MockTransport::new();
        transport.respond(|req| vec![fixtures::ack(req.seq)]);
        let mgr = manager(&transport);

        mgr.set_interface_type(3, InterfaceType::Monitor).await.unwrap();
        mgr.set_4addr(3, true).await.unwrap();
        mgr.set_antennas(0, 0b11, 0b01).await.unwrap();
        mgr.set_tx_power(0, TxPowerSetting::Fixed(1500)).await.unwrap();
        mgr.set_tx_power(0, TxPowerSetting::Automatic).await.unwrap();
        mgr.set_regulatory_domain("de").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].attrs().u32(Nl80211Attr::Iftype as u16), Some(6));
        assert_eq!(sent[1].attrs().u8(Nl80211Attr::FourAddr as u16), Some(1));
        assert_eq!(sent[2].attrs().u32(Nl80211Attr::WiphyAntennaTx as u16), Some(0b11));
        assert_eq!(sent[2].attrs().u32(Nl80211Attr::WiphyAntennaRx as u16), Some(0b01));
        assert_eq!(
            sent[3].attrs().u32(Nl80211Attr::WiphyTxPowerSetting as u16),
            Some(tx_power::FIXED)
        );
        assert_eq!(sent[3].attrs().i32(Nl80211Attr::WiphyTxPowerLevel as u16), Some(1500));
        assert!(!sent[4].attrs().has(Nl80211Attr::WiphyTxPowerLevel as u16));
        assert_eq!(
            sent[5].attrs().string(Nl80211Attr::RegAlpha2 as u16).as_deref(),
            Some("DE")
        );
        assert_eq!(mgr.stats().req_success, 6);
    }

    #[tokio::test]
    async fn test_setter_validation() {
        let transport = MockTransport::new();
        let mgr = manager(&transport);

        for alpha2 in ["", "D", "DEU", "1A", "ü"] {
            assert!(matches!(
                mgr.set_regulatory_domain(alpha2).await,
                Err(Error::InvalidParam(_))
            ));
        }
        assert!(matches!(mgr.set_antennas(0, 0, 1).await, Err(Error::InvalidParam(_))));
        assert!(matches!(
            mgr.send_mgmt_frame(3, &FrameTx::new(Vec::new())).await,
            Err(Error::InvalidParam(_))
        ));
        assert!(transport.sent().is_empty());
        assert!(valid_alpha2("00"));
    }

    #[tokio::test]
    async fn test_background_dfs() {
        let transport = MockTransport::new();
        transport.respond(|req| vec![fixtures::ack(req.seq)]);
        let mgr = manager(&transport);

        let chandef = ChannelDef::new(5500).width(ChannelWidth::Mhz80, 5530);
        mgr.start_background_dfs(3, chandef).await.unwrap();
        mgr.stop_background_dfs(3).await.unwrap();

        let sent = transport.sent();
        let start = sent[0].attrs();
        assert_eq!(sent[0].cmd, Nl80211Cmd::RadarDetect as u8);
        assert_eq!(start.u32(Nl80211Attr::WiphyFreq as u16), Some(5500));
        assert_eq!(start.u32(Nl80211Attr::ChannelWidth as u16), Some(3));
        assert_eq!(start.u32(Nl80211Attr::CenterFreq1 as u16), Some(5530));
        assert!(start.has(Nl80211Attr::RadarBackground as u16));

        let stop = sent[1].attrs();
        assert!(stop.has(Nl80211Attr::RadarBackground as u16));
        assert!(!stop.has(Nl80211Attr::WiphyFreq as u16));
    }

    #[tokio::test]
    async fn test_scan_trigger_and_abort() {
        let transport = MockTransport::new();
        transport.respond(|req| vec![fixtures::ack(req.seq)]);
        let mgr = manager(&transport);

        let params = ScanParams::new()
            .ssid(*b"lab")
            .freq(2412)
            .freq(5180)
            .flags(scan_flag::FLUSH);
        mgr.start_scan(3, &params).unwrap().await.unwrap();
        mgr.abort_scan(3).unwrap().await.unwrap();

        let sent = transport.sent();
        let attrs = sent[0].attrs();
        let ssids: Vec<&[u8]> = attrs
            .nested_iter(Nl80211Attr::ScanSsids as u16)
            .map(|(_, s)| s)
            .collect();
        assert_eq!(ssids, vec![&b"lab"[..]]);
        assert_eq!(attrs.nested_iter(Nl80211Attr::ScanFrequencies as u16).count(), 2);
        assert_eq!(attrs.u32(Nl80211Attr::ScanFlags as u16), Some(scan_flag::FLUSH));
        assert_eq!(sent[1].cmd, Nl80211Cmd::AbortScan as u8);
    }

    #[test]
    fn test_wildcard_scan_probes_empty_ssid() {
        let attrs = scan_attrs(&ScanParams::default()).encode().unwrap();
        let map = AttrMap::parse(&attrs);
        let ssids: Vec<&[u8]> = map
            .nested_iter(Nl80211Attr::ScanSsids as u16)
            .map(|(_, s)| s)
            .collect();
        assert_eq!(ssids, vec![&b""[..]]);
        assert!(!map.has(Nl80211Attr::ScanFrequencies as u16));
    }

    #[tokio::test]
    async fn test_vendor_command_collects_payloads() {
        let transport = MockTransport::new();
        transport.respond(|req| {
            assert_eq!(req.attrs().u32(Nl80211Attr::VendorId as u16), Some(0x001374));
            vec![
                fixtures::genl_msg(
                    req.seq,
                    0,
                    Nl80211Cmd::Vendor as u8,
                    &AttrList::new()
                        .bytes(Nl80211Attr::VendorData as u16, vec![1, 2])
                        .bytes(Nl80211Attr::VendorData as u16, vec![3]),
                ),
                fixtures::ack(req.seq),
            ]
        });
        let mgr = manager(&transport);

        let payloads = mgr
            .send_vendor_cmd(3, 0x001374, 7, Some(VendorData::Raw(vec![9])))
            .await
            .unwrap();
        assert_eq!(payloads, vec![vec![1, 2], vec![3]]);

        let reply = mgr.send_vendor_cmd_async(3, 0x001374, 7, None).unwrap();
        assert_eq!(reply.await.unwrap().into_payloads(), vec![vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    async fn test_send_mgmt_frame_returns_cookie() {
        let transport = MockTransport::new();
        transport.respond(|req| {
            assert!(req.attrs().has(Nl80211Attr::OffchannelTxOk as u16));
            vec![
                fixtures::genl_msg(
                    req.seq,
                    0,
                    Nl80211Cmd::Frame as u8,
                    &AttrList::new().u64(Nl80211Attr::Cookie as u16, 0xdead_beef),
                ),
                fixtures::ack(req.seq),
            ]
        });
        let mgr = manager(&transport);

        let frame = FrameTx::new(vec![0xd0, 0, 0, 0]).offchannel(2437, 50);
        assert_eq!(mgr.send_mgmt_frame(3, &frame).await.unwrap(), 0xdead_beef);
        let sent = transport.sent();
        assert_eq!(sent[0].attrs().u32(Nl80211Attr::Duration as u16), Some(50));
    }
}
