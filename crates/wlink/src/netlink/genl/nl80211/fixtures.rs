//! Scripted kernel peer and message builders for engine tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use super::event::Event;
use super::types::WiphyInfo;
use super::{BandAttr, FreqAttr, Nl80211Attr, Nl80211Cmd};
use crate::netlink::attr::AttrMap;
use crate::netlink::builder::{AttrList, MessageBuilder};
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{GENL_HDRLEN, GenlMessage, GenlMsgHdr};
use crate::netlink::message::{NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};
use crate::netlink::socket::Transport;

/// Family id the mock kernel assigns to nl80211.
pub(crate) const FAMILY: u16 = 0x1c;

/// A request as the mock kernel received it.
#[derive(Debug, Clone)]
pub(crate) struct SentRequest {
    pub(crate) seq: u32,
    pub(crate) flags: u16,
    pub(crate) cmd: u8,
    pub(crate) raw: Vec<u8>,
}

impl SentRequest {
    fn parse(raw: &[u8]) -> Self {
        let hdr = NlMsgHdr::from_bytes(raw).unwrap();
        let genl = GenlMsgHdr::from_bytes(&raw[NLMSG_HDRLEN..]).unwrap();
        Self {
            seq: hdr.nlmsg_seq,
            flags: hdr.nlmsg_flags,
            cmd: genl.cmd,
            raw: raw.to_vec(),
        }
    }

    /// Top-level attributes of the request.
    pub(crate) fn attrs(&self) -> AttrMap<'_> {
        AttrMap::parse(&self.raw[NLMSG_HDRLEN + GENL_HDRLEN..])
    }
}

type Responder = Box<dyn FnMut(&SentRequest) -> Vec<Vec<u8>> + Send>;

#[derive(Default)]
struct MockState {
    inbox: VecDeque<Vec<u8>>,
    waker: Option<Waker>,
    sent: Vec<SentRequest>,
    responder: Option<Responder>,
    send_errno: Option<i32>,
}

/// In-memory [`Transport`]: records what is sent and replays scripted
/// answers.
#[derive(Default)]
pub(crate) struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request with the datagrams `f` returns.
    pub(crate) fn respond<F>(&self, f: F)
    where
        F: FnMut(&SentRequest) -> Vec<Vec<u8>> + Send + 'static,
    {
        self.state.lock().unwrap().responder = Some(Box::new(f));
    }

    /// Make every send fail with `errno`.
    pub(crate) fn fail_sends(&self, errno: i32) {
        self.state.lock().unwrap().send_errno = Some(errno);
    }

    /// Queue one datagram for the engine.
    pub(crate) fn inject(&self, datagram: Vec<u8>) {
        let waker = {
            let mut state = self.state.lock().unwrap();
            state.inbox.push_back(datagram);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    pub(crate) fn sent(&self) -> Vec<SentRequest> {
        self.state.lock().unwrap().sent.clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, msg: &[u8]) -> Result<()> {
        let request = SentRequest::parse(msg);
        let responder = {
            let mut state = self.state.lock().unwrap();
            if let Some(errno) = state.send_errno {
                return Err(Error::Send(io::Error::from_raw_os_error(errno)));
            }
            state.sent.push(request.clone());
            state.responder.take()
        };

        // the responder runs unlocked so it may inspect the mock
        if let Some(mut responder) = responder {
            let answers = responder(&request);
            self.state.lock().unwrap().responder = Some(responder);
            for answer in answers {
                self.inject(answer);
            }
        }
        Ok(())
    }

    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Result<Vec<u8>>> {
        let mut state = self.state.lock().unwrap();
        match state.inbox.pop_front() {
            Some(datagram) => Poll::Ready(Ok(datagram)),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    fn port_id(&self) -> u32 {
        4242
    }
}

/// One nl80211 message.
pub(crate) fn genl_msg(seq: u32, flags: u16, cmd: u8, attrs: &AttrList) -> Vec<u8> {
    let mut builder = MessageBuilder::new(FAMILY, flags);
    builder.append(&GenlMsgHdr::new(cmd, 1));
    builder.append_attrs(attrs).unwrap();
    builder.set_seq(seq);
    builder.set_pid(4242);
    builder.finish()
}

/// `NLMSG_ERROR` carrying `errno` (0 for an ACK).
pub(crate) fn error(seq: u32, errno: i32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::ERROR, 0);
    let mut echoed = NlMsgHdr::new(FAMILY, 0);
    echoed.nlmsg_seq = seq;
    echoed.nlmsg_len = NLMSG_HDRLEN as u32;
    builder.append(&NlMsgError {
        error: errno,
        msg: echoed,
    });
    builder.set_seq(seq);
    builder.finish()
}

pub(crate) fn ack(seq: u32) -> Vec<u8> {
    error(seq, 0)
}

pub(crate) fn done(seq: u32) -> Vec<u8> {
    let mut builder = MessageBuilder::new(NlMsgType::DONE, crate::netlink::message::NLM_F_MULTI);
    builder.append_bytes(&0i32.to_ne_bytes());
    builder.set_seq(seq);
    builder.finish()
}

/// Multicast event (sequence 0).
pub(crate) fn event(cmd: Nl80211Cmd, attrs: &AttrList) -> Vec<u8> {
    genl_msg(0, 0, cmd as u8, attrs)
}

/// Decode a datagram produced by [`event`].
pub(crate) fn parse_event(data: &[u8]) -> Event {
    let hdr = NlMsgHdr::from_bytes(data).unwrap();
    let len = hdr.nlmsg_len as usize;
    let msg = GenlMessage::parse(hdr, &data[NLMSG_HDRLEN..len]).unwrap();
    Event::parse(&msg)
}

/// The attribute tree the kernel sends for `info` in an unsplit dump.
pub(crate) fn wiphy_attrs(info: &WiphyInfo) -> AttrList {
    let mut attrs = AttrList::new()
        .u32(Nl80211Attr::Wiphy as u16, info.id)
        .string(Nl80211Attr::WiphyName as u16, info.name.clone());
    if let Some(n) = info.max_scan_ssids {
        attrs = attrs.u8(Nl80211Attr::MaxNumScanSsids as u16, n);
    }
    if let Some(n) = info.max_scan_ie_len {
        attrs = attrs.u16(Nl80211Attr::MaxScanIeLen as u16, n);
    }
    for (kind, value) in [
        (Nl80211Attr::WiphyAntennaAvailTx, info.antenna_avail_tx),
        (Nl80211Attr::WiphyAntennaAvailRx, info.antenna_avail_rx),
        (Nl80211Attr::WiphyAntennaTx, info.antenna_cfg_tx),
        (Nl80211Attr::WiphyAntennaRx, info.antenna_cfg_rx),
    ] {
        if let Some(value) = value {
            attrs = attrs.u32(kind as u16, value);
        }
    }
    if !info.iftypes.is_empty() {
        let iftypes = info
            .iftypes
            .iter()
            .fold(AttrList::new(), |list, t| list.flag(t.as_u32() as u16));
        attrs = attrs.nested(Nl80211Attr::SupportedIftypes as u16, iftypes);
    }
    if !info.ext_features.is_empty() {
        attrs = attrs.bytes(Nl80211Attr::ExtFeatures as u16, info.ext_features.clone());
    }

    let mut bands = AttrList::new();
    for band in &info.bands {
        let mut freqs = AttrList::new();
        for (i, ch) in band.channels.iter().enumerate() {
            let mut freq = AttrList::new().u32(FreqAttr::Freq as u16, ch.freq);
            if ch.disabled {
                freq = freq.flag(FreqAttr::Disabled as u16);
            }
            if ch.no_ir {
                freq = freq.flag(FreqAttr::NoIr as u16);
            }
            if ch.radar {
                freq = freq.flag(FreqAttr::Radar as u16);
            }
            if let Some(state) = ch.dfs_state {
                freq = freq.u32(FreqAttr::DfsState as u16, state.as_u32());
            }
            if let Some(t) = ch.dfs_time {
                freq = freq.u32(FreqAttr::DfsTime as u16, t);
            }
            if let Some(t) = ch.dfs_cac_time {
                freq = freq.u32(FreqAttr::DfsCacTime as u16, t);
            }
            if let Some(p) = ch.max_tx_power {
                freq = freq.u32(FreqAttr::MaxTxPower as u16, p);
            }
            freqs = freqs.nested(i as u16, freq);
        }
        let rates = band
            .bitrates
            .iter()
            .enumerate()
            .fold(AttrList::new(), |list, (i, rate)| {
                list.nested(i as u16, AttrList::new().u32(1, *rate))
            });

        let mut attrs = AttrList::new()
            .nested(BandAttr::Freqs as u16, freqs)
            .nested(BandAttr::Rates as u16, rates);
        if let Some(capa) = band.ht_capa {
            attrs = attrs.u16(BandAttr::HtCapa as u16, capa);
        }
        if let Some(set) = &band.ht_mcs_set {
            attrs = attrs.bytes(BandAttr::HtMcsSet as u16, set.clone());
        }
        if let Some(capa) = band.vht_capa {
            attrs = attrs.u32(BandAttr::VhtCapa as u16, capa);
        }
        if let Some(set) = &band.vht_mcs_set {
            attrs = attrs.bytes(BandAttr::VhtMcsSet as u16, set.clone());
        }
        bands = bands.nested(band.band.as_u16(), attrs);
    }
    if !info.bands.is_empty() {
        attrs = attrs.nested(Nl80211Attr::WiphyBands as u16, bands);
    }
    attrs
}

/// Let spawned driver tasks drain what was injected.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
