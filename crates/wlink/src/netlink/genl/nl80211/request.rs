//! Outgoing requests, reply handlers and pending-request bookkeeping.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{NL80211_GENL_VERSION, Nl80211Attr, Nl80211Cmd};
use crate::netlink::builder::{AttrList, AttrValue, MessageBuilder};
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{GenlMessage, GenlMsgHdr};
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST};

/// Verdict of a [`ReplyHandler`] on one reply message.
#[derive(Debug)]
pub enum HandlerStatus {
    /// Valid, but not for this handler. Keep waiting.
    Continue,
    /// Partial data accepted. Keep waiting for more or for the terminator.
    Ok,
    /// Resolve the request successfully now.
    Done,
    /// Resolve the request with this error now.
    Error(Error),
}

/// Consumer of the data messages of one request.
///
/// Called on the manager's driver task for every data message carrying the
/// request's sequence number, in delivery order. ACK, error and DONE
/// messages never reach the handler; they resolve the request directly.
///
/// Closures `FnMut(&GenlMessage) -> HandlerStatus` are handlers.
pub trait ReplyHandler: Send + 'static {
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus;
}

impl<F> ReplyHandler for F
where
    F: FnMut(&GenlMessage<'_>) -> HandlerStatus + Send + 'static,
{
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus {
        self(msg)
    }
}

/// Handler for commands answered by a bare ACK.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ack;

impl ReplyHandler for Ack {
    fn on_reply(&mut self, _msg: &GenlMessage<'_>) -> HandlerStatus {
        HandlerStatus::Continue
    }
}

/// Handler collecting one parsed item per data message.
pub(crate) struct Collect<T, F> {
    items: Vec<T>,
    parse: F,
}

impl<T, F> Collect<T, F>
where
    F: FnMut(&GenlMessage<'_>) -> Result<Option<T>>,
{
    pub(crate) fn new(parse: F) -> Self {
        Self {
            items: Vec::new(),
            parse,
        }
    }

    pub(crate) fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T, F> ReplyHandler for Collect<T, F>
where
    T: Send + 'static,
    F: FnMut(&GenlMessage<'_>) -> Result<Option<T>> + Send + 'static,
{
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus {
        match (self.parse)(msg) {
            Ok(Some(item)) => {
                self.items.push(item);
                HandlerStatus::Ok
            }
            Ok(None) => HandlerStatus::Continue,
            Err(e) => HandlerStatus::Error(e),
        }
    }
}

/// An nl80211 command with its attributes.
///
/// ```ignore
/// let req = Request::new(Nl80211Cmd::GetStation)
///     .ifindex(3)
///     .attrs(AttrList::new().bytes(Nl80211Attr::Mac as u16, mac));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    cmd: u8,
    attrs: AttrList,
    ifindex: Option<u32>,
    dump: bool,
}

impl Request {
    pub fn new(cmd: Nl80211Cmd) -> Self {
        Self::raw(cmd as u8).dump_if(cmd.is_dump())
    }

    /// Request for a command number without a named variant.
    pub fn raw(cmd: u8) -> Self {
        Self {
            cmd,
            attrs: AttrList::new(),
            ifindex: None,
            dump: false,
        }
    }

    /// Ask for a multi-part dump (`NLM_F_DUMP`).
    pub fn dump(self) -> Self {
        self.dump_if(true)
    }

    fn dump_if(mut self, dump: bool) -> Self {
        self.dump = self.dump || dump;
        self
    }

    /// Target interface, sent as `NL80211_ATTR_IFINDEX`.
    pub fn ifindex(mut self, ifindex: u32) -> Self {
        self.ifindex = Some(ifindex);
        self
    }

    /// Replace the attribute list.
    pub fn attrs(mut self, attrs: AttrList) -> Self {
        self.attrs = attrs;
        self
    }

    /// Append one attribute.
    pub fn attr(mut self, kind: Nl80211Attr, value: AttrValue) -> Self {
        self.attrs.push(kind as u16, value);
        self
    }

    pub fn cmd(&self) -> u8 {
        self.cmd
    }

    pub fn is_dump(&self) -> bool {
        self.dump
    }

    /// Serialize everything but the sequence number.
    pub(crate) fn build(&self, family: u16, pid: u32) -> Result<MessageBuilder> {
        if self.cmd == Nl80211Cmd::Unspec as u8 {
            return Err(Error::InvalidParam("command 0 is not a request".into()));
        }
        if let Some(0) = self.ifindex {
            return Err(Error::InvalidParam("ifindex 0 is not an interface".into()));
        }

        let mut flags = NLM_F_REQUEST | NLM_F_ACK;
        if self.dump {
            flags |= NLM_F_DUMP;
        }

        let mut builder = MessageBuilder::new(family, flags);
        builder.append(&GenlMsgHdr::new(self.cmd, NL80211_GENL_VERSION));
        if let Some(ifindex) = self.ifindex {
            if !self.attrs.contains(Nl80211Attr::Ifindex as u16) {
                builder.append_attrs(&AttrList::new().u32(Nl80211Attr::Ifindex as u16, ifindex))?;
            }
        }
        builder.append_attrs(&self.attrs)?;
        builder.set_pid(pid);
        Ok(builder)
    }
}

/// Future resolving to the outcome of one request.
///
/// Dropping a `Reply` does not cancel the request; it still resolves (and
/// is counted) when its reply, timeout or manager teardown arrives.
#[must_use = "a Reply does nothing unless awaited or given a completion callback"]
pub struct Reply<H> {
    seq: u32,
    rx: oneshot::Receiver<Result<H>>,
}

impl<H> Reply<H> {
    /// Sequence number assigned to the request.
    pub fn seq(&self) -> u32 {
        self.seq
    }
}

impl<H: Send + 'static> Reply<H> {
    /// Hand the outcome to `f` from a spawned task.
    pub fn on_complete<F>(self, f: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<H>) + Send + 'static,
    {
        tokio::spawn(async move { f(self.await) })
    }
}

impl<H> Future for Reply<H> {
    type Output = Result<H>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::InvalidState(format!(
                "request {} was dropped unresolved",
                self.seq
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Type-erased handler plus completion channel.
pub(crate) trait PendingSlot: Send {
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus;
    fn complete(self: Box<Self>, outcome: Result<()>);
}

struct Slot<H> {
    handler: H,
    tx: oneshot::Sender<Result<H>>,
}

impl<H: ReplyHandler> PendingSlot for Slot<H> {
    fn on_reply(&mut self, msg: &GenlMessage<'_>) -> HandlerStatus {
        self.handler.on_reply(msg)
    }

    fn complete(self: Box<Self>, outcome: Result<()>) {
        let Slot { handler, tx } = *self;
        // the caller may have dropped its Reply
        let _ = tx.send(outcome.map(|()| handler));
    }
}

/// One outstanding request.
pub(crate) struct PendingRequest {
    pub(crate) seq: u32,
    pub(crate) cmd: u8,
    pub(crate) submitted: Instant,
    pub(crate) budget: Duration,
    pub(crate) multi: bool,
    /// `None` while the handler runs outside the table lock.
    pub(crate) slot: Option<Box<dyn PendingSlot>>,
}

impl PendingRequest {
    pub(crate) fn new<H: ReplyHandler>(
        seq: u32,
        cmd: u8,
        budget: Duration,
        handler: H,
    ) -> (Self, Reply<H>) {
        let (tx, rx) = oneshot::channel();
        let pending = Self {
            seq,
            cmd,
            submitted: Instant::now(),
            budget,
            multi: false,
            slot: Some(Box::new(Slot { handler, tx })),
        };
        (pending, Reply { seq, rx })
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.submitted + self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::NlMsgHdr;

    #[test]
    fn test_build_prepends_ifindex() {
        let req = Request::new(Nl80211Cmd::GetInterface).ifindex(7);
        let mut builder = req.build(0x1c, 99).unwrap();
        builder.set_seq(5);
        let msg = builder.finish();

        let hdr = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(hdr.nlmsg_type, 0x1c);
        assert_eq!(hdr.nlmsg_seq, 5);
        assert_eq!(hdr.nlmsg_pid, 99);
        assert_eq!(hdr.nlmsg_flags & NLM_F_DUMP, 0);

        let genl = GenlMessage::parse(hdr, &msg[16..]).unwrap();
        assert_eq!(genl.cmd(), Nl80211Cmd::GetInterface as u8);
        assert_eq!(genl.attrs().u32(Nl80211Attr::Ifindex as u16), Some(7));
    }

    #[test]
    fn test_dump_commands_set_dump_flag() {
        let msg = Request::new(Nl80211Cmd::GetScan)
            .ifindex(3)
            .build(0x1c, 1)
            .unwrap()
            .finish();
        let hdr = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(hdr.nlmsg_flags & NLM_F_DUMP, NLM_F_DUMP);
    }

    #[test]
    fn test_local_validation() {
        assert!(matches!(
            Request::raw(0).build(0x1c, 1),
            Err(Error::InvalidParam(_))
        ));
        assert!(matches!(
            Request::new(Nl80211Cmd::GetInterface).ifindex(0).build(0x1c, 1),
            Err(Error::InvalidParam(_))
        ));
        let huge = Request::new(Nl80211Cmd::Vendor)
            .attr(Nl80211Attr::VendorData, AttrValue::Bytes(vec![0; 70_000]));
        assert!(matches!(
            huge.build(0x1c, 1),
            Err(Error::InvalidAttribute(_))
        ));
    }

    #[tokio::test]
    async fn test_slot_completion_and_dropped_reply() {
        let (pending, reply) = PendingRequest::new(3, 5, Duration::from_secs(1), Ack);
        assert_eq!(reply.seq(), 3);
        assert_eq!(pending.deadline(), pending.submitted + Duration::from_secs(1));
        pending.slot.unwrap().complete(Ok(()));
        assert!(reply.await.is_ok());

        let (pending, reply) = PendingRequest::new(4, 5, Duration::from_secs(1), Ack);
        drop(pending);
        assert!(matches!(reply.await, Err(Error::InvalidState(_))));
    }
}
