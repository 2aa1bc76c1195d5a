//! Socket manager: request correlation, expiry and event dispatch.
//!
//! Each [`SocketManager`] owns one transport and one driver task. The driver
//! waits on three things at once: an inbound datagram, the earliest request
//! deadline, and a wake-up from a fresh submission or a teardown. All
//! bookkeeping lives behind one mutex that is never held across an `.await`
//! nor while user code runs.

use std::collections::HashMap;
use std::future::poll_fn;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{Notify, OnceCell};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::event::Event;
use super::listener::{self, EventHandlers, Filter, Listener, ListenerEntry};
use super::request::{HandlerStatus, PendingRequest, PendingSlot, Reply, ReplyHandler, Request};
use super::stats::StatCounters;
use super::vendor::VendorEventHandler;
use super::{NL80211_GENL_NAME, REQUEST_ASYNC_TIMEOUT, REQUEST_SYNC_TIMEOUT, mcast};
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{FamilyInfo, GenlConnection, GenlMessage};
use crate::netlink::message::{MessageIter, NlMsgError, NlMsgHdr, NlMsgType};
use crate::netlink::socket::{DEFAULT_RECV_BUF, NetlinkSocket, Transport};

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Every manager ever built in this process, for [`SocketManager::all_stats`].
static REGISTRY: Mutex<Vec<Weak<Inner>>> = Mutex::new(Vec::new());

/// Process-wide instance behind [`SocketManager::shared`].
static SHARED: tokio::sync::Mutex<Option<SocketManager>> = tokio::sync::Mutex::const_new(None);

/// nl80211 family id and multicast groups, resolved once.
static FAMILY: OnceCell<FamilyInfo> = OnceCell::const_new();

async fn nl80211_family() -> Result<&'static FamilyInfo> {
    FAMILY
        .get_or_try_init(|| async {
            let conn = GenlConnection::new()?;
            conn.get_family(NL80211_GENL_NAME).await
        })
        .await
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Socket manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Budget of [`SocketManager::send_sync`] requests.
    pub sync_timeout: Duration,
    /// Budget of [`SocketManager::send_async`] requests.
    pub async_timeout: Duration,
    /// nl80211 multicast groups to join. Groups the kernel does not
    /// advertise are skipped.
    pub mcast_groups: Vec<String>,
    /// Receive buffer size hint.
    pub recv_buffer: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            sync_timeout: REQUEST_SYNC_TIMEOUT,
            async_timeout: REQUEST_ASYNC_TIMEOUT,
            mcast_groups: mcast::DEFAULT.iter().map(|g| g.to_string()).collect(),
            recv_buffer: DEFAULT_RECV_BUF,
        }
    }
}

impl ManagerConfig {
    fn validate(&self) -> Result<()> {
        if self.sync_timeout.is_zero() || self.async_timeout.is_zero() {
            return Err(Error::InvalidParam("request timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Builder for a [`SocketManager`].
///
/// ```rust,no_run
/// use std::time::Duration;
/// use wlink::netlink::genl::nl80211::SocketManager;
///
/// # async fn example() -> wlink::Result<()> {
/// let mgr = SocketManager::builder()
///     .sync_timeout(Duration::from_millis(500))
///     .mcast_groups(["scan", "mlme"])
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "builders do nothing unless built"]
pub struct ManagerConfigBuilder {
    config: ManagerConfig,
}

impl ManagerConfigBuilder {
    pub fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.config.sync_timeout = timeout;
        self
    }

    pub fn async_timeout(mut self, timeout: Duration) -> Self {
        self.config.async_timeout = timeout;
        self
    }

    /// Replace the multicast group list.
    pub fn mcast_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.mcast_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Join no multicast group: the manager only sees replies.
    pub fn no_events(self) -> Self {
        self.mcast_groups(std::iter::empty::<String>())
    }

    pub fn recv_buffer(mut self, len: usize) -> Self {
        self.config.recv_buffer = len;
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Open a socket, join the configured groups and start the driver.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<SocketManager> {
        self.config.validate()?;
        let family = nl80211_family().await?;

        let mut socket = NetlinkSocket::new()?;
        socket.set_recv_buffer(self.config.recv_buffer);
        for name in &self.config.mcast_groups {
            match family.mcast_group(name) {
                Some(group) => socket.add_membership(group)?,
                None => debug!(group = %name, "nl80211 multicast group not advertised"),
            }
        }

        Ok(SocketManager::from_parts(
            Arc::new(socket),
            family.id,
            self.config,
        ))
    }
}

/// Completion to run once the table lock is released.
struct Completion {
    slot: Box<dyn PendingSlot>,
    outcome: Result<()>,
}

impl Completion {
    fn run(self) {
        self.slot.complete(self.outcome);
    }
}

struct State {
    destroyed: bool,
    /// Released on shutdown, which closes the socket.
    transport: Option<Arc<dyn Transport>>,
    next_seq: u32,
    pending: HashMap<u32, PendingRequest>,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
    stats: StatCounters,
}

impl State {
    fn new(transport: Option<Arc<dyn Transport>>) -> Self {
        Self {
            destroyed: false,
            transport,
            next_seq: 1,
            pending: HashMap::new(),
            listeners: Vec::new(),
            next_listener: 1,
            stats: StatCounters::default(),
        }
    }

    /// Next sequence id: never 0 (multicast), never a live request's.
    fn alloc_seq(&mut self) -> u32 {
        loop {
            let seq = self.next_seq;
            self.next_seq = self.next_seq.wrapping_add(1);
            if seq != 0 && !self.pending.contains_key(&seq) {
                return seq;
            }
        }
    }

    /// Account for a resolved request.
    ///
    /// A request whose slot is out on the driver is left to the driver,
    /// which resolves it when it finds the entry gone.
    fn finish(&mut self, pending: PendingRequest, outcome: Result<()>) -> Option<Completion> {
        let slot = pending.slot?;
        match &outcome {
            Ok(()) => self.stats.req_success += 1,
            Err(Error::Timeout { .. }) => self.stats.req_expired += 1,
            Err(_) => self.stats.req_failed += 1,
        }
        debug!(
            seq = pending.seq,
            cmd = pending.cmd,
            multi = pending.multi,
            elapsed = ?pending.submitted.elapsed(),
            ok = outcome.is_ok(),
            "request resolved"
        );
        Some(Completion { slot, outcome })
    }
}

pub(crate) struct Inner {
    id: u64,
    port: u32,
    family: u16,
    config: ManagerConfig,
    state: Mutex<State>,
    wake: Arc<Notify>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.lock().pending.values().map(PendingRequest::deadline).min()
    }

    fn submit<H: ReplyHandler>(
        &self,
        req: &Request,
        handler: H,
        budget: Duration,
    ) -> Result<Reply<H>> {
        let mut builder = req.build(self.family, self.port)?;

        let (seq, reply, transport) = {
            let mut state = self.lock();
            let transport = match (&state.transport, state.destroyed) {
                (Some(transport), false) => Arc::clone(transport),
                _ => return Err(Error::InvalidState("socket manager destroyed".into())),
            };
            let seq = state.alloc_seq();
            let (pending, reply) = PendingRequest::new(seq, req.cmd(), budget, handler);
            state.pending.insert(seq, pending);
            state.stats.req_sent += 1;
            (seq, reply, transport)
        };

        builder.set_seq(seq);
        let msg = builder.finish();
        if let Err(e) = transport.send(&msg) {
            let removed = {
                let mut state = self.lock();
                let removed = state.pending.remove(&seq);
                if removed.is_some() {
                    state.stats.req_failed += 1;
                }
                removed
            };
            drop(removed);
            debug!(manager = self.id, seq, cmd = req.cmd(), error = %e, "request send failed");
            return Err(e);
        }

        debug!(
            manager = self.id,
            seq,
            cmd = req.cmd(),
            dump = req.is_dump(),
            ?budget,
            "request sent"
        );
        self.wake.notify_one();
        Ok(reply)
    }

    fn process_datagram(&self, data: &[u8]) {
        for msg in MessageIter::new(data) {
            match msg {
                Ok((header, payload)) => self.process_message(header, payload),
                Err(e) => {
                    warn!(manager = self.id, error = %e, "malformed datagram");
                    break;
                }
            }
        }
    }

    fn process_message(&self, header: &NlMsgHdr, payload: &[u8]) {
        let seq = header.nlmsg_seq;
        match header.nlmsg_type {
            NlMsgType::ERROR => {
                let err = match NlMsgError::from_bytes(payload) {
                    Ok(err) => err,
                    Err(e) => {
                        debug!(manager = self.id, seq, error = %e, "short error message");
                        return;
                    }
                };
                let outcome = if err.is_ack() {
                    Ok(())
                } else {
                    Err(Error::from_ext_ack(
                        err.error,
                        err.ext_message(header.nlmsg_flags, payload),
                    ))
                };
                self.resolve_seq(seq, outcome);
            }
            NlMsgType::DONE => {
                // a dump that failed part-way carries the errno here
                let outcome = match payload.get(..4) {
                    Some(b) => match i32::from_ne_bytes([b[0], b[1], b[2], b[3]]) {
                        errno if errno < 0 => Err(Error::from_errno(errno)),
                        _ => Ok(()),
                    },
                    None => Ok(()),
                };
                self.resolve_seq(seq, outcome);
            }
            kind if kind < NlMsgType::MIN_TYPE => {
                trace!(manager = self.id, seq, kind, "control message dropped");
            }
            kind if kind != self.family => {
                trace!(manager = self.id, seq, kind, "foreign family message dropped");
            }
            _ => {
                let msg = match GenlMessage::parse(header, payload) {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(manager = self.id, seq, error = %e, "undecodable message");
                        return;
                    }
                };
                trace!(manager = self.id, seq, cmd = msg.cmd(), multi = msg.is_multi(), "message");
                if seq != 0 && self.deliver_reply(&msg) {
                    return;
                }
                self.dispatch_event(&msg);
            }
        }
    }

    fn resolve_seq(&self, seq: u32, outcome: Result<()>) {
        let completion = {
            let mut state = self.lock();
            match state.pending.remove(&seq) {
                Some(pending) => state.finish(pending, outcome),
                None => {
                    debug!(manager = self.id, seq, ok = outcome.is_ok(), "stray reply dropped");
                    None
                }
            }
        };
        if let Some(completion) = completion {
            completion.run();
        }
    }

    /// Hand a data message to the request it answers. Returns `false` when
    /// no request is waiting on its sequence id.
    fn deliver_reply(&self, msg: &GenlMessage<'_>) -> bool {
        let seq = msg.seq();
        let mut slot = {
            let mut state = self.lock();
            let Some(pending) = state.pending.get_mut(&seq) else {
                return false;
            };
            if msg.is_multi() {
                pending.multi = true;
            }
            match pending.slot.take() {
                Some(slot) => slot,
                None => return true,
            }
        };

        let status = match catch_unwind(AssertUnwindSafe(|| slot.on_reply(msg))) {
            Ok(status) => status,
            Err(_) => {
                warn!(manager = self.id, seq, cmd = msg.cmd(), "reply handler panicked");
                HandlerStatus::Error(Error::InvalidState(format!(
                    "reply handler of request {seq} panicked"
                )))
            }
        };

        let completion = {
            let mut state = self.lock();
            match state.pending.remove(&seq) {
                Some(mut pending) => {
                    pending.slot = Some(slot);
                    match status {
                        HandlerStatus::Continue | HandlerStatus::Ok => {
                            state.pending.insert(seq, pending);
                            None
                        }
                        HandlerStatus::Done => state.finish(pending, Ok(())),
                        HandlerStatus::Error(e) => state.finish(pending, Err(e)),
                    }
                }
                // torn down while the handler ran
                None => {
                    state.stats.req_failed += 1;
                    Some(Completion {
                        slot,
                        outcome: Err(Error::InvalidState("socket manager destroyed".into())),
                    })
                }
            }
        };
        if let Some(completion) = completion {
            completion.run();
        }
        true
    }

    fn dispatch_event(&self, msg: &GenlMessage<'_>) {
        let event = Event::parse(msg);
        let targets = {
            let mut state = self.lock();
            state.stats.evt_received += 1;
            listener::select(&state.listeners, &event)
        };

        let mut handled = false;
        for (id, handlers) in &targets {
            handled |= handlers.deliver(*id, &event);
        }
        trace!(
            manager = self.id,
            cmd = event.cmd,
            kind = ?event.kind,
            listeners = targets.len(),
            handled,
            "event dispatched"
        );
        drop(targets);

        let mut state = self.lock();
        if handled {
            state.stats.evt_handled += 1;
        } else {
            state.stats.evt_unhandled += 1;
        }
    }

    /// Resolve every request whose deadline is at or before `now`.
    fn expire(&self, now: Instant) {
        let completions: Vec<Completion> = {
            let mut state = self.lock();
            let mut expired: Vec<u32> = state
                .pending
                .iter()
                .filter(|(_, p)| p.deadline() <= now)
                .map(|(seq, _)| *seq)
                .collect();
            expired.sort_unstable();
            expired
                .into_iter()
                .filter_map(|seq| {
                    let pending = state.pending.remove(&seq)?;
                    let budget = pending.budget;
                    debug!(manager = self.id, seq, cmd = pending.cmd, ?budget, "request expired");
                    state.finish(pending, Err(Error::Timeout { seq, budget }))
                })
                .collect()
        };
        for completion in completions {
            completion.run();
        }
    }

    /// Fail every pending request, drop every listener, release the
    /// transport and stop the driver.
    fn shutdown(&self, reason: &str) {
        let (completions, listeners, transport) = {
            let mut state = self.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;

            let mut drained: Vec<PendingRequest> =
                state.pending.drain().map(|(_, p)| p).collect();
            drained.sort_unstable_by_key(|p| p.seq);
            let completions: Vec<Completion> = drained
                .into_iter()
                .filter_map(|pending| {
                    let seq = pending.seq;
                    state.finish(
                        pending,
                        Err(Error::InvalidState(format!(
                            "socket manager destroyed with request {seq} pending"
                        ))),
                    )
                })
                .collect();
            (
                completions,
                std::mem::take(&mut state.listeners),
                state.transport.take(),
            )
        };

        debug!(
            manager = self.id,
            reason,
            pending = completions.len(),
            listeners = listeners.len(),
            "socket manager shut down"
        );
        drop(listeners);
        drop(transport);
        for completion in completions {
            completion.run();
        }
        self.wake.notify_one();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown("dropped");
    }
}

fn is_overrun(err: &Error) -> bool {
    matches!(err, Error::Io(io) if io.raw_os_error() == Some(libc::ENOBUFS))
}

/// Shuts the manager down when the driver task goes away, including when
/// its runtime is dropped before the task ever ran.
struct DriverGuard {
    inner: Weak<Inner>,
}

impl Drop for DriverGuard {
    fn drop(&mut self) {
        if let Some(mgr) = self.inner.upgrade() {
            mgr.shutdown("driver stopped");
        }
    }
}

/// Driver task. Holds the manager weakly so dropping the last handle tears
/// it down.
async fn drive(guard: DriverGuard, transport: Arc<dyn Transport>, wake: Arc<Notify>) {
    let inner = &guard.inner;
    loop {
        let deadline = match inner.upgrade() {
            Some(mgr) if !mgr.lock().destroyed => mgr.next_deadline(),
            _ => break,
        };
        let expiry = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            received = poll_fn(|cx| transport.poll_recv(cx)) => {
                let Some(mgr) = inner.upgrade() else { break };
                match received {
                    Ok(data) => mgr.process_datagram(&data),
                    Err(e) if is_overrun(&e) => {
                        warn!(manager = mgr.id, "receive buffer overrun, events were lost");
                    }
                    Err(e) => {
                        warn!(manager = mgr.id, error = %e, "receive failed");
                        mgr.shutdown("receive failed");
                    }
                }
            }
            () = expiry => {
                if let Some(mgr) = inner.upgrade() {
                    mgr.expire(Instant::now());
                }
            }
            () = wake.notified() => {}
        }
    }
    drop(transport);
    trace!("socket manager driver stopped");
}

/// Handle to an nl80211 socket manager. Cheap to clone.
///
/// The manager is torn down by [`destroy`](Self::destroy) or when the last
/// handle is dropped; either way every pending request resolves with
/// [`Error::InvalidState`].
#[derive(Clone)]
pub struct SocketManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SocketManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketManager")
            .field("id", &self.inner.id)
            .field("family", &self.inner.family)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl SocketManager {
    /// A manager with the default configuration.
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    pub fn builder() -> ManagerConfigBuilder {
        ManagerConfigBuilder::default()
    }

    /// The process-wide manager, created on first use.
    ///
    /// It is never torn down implicitly, but its driver runs on the runtime
    /// that created it. Once that runtime is gone, or after an explicit
    /// [`destroy`](Self::destroy), the next call builds a fresh instance.
    pub async fn shared() -> Result<Self> {
        let mut shared = SHARED.lock().await;
        if let Some(mgr) = shared.as_ref().filter(|mgr| !mgr.is_destroyed()) {
            return Ok(mgr.clone());
        }
        let mgr = Self::new().await?;
        *shared = Some(mgr.clone());
        Ok(mgr)
    }

    /// A manager over a caller-supplied transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        family_id: u16,
        config: ManagerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(transport, family_id, config))
    }

    fn from_parts(transport: Arc<dyn Transport>, family: u16, config: ManagerConfig) -> Self {
        let id = NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed);
        let wake = Arc::new(Notify::new());
        let port = transport.port_id();
        let inner = Arc::new(Inner {
            id,
            port,
            family,
            config,
            state: Mutex::new(State::new(Some(Arc::clone(&transport)))),
            wake: Arc::clone(&wake),
        });

        {
            let mut registry = lock(&REGISTRY);
            registry.retain(|w| w.strong_count() > 0);
            registry.push(Arc::downgrade(&inner));
        }

        debug!(manager = id, family, port, "socket manager started");
        let guard = DriverGuard {
            inner: Arc::downgrade(&inner),
        };
        tokio::spawn(drive(guard, transport, wake));
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<Inner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Resolved nl80211 family id.
    pub fn family_id(&self) -> u16 {
        self.inner.family
    }

    pub fn port_id(&self) -> u32 {
        self.inner.port
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    /// Tear the manager down now. Idempotent.
    pub fn destroy(&self) {
        self.inner.shutdown("destroyed");
    }

    /// Submit `req` with the sync budget and wait for its resolution.
    pub async fn send_sync<H: ReplyHandler>(&self, req: Request, handler: H) -> Result<H> {
        self.inner
            .submit(&req, handler, self.inner.config.sync_timeout)?
            .await
    }

    /// Submit `req` with the async budget.
    ///
    /// Local failures are returned here; everything else resolves the
    /// returned [`Reply`].
    pub fn send_async<H: ReplyHandler>(&self, req: Request, handler: H) -> Result<Reply<H>> {
        self.inner
            .submit(&req, handler, self.inner.config.async_timeout)
    }

    /// Submit `req` with an explicit budget.
    pub fn send_with_budget<H: ReplyHandler>(
        &self,
        req: Request,
        handler: H,
        budget: Duration,
    ) -> Result<Reply<H>> {
        if budget.is_zero() {
            return Err(Error::InvalidParam("request budget must be non-zero".into()));
        }
        self.inner.submit(&req, handler, budget)
    }

    /// Register a listener for events matching both filters.
    pub fn add_listener(
        &self,
        wiphy: impl Into<Filter>,
        ifindex: impl Into<Filter>,
        handlers: EventHandlers,
    ) -> Result<Listener> {
        let mut state = self.inner.lock();
        if state.destroyed {
            return Err(Error::InvalidState("socket manager destroyed".into()));
        }
        let id = state.next_listener;
        state.next_listener += 1;
        let entry = ListenerEntry::new(id, wiphy.into(), ifindex.into(), handlers);
        let handle = entry.handle(self.inner.id);
        state.listeners.push(entry);
        debug!(manager = self.inner.id, listener = id, tier = ?handle.tier(), "listener added");
        Ok(handle)
    }

    /// Register a listener for every event.
    pub fn add_global_listener(&self, handlers: EventHandlers) -> Result<Listener> {
        self.add_listener(Filter::Any, Filter::Any, handlers)
    }

    pub fn remove_listener(&self, listener: &Listener) -> Result<()> {
        let removed = {
            let mut state = self.inner.lock();
            let pos = state
                .listeners
                .iter()
                .position(|e| e.id == listener.id)
                .filter(|_| listener.manager == self.inner.id)
                .ok_or_else(|| {
                    Error::InvalidParam(format!("unknown listener {}", listener.id))
                })?;
            state.listeners.remove(pos)
        };
        debug!(manager = self.inner.id, listener = removed.id, "listener removed");
        Ok(())
    }

    /// Add a vendor event decoder to a registered listener.
    pub fn augment_vendor_handler(
        &self,
        listener: &Listener,
        handler: Arc<dyn VendorEventHandler>,
    ) -> Result<()> {
        let oui = handler.oui();
        let mut state = self.inner.lock();
        let entry = state
            .listeners
            .iter_mut()
            .find(|e| e.id == listener.id)
            .filter(|_| listener.manager == self.inner.id)
            .ok_or_else(|| Error::InvalidParam(format!("unknown listener {}", listener.id)))?;
        entry.handlers = Arc::new(EventHandlers::clone(&entry.handlers).vendor_handler(handler));
        debug!(manager = self.inner.id, listener = listener.id, oui, "vendor handler added");
        Ok(())
    }

    /// Snapshot of this manager's counters.
    pub fn stats(&self) -> StatCounters {
        let state = self.inner.lock();
        StatCounters {
            req_pending: state.pending.len() as u64,
            ..state.stats
        }
    }

    /// Counters summed over every live manager in the process.
    pub fn all_stats() -> StatCounters {
        let managers: Vec<Arc<Inner>> = lock(&REGISTRY).iter().filter_map(Weak::upgrade).collect();
        managers
            .into_iter()
            .map(|inner| Self { inner }.stats())
            .sum()
    }
}
