//! Events as a [`Stream`].
//!
//! An [`EventStream`] is a listener whose every slot forwards a copy of the
//! event into an unbounded channel. Dropping the stream removes the
//! listener.
//!
//! ```ignore
//! use tokio_stream::StreamExt;
//! use wlink::netlink::genl::nl80211::{Filter, SocketManager};
//!
//! let mgr = SocketManager::new().await?;
//! let mut events = mgr.event_stream(Filter::Any, Filter::Any)?;
//! while let Some(event) = events.next().await {
//!     println!("{:?} on {:?}", event.kind, event.ifindex);
//! }
//! ```

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::event::Event;
use super::listener::{EventHandlers, Filter, Listener};
use super::manager::{Inner, SocketManager};
use crate::netlink::error::Result;

/// Stream of the events one listener matches.
///
/// Ends when the socket manager is destroyed.
pub struct EventStream {
    rx: UnboundedReceiverStream<Event>,
    listener: Listener,
    manager: Weak<Inner>,
}

impl EventStream {
    /// The listener feeding this stream.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(manager) = SocketManager::upgrade(&self.manager) {
            // already gone if the manager was destroyed
            let _ = manager.remove_listener(&self.listener);
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl SocketManager {
    /// Subscribe to matching events as a stream.
    pub fn event_stream(
        &self,
        wiphy: impl Into<Filter>,
        ifindex: impl Into<Filter>,
    ) -> Result<EventStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handlers = EventHandlers::all(Arc::new(move |event: &Event| {
            let _ = tx.send(event.clone());
        }));
        let listener = self.add_listener(wiphy, ifindex, handlers)?;
        Ok(EventStream {
            rx: UnboundedReceiverStream::new(rx),
            listener,
            manager: self.downgrade(),
        })
    }
}
