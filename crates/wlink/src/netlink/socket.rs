//! Low-level async netlink socket operations.
//!
//! [`NetlinkSocket`] owns one `NETLINK_GENERIC` socket registered with the
//! tokio reactor. The [`Transport`] trait is the seam the request engine
//! talks to, so tests can substitute the kernel with a scripted peer.

use std::os::unix::io::{AsRawFd, RawFd};
use std::task::{Context, Poll};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};

/// Default receive buffer size. Large enough for one split wiphy dump part
/// or a batch of station entries.
pub const DEFAULT_RECV_BUF: usize = 32768;

/// Raw message transport used by the request engine.
///
/// `send` must not block: a full socket buffer is reported as
/// [`Error::Send`] and left to the caller to retry. `poll_recv` returns
/// `Poll::Pending` when no datagram is ready and arranges for the task to be
/// woken on readiness.
pub trait Transport: Send + Sync + 'static {
    /// Send one encoded netlink message.
    fn send(&self, msg: &[u8]) -> Result<()>;

    /// Receive one datagram (possibly several netlink messages).
    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Result<Vec<u8>>>;

    /// Local port id stamped into outgoing headers.
    fn port_id(&self) -> u32;
}

/// Async generic netlink socket.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
    /// Local port ID (assigned by kernel).
    pid: u32,
    /// Receive buffer capacity.
    recv_buf: usize,
}

impl NetlinkSocket {
    /// Open a `NETLINK_GENERIC` socket and register it with the reactor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_GENERIC)?;
        socket.set_non_blocking(true)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Enable extended ACK for better error messages
        socket.set_ext_ack(true).ok(); // Ignore if not supported

        let fd = AsyncFd::new(socket)?;

        Ok(Self {
            fd,
            pid,
            recv_buf: DEFAULT_RECV_BUF,
        })
    }

    /// Change the receive buffer capacity.
    pub fn set_recv_buffer(&mut self, len: usize) {
        self.recv_buf = len.max(4096);
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Subscribe to a multicast group.
    pub fn add_membership(&mut self, group: u32) -> Result<()> {
        self.fd.get_mut().add_membership(group)?;
        Ok(())
    }

    /// Send a message without waiting for writability.
    pub fn try_send(&self, msg: &[u8]) -> Result<()> {
        self.fd.get_ref().send(msg, 0).map_err(Error::Send)?;
        Ok(())
    }

    /// Receive a message, waiting for readability.
    pub async fn recv_msg(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(self.recv_buf);

        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                Ok(result) => {
                    let _n = result?;
                    // buf has been advanced by recv, so buf[..] contains the data
                    return Ok(buf.to_vec());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Poll for incoming data.
    ///
    /// This is the poll-based version of `recv_msg()`, used by the driver
    /// task of a socket manager.
    pub fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Result<Vec<u8>>> {
        let mut buf = BytesMut::with_capacity(self.recv_buf);

        loop {
            let mut guard = match self.fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e.into())),
                Poll::Pending => return Poll::Pending,
            };

            match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                Ok(result) => match result {
                    Ok(_n) => return Poll::Ready(Ok(buf.to_vec())),
                    Err(e) => return Poll::Ready(Err(e.into())),
                },
                Err(_would_block) => continue,
            }
        }
    }
}

impl Transport for NetlinkSocket {
    fn send(&self, msg: &[u8]) -> Result<()> {
        self.try_send(msg)
    }

    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Result<Vec<u8>>> {
        NetlinkSocket::poll_recv(self, cx)
    }

    fn port_id(&self) -> u32 {
        self.pid
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
