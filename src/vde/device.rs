//! VDE-backed network device
//!
//! [`VdeNetDevice`] bridges the [`NetworkDevice`] interface to a VDE switch
//! connection:
//! - `tx` is a single non-blocking send on the data channel
//! - `rx` checks read-readiness before receiving (libvdeplug's `vde_recv`
//!   cannot be trusted with `MSG_DONTWAIT` alone)
//! - `poll` watches the data and control channels together; any activity on
//!   the control channel means the switch has gone away

use std::io;
use std::os::fd::AsRawFd;
use std::time::Duration;

use tracing::{trace, warn};

use super::connection::SwitchConnection;
use crate::netdev::{NetworkDevice, PollEvents};
use crate::{Error, Result};

/// A virtual NIC backend connected to a VDE switch
#[derive(Debug)]
pub struct VdeNetDevice<C> {
    conn: C,
}

impl<C: SwitchConnection> VdeNetDevice<C> {
    /// Wrap an established switch connection
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// The underlying switch connection
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Release the device, returning the connection
    pub fn into_inner(self) -> C {
        self.conn
    }

    fn wait(&self, events: PollEvents, timeout: Option<Duration>) -> Result<PollEvents> {
        let mut fds = [
            libc::pollfd {
                fd: self.conn.data_fd().as_raw_fd(),
                events: data_interest(events),
                revents: 0,
            },
            libc::pollfd {
                fd: self.conn.ctl_fd().as_raw_fd(),
                events: libc::POLLHUP | libc::POLLIN,
                revents: 0,
            },
        ];
        let timeout_ms = timeout_millis(timeout);

        loop {
            let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
            if ret >= 0 {
                break;
            }
            let e = io::Error::last_os_error();
            if e.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(Error::Io(e));
        }

        decode_revents(fds[0].revents, fds[1].revents)
    }
}

impl<C: SwitchConnection> NetworkDevice for VdeNetDevice<C> {
    fn tx(&mut self, frame: &[u8]) -> Result<()> {
        match self.conn.send(frame, libc::MSG_DONTWAIT) {
            Ok(sent) => {
                if sent != frame.len() {
                    warn!("vde: short send, {} of {} bytes", sent, frame.len());
                }
                trace!("vde: tx {} bytes", sent);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(Error::WouldBlock),
            // Hard send errors are not surfaced; the frame is dropped.
            Err(e) => {
                warn!("vde: send of {} bytes failed: {}", frame.len(), e);
                Ok(())
            }
        }
    }

    fn rx(&mut self, buf: &mut [u8]) -> Result<usize> {
        // A zero-length recv would consume and discard the pending datagram.
        if buf.is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "receive buffer is empty",
            )));
        }

        let ready = self.wait(PollEvents::RX, Some(Duration::ZERO))?;
        if !ready.contains(PollEvents::RX) {
            return Err(Error::WouldBlock);
        }

        match self.conn.recv(buf, libc::MSG_DONTWAIT) {
            Ok(0) => Err(Error::WouldBlock),
            Ok(n) => {
                let n = n.min(buf.len());
                trace!("vde: rx {} bytes", n);
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(Error::WouldBlock),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn poll_with_timeout(
        &mut self,
        events: PollEvents,
        timeout: Option<Duration>,
    ) -> Result<PollEvents> {
        self.wait(events, timeout)
    }
}

/// `poll(2)` interest for the data channel
fn data_interest(events: PollEvents) -> libc::c_short {
    let mut interest = 0;
    if events.contains(PollEvents::RX) {
        interest |= libc::POLLIN;
    }
    if events.contains(PollEvents::TX) {
        interest |= libc::POLLOUT;
    }
    interest
}

/// `poll(2)` timeout in milliseconds, rounded up; `None` waits forever
fn timeout_millis(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(d) => {
            let ms = d.as_nanos().div_ceil(1_000_000);
            libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
        }
    }
}

fn decode_revents(data: libc::c_short, ctl: libc::c_short) -> Result<PollEvents> {
    // A closed control stream raises POLLIN alongside POLLHUP.
    if ctl & (libc::POLLHUP | libc::POLLNVAL) != 0 {
        return Err(Error::ConnectionLost("control channel hang-up"));
    }
    if ctl & libc::POLLIN != 0 {
        return Err(Error::ConnectionLost("unexpected data on control channel"));
    }
    if data & (libc::POLLHUP | libc::POLLNVAL) != 0 {
        return Err(Error::ConnectionLost("data channel hang-up"));
    }

    let mut ready = PollEvents::empty();
    if data & libc::POLLIN != 0 {
        ready |= PollEvents::RX;
    }
    if data & libc::POLLOUT != 0 {
        ready |= PollEvents::TX;
    }
    Ok(ready)
}
