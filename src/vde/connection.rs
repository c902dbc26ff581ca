//! The switch-side half of the adapter.
//!
//! A [`SwitchConnection`] is an established session with a VDE switch: a data
//! channel carrying frames and a control channel that only ever signals
//! hang-up. libvdeplug's `VDECONN` is the production implementor
//! ([`VdePlug`](super::plug::VdePlug), behind the `vde` feature).

use std::io;
use std::os::fd::BorrowedFd;

/// Session with a VDE switch, as exposed by libvdeplug.
pub trait SwitchConnection: Send {
    /// Send one frame on the data channel. `flags` are `send(2)` flags.
    fn send(&self, buf: &[u8], flags: libc::c_int) -> io::Result<usize>;

    /// Receive one frame from the data channel. `flags` are `recv(2)` flags.
    fn recv(&self, buf: &mut [u8], flags: libc::c_int) -> io::Result<usize>;

    /// Descriptor carrying frame payloads.
    fn data_fd(&self) -> BorrowedFd<'_>;

    /// Descriptor carrying liveness / hang-up signaling.
    fn ctl_fd(&self) -> BorrowedFd<'_>;
}
