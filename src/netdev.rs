//! Virtual network device interface
//!
//! The owning network subsystem talks to every backend through
//! [`NetworkDevice`]: it transmits guest frames, pulls host frames into guest
//! buffers, and waits for readiness from its own event loop.

use std::time::Duration;

use bitflags::bitflags;

use crate::Result;

/// Largest Ethernet frame a backend is expected to carry (1500 MTU + header + VLAN tag)
pub const MAX_FRAME_LEN: usize = 1518;

bitflags! {
    /// Readiness bits requested from and reported by [`NetworkDevice::poll`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PollEvents: u32 {
        /// Data channel has a frame to read
        const RX = 1 << 0;
        /// Data channel can accept a frame
        const TX = 1 << 1;
    }
}

/// A backend that moves Ethernet frames between a guest NIC and the host.
pub trait NetworkDevice: Send {
    /// Transmit one guest → host frame without blocking.
    ///
    /// Returns [`Error::WouldBlock`](crate::Error::WouldBlock) when the
    /// channel cannot take the frame right now.
    fn tx(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive one host → guest frame into `buf` without blocking.
    ///
    /// On success the returned length never exceeds `buf.len()`. On failure
    /// the contents of `buf` are unspecified. An empty `buf` is rejected
    /// without touching the channel.
    fn rx(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Wait up to `timeout` (`None` = forever) for any of `events`,
    /// returning the ready subset.
    ///
    /// An empty mask means "not ready yet" and is not an error.
    fn poll_with_timeout(
        &mut self,
        events: PollEvents,
        timeout: Option<Duration>,
    ) -> Result<PollEvents>;

    /// Block until any of `events` is ready.
    fn poll(&mut self, events: PollEvents) -> Result<PollEvents> {
        self.poll_with_timeout(events, None)
    }
}

impl<T: NetworkDevice + ?Sized> NetworkDevice for Box<T> {
    fn tx(&mut self, frame: &[u8]) -> Result<()> {
        <T as NetworkDevice>::tx(&mut **self, frame)
    }

    fn rx(&mut self, buf: &mut [u8]) -> Result<usize> {
        <T as NetworkDevice>::rx(&mut **self, buf)
    }

    fn poll_with_timeout(
        &mut self,
        events: PollEvents,
        timeout: Option<Duration>,
    ) -> Result<PollEvents> {
        <T as NetworkDevice>::poll_with_timeout(&mut **self, events, timeout)
    }

    fn poll(&mut self, events: PollEvents) -> Result<PollEvents> {
        <T as NetworkDevice>::poll(&mut **self, events)
    }
}

impl<T: NetworkDevice + ?Sized> NetworkDevice for &mut T {
    fn tx(&mut self, frame: &[u8]) -> Result<()> {
        <T as NetworkDevice>::tx(&mut **self, frame)
    }

    fn rx(&mut self, buf: &mut [u8]) -> Result<usize> {
        <T as NetworkDevice>::rx(&mut **self, buf)
    }

    fn poll_with_timeout(
        &mut self,
        events: PollEvents,
        timeout: Option<Duration>,
    ) -> Result<PollEvents> {
        <T as NetworkDevice>::poll_with_timeout(&mut **self, events, timeout)
    }

    fn poll(&mut self, events: PollEvents) -> Result<PollEvents> {
        <T as NetworkDevice>::poll(&mut **self, events)
    }
}
