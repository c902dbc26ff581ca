//! Frame pump for an owning event loop
//!
//! The device itself never buffers or retries. [`FramePump`] is the thin loop
//! a caller puts around it: wait for readiness, drain every pending frame,
//! and retry a transmit once the data channel is writable again.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::netdev::{NetworkDevice, PollEvents, MAX_FRAME_LEN};
use crate::{Error, Result};

/// Upper bound on frames handled per `drain` call
const MAX_DRAIN_BATCH: usize = 64;

/// Counters kept by a [`FramePump`]
///
/// `tx_frames` / `tx_bytes` count frames the device accepted. A device may
/// accept a frame and still drop it (short or failed sends are not surfaced),
/// so they are not a delivery count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStats {
    pub rx_frames: u64,
    pub rx_bytes: u64,
    pub tx_frames: u64,
    pub tx_bytes: u64,
    /// Transmits that had to wait for the data channel
    pub tx_would_block: u64,
}

/// Drives a [`NetworkDevice`] from a caller's loop
pub struct FramePump<D> {
    dev: D,
    buf: Vec<u8>,
    stats: PumpStats,
}

impl<D: NetworkDevice> FramePump<D> {
    /// Create a pump with a receive buffer of [`MAX_FRAME_LEN`] bytes
    pub fn new(dev: D) -> Self {
        Self::with_frame_len(dev, MAX_FRAME_LEN)
    }

    /// Create a pump with a receive buffer of `frame_len` bytes
    pub fn with_frame_len(dev: D, frame_len: usize) -> Self {
        Self {
            dev,
            buf: vec![0u8; frame_len],
            stats: PumpStats::default(),
        }
    }

    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    pub fn device(&mut self) -> &mut D {
        &mut self.dev
    }

    pub fn into_inner(self) -> D {
        self.dev
    }

    /// Wait for readiness on the device
    pub fn wait(&mut self, events: PollEvents, timeout: Option<Duration>) -> Result<PollEvents> {
        self.dev.poll_with_timeout(events, timeout)
    }

    /// Hand every pending frame (up to a batch limit) to `on_frame`.
    ///
    /// Returns the number of frames delivered; zero means nothing was pending.
    pub fn drain<F>(&mut self, on_frame: F) -> Result<usize>
    where
        F: FnMut(&[u8]),
    {
        self.drain_up_to(MAX_DRAIN_BATCH, on_frame)
    }

    /// Like [`drain`](Self::drain), but stops after `max` frames so nothing
    /// past the caller's limit is pulled off the channel.
    pub fn drain_up_to<F>(&mut self, max: usize, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(&[u8]),
    {
        let max = max.min(MAX_DRAIN_BATCH);
        let mut count = 0;
        while count < max {
            match self.dev.rx(&mut self.buf) {
                Ok(len) => {
                    self.stats.rx_frames += 1;
                    self.stats.rx_bytes += len as u64;
                    on_frame(&self.buf[..len]);
                    count += 1;
                }
                Err(e) if e.is_transient() => break,
                Err(e) => return Err(e),
            }
        }
        if count > 0 {
            trace!("pump: drained {} frames", count);
        }
        Ok(count)
    }

    /// Transmit `frame`, waiting up to `timeout` (`None` = forever) for the
    /// data channel to become writable.
    ///
    /// A timeout too large to represent as a deadline waits forever.
    pub fn send(&mut self, frame: &[u8], timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            match self.dev.tx(frame) {
                Ok(()) => {
                    self.stats.tx_frames += 1;
                    self.stats.tx_bytes += frame.len() as u64;
                    return Ok(());
                }
                Err(Error::WouldBlock) => self.stats.tx_would_block += 1,
                Err(e) => return Err(e),
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!("pump: gave up on {}-byte frame", frame.len());
                        return Err(Error::Timeout(format!(
                            "data channel not writable after {:?}",
                            timeout.unwrap_or_default()
                        )));
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            self.dev.poll_with_timeout(PollEvents::TX, remaining)?;
        }
    }
}
