//! vde-net: VDE switch backend for virtual network devices
//!
//! Lets a virtual NIC exchange Ethernet frames with a user-space VDE switch.
//! The device exposes three operations to the owning network subsystem:
//!
//! - **tx**: non-blocking send of one frame
//! - **rx**: non-blocking receive of one frame
//! - **poll**: wait for read/write readiness, failing if the switch goes away
//!
//! Switching, forwarding and the switch wire protocol are left to the switch
//! and libvdeplug. Linking against libvdeplug requires the `vde` feature.
//!
//! # Example
//!
//! ```no_run
//! use vde_net::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = VdeConfig::new().switch_path("/tmp/myvde");
//!     let mut dev = vde_net::vde::create(&config)?;
//!
//!     dev.tx(b"ABC")?;
//!
//!     let mut buf = [0u8; 1500];
//!     if dev.poll(PollEvents::RX)?.contains(PollEvents::RX) {
//!         let len = dev.rx(&mut buf)?;
//!         println!("received {} bytes", len);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod netdev;
pub mod pump;
pub mod vde;

// Re-exports for convenience
pub use error::{Error, Result};
pub use netdev::{NetworkDevice, PollEvents};

// Prelude for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::netdev::{NetworkDevice, PollEvents, MAX_FRAME_LEN};
    pub use crate::pump::{FramePump, PumpStats};
    pub use crate::vde::{SwitchConnection, VdeConfig, VdeNetDevice};
}
