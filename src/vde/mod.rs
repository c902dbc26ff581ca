//! VDE switch backend
//!
//! Connects a virtual NIC to a user-space VDE switch through libvdeplug.
//! The real connection needs the `vde` cargo feature; without it [`create`]
//! always fails with [`Error::Unsupported`].

pub mod config;
pub mod connection;
pub mod device;
#[cfg(feature = "vde")]
pub mod plug;

use std::path::Path;

use tracing::error;

pub use config::VdeConfig;
pub use connection::SwitchConnection;
pub use device::VdeNetDevice;
#[cfg(feature = "vde")]
pub use plug::VdePlug;

use crate::netdev::NetworkDevice;
use crate::{Error, Result};

#[cfg(feature = "vde")]
impl VdeNetDevice<VdePlug> {
    /// Connect to the switch described by `config`
    pub fn open(config: &VdeConfig) -> Result<Self> {
        VdePlug::open(config).map(Self::new)
    }
}

/// Create a network device connected to a VDE switch.
#[cfg(feature = "vde")]
pub fn create(config: &VdeConfig) -> Result<Box<dyn NetworkDevice>> {
    match VdeNetDevice::open(config) {
        Ok(dev) => Ok(Box::new(dev)),
        Err(e) => {
            error!("vde: cannot create device for {}: {}", config.display_path(), e);
            Err(e)
        }
    }
}

/// Create a network device connected to a VDE switch.
#[cfg(not(feature = "vde"))]
pub fn create(config: &VdeConfig) -> Result<Box<dyn NetworkDevice>> {
    error!(
        "vde: cannot create device for {}: VDE support not compiled in",
        config.display_path()
    );
    Err(Error::Unsupported)
}

/// Create a device with default parameters, reporting failure on stderr.
///
/// `None` is the only failure signal; use [`create`] to inspect the error.
pub fn create_or_report(switch_path: Option<&Path>) -> Option<Box<dyn NetworkDevice>> {
    let mut config = VdeConfig::new();
    if let Some(path) = switch_path {
        config = config.switch_path(path);
    }

    match create(&config) {
        Ok(dev) => Some(dev),
        Err(e) => {
            eprintln!("{}", failure_line(&e));
            None
        }
    }
}

fn failure_line(e: &Error) -> String {
    match e {
        Error::Allocation(_) => "Failed to allocate memory.".to_string(),
        Error::Unsupported => format!("lkl: {}", e),
        other => other.to_string(),
    }
}
