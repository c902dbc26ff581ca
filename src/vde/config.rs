//! Open parameters for a VDE switch connection

use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Logical name the switch shows for our end of the connection
pub const DEFAULT_DESCRIPTION: &str = "lkl-virtio-net";

/// Owner-only access to the switch port
pub const DEFAULT_MODE: u32 = 0o700;

/// Configuration for connecting to a VDE switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VdeConfig {
    /// Switch control socket (libvdeplug default if not specified)
    pub switch_path: Option<PathBuf>,
    /// Client identifier (default: "lkl-virtio-net")
    pub description: String,
    /// Switch port, 0 lets the switch pick one
    pub port: i32,
    /// Group owning the port
    pub group: Option<String>,
    /// Permission mode of the port (default: 0700)
    pub mode: u32,
}

impl Default for VdeConfig {
    fn default() -> Self {
        Self {
            switch_path: None,
            description: DEFAULT_DESCRIPTION.to_string(),
            port: 0,
            group: None,
            mode: DEFAULT_MODE,
        }
    }
}

impl VdeConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: VdeConfig = serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid YAML config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the switch path
    pub fn switch_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.switch_path = Some(path.into());
        self
    }

    /// Set the client identifier
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Set the switch port
    pub fn port(mut self, port: i32) -> Self {
        self.port = port;
        self
    }

    /// Set the group owning the port
    pub fn group<S: Into<String>>(mut self, group: S) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the port permission mode
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Switch path for log and error messages
    pub fn display_path(&self) -> String {
        match &self.switch_path {
            Some(path) => path.display().to_string(),
            None => "<default>".to_string(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.description.is_empty() {
            return Err(Error::Config("description must not be empty".into()));
        }
        if self.description.as_bytes().contains(&0) {
            return Err(Error::Config("description must not contain NUL".into()));
        }
        if self.port < 0 {
            return Err(Error::Config(format!("invalid switch port {}", self.port)));
        }
        if self.mode > 0o7777 {
            return Err(Error::Config(format!("invalid mode {:o}", self.mode)));
        }
        if let Some(ref group) = self.group {
            if group.is_empty() || group.as_bytes().contains(&0) {
                return Err(Error::Config(format!("invalid group {:?}", group)));
            }
        }
        Ok(())
    }

    /// Owned, NUL-terminated copy of the switch path.
    ///
    /// libvdeplug takes a mutable `char *`, so the path is never handed over
    /// borrowed. The copy is allocated fallibly.
    pub(crate) fn switch_path_c(&self) -> Result<Option<CString>> {
        match &self.switch_path {
            Some(path) => copy_c_string(path.as_os_str().as_bytes()).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn description_c(&self) -> Result<CString> {
        copy_c_string(self.description.as_bytes())
    }

    pub(crate) fn group_c(&self) -> Result<Option<CString>> {
        match &self.group {
            Some(group) => copy_c_string(group.as_bytes()).map(Some),
            None => Ok(None),
        }
    }
}

fn copy_c_string(bytes: &[u8]) -> Result<CString> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes.len() + 1)?;
    buf.extend_from_slice(bytes);
    // Capacity already covers the terminator, so CString::new won't reallocate.
    CString::new(buf).map_err(|e| {
        Error::InvalidPath(format!(
            "{:?} contains NUL at byte {}",
            String::from_utf8_lossy(bytes),
            e.nul_position()
        ))
    })
}
