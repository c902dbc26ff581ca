//! libvdeplug binding
//!
//! Only compiled with the `vde` feature; links against `-lvdeplug`.

use std::ffi::{c_char, c_int, c_void, CString};
use std::fmt;
use std::io;
use std::os::fd::BorrowedFd;
use std::ptr::{self, NonNull};

use tracing::debug;

use super::config::VdeConfig;
use super::connection::SwitchConnection;
use crate::{Error, Result};

/// `vde_open` is a macro over `vde_open_real` with this version baked in
const LIBVDEPLUG_INTERFACE_VERSION: c_int = 1;

#[repr(C)]
struct VdeConn {
    _private: [u8; 0],
}

#[repr(C)]
struct VdeOpenArgs {
    port: c_int,
    group: *mut c_char,
    mode: libc::mode_t,
}

#[link(name = "vdeplug")]
extern "C" {
    fn vde_open_real(
        vde_switch: *mut c_char,
        descr: *mut c_char,
        interface_version: c_int,
        open_args: *mut VdeOpenArgs,
    ) -> *mut VdeConn;
    fn vde_send(conn: *mut VdeConn, buf: *const c_void, len: libc::size_t, flags: c_int)
        -> libc::ssize_t;
    fn vde_recv(conn: *mut VdeConn, buf: *mut c_void, len: libc::size_t, flags: c_int)
        -> libc::ssize_t;
    fn vde_datafd(conn: *mut VdeConn) -> c_int;
    fn vde_ctlfd(conn: *mut VdeConn) -> c_int;
    fn vde_close(conn: *mut VdeConn) -> c_int;
}

/// An open libvdeplug connection. Closed on drop.
pub struct VdePlug {
    conn: NonNull<VdeConn>,
}

// The connection is exclusively owned and only used from one thread at a time.
unsafe impl Send for VdePlug {}

impl VdePlug {
    /// Connect to the switch described by `config`
    pub fn open(config: &VdeConfig) -> Result<Self> {
        config.validate()?;

        // libvdeplug declares its string parameters as `char *`, so hand it
        // buffers we own rather than casting away const.
        let mut switch_path = config.switch_path_c()?.map(CString::into_bytes_with_nul);
        let mut description = config.description_c()?.into_bytes_with_nul();
        let mut group = config.group_c()?.map(CString::into_bytes_with_nul);

        let mut open_args = VdeOpenArgs {
            port: config.port,
            group: group
                .as_mut()
                .map_or(ptr::null_mut(), |g| g.as_mut_ptr() as *mut c_char),
            mode: config.mode as libc::mode_t,
        };
        let switch_ptr = switch_path
            .as_mut()
            .map_or(ptr::null_mut(), |p| p.as_mut_ptr() as *mut c_char);

        let raw = unsafe {
            vde_open_real(
                switch_ptr,
                description.as_mut_ptr() as *mut c_char,
                LIBVDEPLUG_INTERFACE_VERSION,
                &mut open_args,
            )
        };

        let conn = NonNull::new(raw).ok_or_else(|| Error::Connection {
            path: config.display_path(),
            source: io::Error::last_os_error(),
        })?;

        let plug = Self { conn };
        debug!(
            "vde: connected to {} as {:?} (data fd {}, ctl fd {})",
            config.display_path(),
            config.description,
            unsafe { vde_datafd(plug.conn.as_ptr()) },
            unsafe { vde_ctlfd(plug.conn.as_ptr()) },
        );
        Ok(plug)
    }
}

impl SwitchConnection for VdePlug {
    fn send(&self, buf: &[u8], flags: c_int) -> io::Result<usize> {
        let ret = unsafe {
            vde_send(self.conn.as_ptr(), buf.as_ptr() as *const c_void, buf.len(), flags)
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    fn recv(&self, buf: &mut [u8], flags: c_int) -> io::Result<usize> {
        let ret = unsafe {
            vde_recv(self.conn.as_ptr(), buf.as_mut_ptr() as *mut c_void, buf.len(), flags)
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    fn data_fd(&self) -> BorrowedFd<'_> {
        // Valid for as long as the connection is open, i.e. while `self` lives.
        unsafe { BorrowedFd::borrow_raw(vde_datafd(self.conn.as_ptr())) }
    }

    fn ctl_fd(&self) -> BorrowedFd<'_> {
        unsafe { BorrowedFd::borrow_raw(vde_ctlfd(self.conn.as_ptr())) }
    }
}

impl fmt::Debug for VdePlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VdePlug")
            .field("data_fd", &unsafe { vde_datafd(self.conn.as_ptr()) })
            .field("ctl_fd", &unsafe { vde_ctlfd(self.conn.as_ptr()) })
            .finish()
    }
}

impl Drop for VdePlug {
    fn drop(&mut self) {
        unsafe {
            vde_close(self.conn.as_ptr());
        }
    }
}
