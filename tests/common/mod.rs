//! Socketpair-backed switch connection for exercising the VDE device
//! without a running switch.

#![allow(dead_code)]

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::os::unix::net::{UnixDatagram, UnixStream};

use vde_net::vde::{SwitchConnection, VdeNetDevice};

/// Our end of a fake switch: a data channel and a control channel
pub struct PairConnection {
    data: OwnedFd,
    ctl: OwnedFd,
}

impl SwitchConnection for PairConnection {
    fn send(&self, buf: &[u8], flags: libc::c_int) -> io::Result<usize> {
        let ret = unsafe {
            libc::send(
                self.data.as_raw_fd(),
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
                flags,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    fn recv(&self, buf: &mut [u8], flags: libc::c_int) -> io::Result<usize> {
        let ret = unsafe {
            libc::recv(
                self.data.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                flags,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    fn data_fd(&self) -> BorrowedFd<'_> {
        self.data.as_fd()
    }

    fn ctl_fd(&self) -> BorrowedFd<'_> {
        self.ctl.as_fd()
    }
}

/// The switch side of a [`PairConnection`]
pub struct Peer<D> {
    pub data: D,
    pub ctl: UnixStream,
}

/// Device whose data channel is a datagram socket, like libvdeplug's
pub fn datagram_device() -> (VdeNetDevice<PairConnection>, Peer<UnixDatagram>) {
    let (ours, theirs) = UnixDatagram::pair().expect("datagram socketpair");
    let (ctl, peer_ctl) = UnixStream::pair().expect("control socketpair");
    let conn = PairConnection {
        data: OwnedFd::from(ours),
        ctl: OwnedFd::from(ctl),
    };
    (
        VdeNetDevice::new(conn),
        Peer {
            data: theirs,
            ctl: peer_ctl,
        },
    )
}

/// Device whose data channel is a stream socket, so the peer can hang it up
pub fn stream_device() -> (VdeNetDevice<PairConnection>, Peer<UnixStream>) {
    let (ours, theirs) = UnixStream::pair().expect("stream socketpair");
    let (ctl, peer_ctl) = UnixStream::pair().expect("control socketpair");
    let conn = PairConnection {
        data: OwnedFd::from(ours),
        ctl: OwnedFd::from(ctl),
    };
    (
        VdeNetDevice::new(conn),
        Peer {
            data: theirs,
            ctl: peer_ctl,
        },
    )
}
