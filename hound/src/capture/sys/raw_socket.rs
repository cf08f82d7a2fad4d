// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
use core::mem;
use std::os::unix::io::{RawFd, AsRawFd};

use libc;
use crate::time::Instant;
use super::{ifreq, linux, Errno, FdResult, IoctlResult, LibcResult, IoLenResult};

use super::linux::IfIndex;

/// A static descriptor for capturing on a raw socket.
///
/// Contains the file descriptor and a pre-filled `ifreq` structure with the interface name that is
/// required for `ioctl` calls.
#[derive(Debug)]
pub struct RawSocketDesc {
    lower: libc::c_int,
    ifreq: ifreq
}

impl AsRawFd for RawSocketDesc {
    fn as_raw_fd(&self) -> RawFd {
        self.lower
    }
}

impl RawSocketDesc {
    /// Try to open a socket for the named interface.
    ///
    /// Note that this does *not* yet bind the interface to the socket, it only creates the
    /// necessary structures involved in doing so. Call [`bind_interface`] afterwards.
    ///
    /// [`bind_interface`]: #method.bind_interface
    pub fn new(name: &str) -> Result<RawSocketDesc, Errno> {
        let lower = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK,
                linux::ETH_P_ALL.to_be() as i32)
        };

        FdResult(lower).errno()?;

        Ok(RawSocketDesc {
            lower,
            ifreq: ifreq::new(name),
        })
    }

    /// Update the file descriptor to the named interface.
    ///
    /// See `bind` with `AF_PACKET` and `ETH_P_ALL` for error and a discussion of platform
    /// requirements and checks.
    pub fn bind_interface(&mut self) -> Result<(), Errno> {
        let sockaddr = libc::sockaddr_ll {
            sll_family:   libc::AF_PACKET as u16,
            sll_protocol: linux::ETH_P_ALL.to_be() as u16,
            sll_ifindex:  self.ifreq.get_if_index(self.lower)?,
            sll_hatype:   1,
            sll_pkttype:  0,
            sll_halen:    6,
            sll_addr:     [0; 8],
        };

        let res = unsafe {
            libc::bind(
                self.lower,
                &sockaddr as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as u32)
        };

        FdResult(res).errno()
    }

    /// Have the kernel stamp every received frame.
    ///
    /// The stamps are read with [`last_timestamp`].
    ///
    /// [`last_timestamp`]: #method.last_timestamp
    pub fn enable_timestamps(&mut self) -> Result<(), Errno> {
        let enable: libc::c_int = 1;
        let res = unsafe {
            libc::setsockopt(
                self.lower,
                libc::SOL_SOCKET,
                libc::SO_TIMESTAMPNS,
                &enable as *const libc::c_int as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t)
        };

        FdResult(res).errno()
    }

    /// The kernel receive time of the last frame returned by [`recv`].
    ///
    /// Fails with `ENOENT` if that frame was not stamped.
    ///
    /// [`recv`]: #method.recv
    pub fn last_timestamp(&self) -> Result<Instant, Errno> {
        let mut stamp = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        let res = unsafe {
            libc::ioctl(self.lower, linux::SIOCGSTAMPNS, &mut stamp as *mut libc::timespec)
        };

        IoctlResult(res).errno()?;

        Ok(instant(&stamp))
    }

    /// Receive a single frame into the buffer.
    ///
    /// Returns the number of octets stored in the buffer and the length of the frame on the
    /// wire, which is larger when the buffer cut the frame short. The socket is non-blocking, a
    /// call without pending frame fails with `EWOULDBLOCK`.
    pub fn recv(&mut self, buffer: &mut [u8]) -> Result<(usize, usize), Errno> {
        let len = unsafe {
            libc::recv(
                self.lower,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
                libc::MSG_TRUNC)
        };
        IoLenResult(len).errno()?;
        let len = len as usize;
        Ok((len.min(buffer.len()), len))
    }
}

fn instant(stamp: &libc::timespec) -> Instant {
    Instant::from_nanos(stamp.tv_sec as i64 * 1_000_000_000 + stamp.tv_nsec as i64)
}

impl Drop for RawSocketDesc {
    fn drop(&mut self) {
        unsafe { libc::close(self.lower); }
    }
}
