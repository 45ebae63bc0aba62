//! Descriptors of a content service connection and how to pass them around.
//!
//! A connection uses two descriptors: a bidirectional command channel and a
//! channel reserved for transferring further descriptors. The second one
//! exists because not every transport can attach descriptors to a channel
//! that was set up after the fact.
//!
//! [`send_fds`] and [`recv_fds`] move descriptors across a Unix domain socket
//! with `SCM_RIGHTS` ancillary data.

use std::io;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;
use std::ptr;

/// Most descriptors accepted in a single [`recv_fds`] call.
pub const MAX_FDS_PER_MESSAGE: usize = 8;

/// The two descriptors of a service connection. Dropping this closes both.
#[derive(Debug)]
pub struct ServiceChannels {
    pub command: OwnedFd,
    pub fd_passing: OwnedFd,
}

impl ServiceChannels {
    pub fn new(command: OwnedFd, fd_passing: OwnedFd) -> Self {
        Self { command, fd_passing }
    }

    /// Create two connected socket pairs and return both ends: the first set
    /// stays local, the second is meant for the remote side.
    pub fn socket_pairs() -> io::Result<(ServiceChannels, ServiceChannels)> {
        let (cmd_local, cmd_remote) = UnixStream::pair()?;
        let (pass_local, pass_remote) = UnixStream::pair()?;

        Ok((
            ServiceChannels::new(cmd_local.into(), pass_local.into()),
            ServiceChannels::new(cmd_remote.into(), pass_remote.into()),
        ))
    }

    /// Duplicate both descriptors.
    pub fn try_clone(&self) -> io::Result<ServiceChannels> {
        Ok(ServiceChannels::new(self.command.try_clone()?, self.fd_passing.try_clone()?))
    }

    pub fn command_fd(&self) -> BorrowedFd<'_> {
        self.command.as_fd()
    }

    pub fn fd_passing_fd(&self) -> BorrowedFd<'_> {
        self.fd_passing.as_fd()
    }

    pub fn into_streams(self) -> (UnixStream, UnixStream) {
        (UnixStream::from(self.command), UnixStream::from(self.fd_passing))
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

#[cfg(any(target_os = "linux", target_os = "android"))]
const RECV_FLAGS: libc::c_int = libc::MSG_CMSG_CLOEXEC;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const RECV_FLAGS: libc::c_int = 0;

/// Control buffer sized and aligned for `count` descriptors.
fn control_buffer(count: usize) -> (Vec<u64>, usize) {
    // SAFETY: CMSG_SPACE only does arithmetic on its argument.
    let space = unsafe { libc::CMSG_SPACE((count * mem::size_of::<RawFd>()) as u32) } as usize;
    (vec![0u64; space.div_ceil(mem::size_of::<u64>())], space)
}

/// Send `payload` with `fds` attached. Returns the number of payload bytes written.
///
/// `payload` must not be empty: stream sockets drop ancillary data that comes
/// without at least one byte.
pub fn send_fds(socket: BorrowedFd<'_>, payload: &[u8], fds: &[BorrowedFd<'_>]) -> io::Result<usize> {
    if payload.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "payload must not be empty"));
    }
    if fds.len() > MAX_FDS_PER_MESSAGE {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "too many descriptors"));
    }

    let mut iov = libc::iovec {
        iov_base: payload.as_ptr() as *mut libc::c_void,
        iov_len: payload.len(),
    };

    // SAFETY: an all-zero msghdr is a valid empty message.
    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;

    let (mut control, space) = control_buffer(fds.len());
    if !fds.is_empty() {
        msg.msg_control = control.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = space as _;

        // SAFETY: msg_control points at a zeroed, aligned buffer of CMSG_SPACE(n)
        // bytes, which holds exactly one header plus n descriptors.
        unsafe {
            let cmsg = libc::CMSG_FIRSTHDR(&msg);
            (*cmsg).cmsg_level = libc::SOL_SOCKET;
            (*cmsg).cmsg_type = libc::SCM_RIGHTS;
            (*cmsg).cmsg_len = libc::CMSG_LEN((fds.len() * mem::size_of::<RawFd>()) as u32) as _;

            let data = libc::CMSG_DATA(cmsg) as *mut RawFd;
            for (i, fd) in fds.iter().enumerate() {
                ptr::write_unaligned(data.add(i), fd.as_raw_fd());
            }
        }
    }

    // SAFETY: msg and everything it points to outlive the call.
    let sent = unsafe { libc::sendmsg(socket.as_raw_fd(), &msg, SEND_FLAGS) };
    if sent < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(sent as usize)
}

/// Receive into `buf` and collect any descriptors that came along.
///
/// Returns the number of payload bytes read (0 on EOF) and the descriptors,
/// which are owned by the caller from here on.
pub fn recv_fds(socket: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<(usize, Vec<OwnedFd>)> {
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr() as *mut libc::c_void,
        iov_len: buf.len(),
    };

    let (mut control, space) = control_buffer(MAX_FDS_PER_MESSAGE);

    // SAFETY: an all-zero msghdr is a valid empty message.
    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    msg.msg_control = control.as_mut_ptr() as *mut libc::c_void;
    msg.msg_controllen = space as _;

    // SAFETY: msg and its buffers are valid for writes of the advertised sizes.
    let received = unsafe { libc::recvmsg(socket.as_raw_fd(), &mut msg, RECV_FLAGS) };
    if received < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut fds = Vec::new();
    // SAFETY: the kernel filled msg_control with well-formed headers up to
    // msg_controllen; every descriptor in an SCM_RIGHTS payload is new and ours.
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(&msg);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_SOCKET && (*cmsg).cmsg_type == libc::SCM_RIGHTS {
                let header = libc::CMSG_LEN(0) as usize;
                let count = ((*cmsg).cmsg_len as usize - header) / mem::size_of::<RawFd>();
                let data = libc::CMSG_DATA(cmsg) as *const RawFd;
                for i in 0..count {
                    let raw = ptr::read_unaligned(data.add(i));
                    fds.push(OwnedFd::from_raw_fd(raw));
                }
            }
            cmsg = libc::CMSG_NXTHDR(&msg, cmsg);
        }
    }

    if msg.msg_flags & libc::MSG_CTRUNC != 0 {
        // Whatever made it through is closed again when `fds` drops.
        return Err(io::Error::new(io::ErrorKind::InvalidData, "descriptor message truncated"));
    }

    Ok((received as usize, fds))
}
