//! TCP tuning for `compio` streams.
//!
//! `compio::net::TcpStream` does not expose every socket option, so the raw
//! descriptor is borrowed into a `socket2::Socket` that is never dropped.

#![allow(unsafe_code)]

use std::io;
use std::mem::ManuallyDrop;

/// Disable Nagle's algorithm on a connected stream.
///
/// Frame headers are written separately from large bodies; without
/// TCP_NODELAY the small header writes would wait for delayed ACKs.
///
/// # Errors
///
/// Returns an error if the socket option cannot be set.
pub fn enable_tcp_nodelay(stream: &compio::net::TcpStream) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::io::{AsRawFd, FromRawFd};
        // SAFETY: the fd stays owned by `stream`; ManuallyDrop keeps socket2
        // from closing it.
        let sock = ManuallyDrop::new(unsafe { socket2::Socket::from_raw_fd(stream.as_raw_fd()) });
        sock.set_nodelay(true)
    }

    #[cfg(windows)]
    {
        use std::os::windows::io::{AsRawSocket, FromRawSocket};
        // SAFETY: as above, the socket handle stays owned by `stream`.
        let sock =
            ManuallyDrop::new(unsafe { socket2::Socket::from_raw_socket(stream.as_raw_socket()) });
        sock.set_nodelay(true)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = stream;
        Ok(())
    }
}
