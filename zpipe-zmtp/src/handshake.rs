//! ZMTP handshake (greeting + NULL READY exchange), run to completion on the
//! raw stream before the socket reads or writes any message frame.

use bytes::Bytes;
use compio::buf::BufResult;
use compio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use std::io;
use std::time::Duration;
use tracing::debug;

use crate::codec::{encode_frame, ZmtpError, FLAG_COMMAND, FLAG_LONG};
use crate::command::{build_ready, parse_ready};
use crate::greeting::{build_greeting, ZmtpGreeting};
use crate::socket_type::SocketType;

/// READY commands are a few dozen bytes; anything larger is a broken peer.
const MAX_READY_SIZE: usize = 512;

/// Result of a successful handshake
#[derive(Debug)]
pub struct HandshakeResult {
    pub peer_identity: Option<Bytes>,
    pub peer_socket_type: SocketType,
}

/// Perform the handshake, failing with `TimedOut` after `timeout`.
pub async fn perform_handshake_with_timeout<S>(
    stream: &mut S,
    local_socket_type: SocketType,
    timeout: Option<Duration>,
) -> io::Result<HandshakeResult>
where
    S: AsyncRead + AsyncWrite,
{
    match timeout {
        None => perform_handshake(stream, local_socket_type).await,
        Some(dur) => compio::time::timeout(dur, perform_handshake(stream, local_socket_type))
            .await
            .map_err(|_| io::Error::from(ZmtpError::HandshakeTimeout))?,
    }
}

/// Perform the handshake:
/// 1. exchange greetings,
/// 2. exchange READY commands,
/// 3. check the peer's socket type against ours.
pub async fn perform_handshake<S>(
    stream: &mut S,
    local_socket_type: SocketType,
) -> io::Result<HandshakeResult>
where
    S: AsyncRead + AsyncWrite,
{
    let BufResult(res, _) = stream.write_all(build_greeting()).await;
    res?;

    let BufResult(res, greeting) = stream.read_exact([0u8; 64]).await;
    res?;
    let greeting = ZmtpGreeting::parse(&greeting)?;
    debug!(
        major = greeting.major,
        minor = greeting.minor,
        "[HANDSHAKE] {} received peer greeting",
        local_socket_type
    );

    let ready = encode_frame(FLAG_COMMAND, &build_ready(local_socket_type));
    let BufResult(res, _) = stream.write_all(ready).await;
    res?;

    let body = read_command(stream).await?;
    let ready = parse_ready(body)?;

    if !local_socket_type.accepts(ready.socket_type) {
        return Err(ZmtpError::IncompatiblePeer {
            local: local_socket_type,
            peer: ready.socket_type,
        }
        .into());
    }

    debug!(
        "[HANDSHAKE] {} complete, peer is {}",
        local_socket_type, ready.socket_type
    );

    Ok(HandshakeResult {
        peer_identity: ready.identity,
        peer_socket_type: ready.socket_type,
    })
}

/// Read one command frame and return its body.
async fn read_command<S: AsyncRead>(stream: &mut S) -> io::Result<Bytes> {
    let BufResult(res, header) = stream.read_exact([0u8; 2]).await;
    res?;

    let flags = header[0];
    if (flags & FLAG_COMMAND) == 0 {
        return Err(ZmtpError::Command("expected a command frame during handshake").into());
    }

    let body_len = if (flags & FLAG_LONG) != 0 {
        // Long form: header[1] is the first of eight size bytes.
        let BufResult(res, rest) = stream.read_exact([0u8; 7]).await;
        res?;
        let mut size = [0u8; 8];
        size[0] = header[1];
        size[1..].copy_from_slice(&rest);
        usize::try_from(u64::from_be_bytes(size)).unwrap_or(usize::MAX)
    } else {
        usize::from(header[1])
    };

    if body_len > MAX_READY_SIZE {
        return Err(ZmtpError::Command("READY body too large").into());
    }

    let BufResult(res, body) = stream.read_exact(vec![0u8; body_len]).await;
    res?;
    Ok(Bytes::from(body))
}
