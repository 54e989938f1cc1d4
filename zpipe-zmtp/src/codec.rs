use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use zpipe_core::buffer::SegmentedBuffer;

use crate::socket_type::SocketType;

/// ZMTP frame flags
pub const FLAG_MORE: u8 = 0x01;
pub const FLAG_LONG: u8 = 0x02;
pub const FLAG_COMMAND: u8 = 0x04;

const RESERVED_BITS: u8 = 0xF8;
const SHORT_HEADER_LEN: usize = 2;
const LONG_HEADER_LEN: usize = 9;

/// ZMTP protocol errors
#[derive(Debug, Error)]
pub enum ZmtpError {
    #[error("Incomplete frame")]
    Incomplete,

    #[error("Protocol violation: reserved bits set")]
    ReservedBits,

    #[error("Protocol violation: frame size too large")]
    SizeTooLarge,

    #[error("Invalid greeting: {0}")]
    Greeting(&'static str),

    #[error("Unsupported security mechanism: {0}")]
    UnsupportedMechanism(String),

    #[error("Malformed command: {0}")]
    Command(&'static str),

    #[error("Incompatible peer: {local} cannot talk to {peer}")]
    IncompatiblePeer { local: SocketType, peer: SocketType },

    #[error("Handshake timed out")]
    HandshakeTimeout,
}

/// Result type alias for ZMTP operations
pub type Result<T> = std::result::Result<T, ZmtpError>;

impl From<ZmtpError> for std::io::Error {
    fn from(e: ZmtpError) -> Self {
        let kind = match e {
            ZmtpError::HandshakeTimeout => std::io::ErrorKind::TimedOut,
            _ => std::io::ErrorKind::InvalidData,
        };
        Self::new(kind, e)
    }
}

/// A decoded ZMTP frame
#[derive(Debug, Clone)]
pub struct ZmtpFrame {
    pub flags: u8,
    pub payload: Bytes,
}

impl ZmtpFrame {
    #[inline]
    pub const fn more(&self) -> bool {
        (self.flags & FLAG_MORE) != 0
    }

    #[inline]
    pub const fn is_command(&self) -> bool {
        (self.flags & FLAG_COMMAND) != 0
    }
}

/// Append a frame header (flags + size) to `dst`.
///
/// The LONG flag is derived from `body_len`; the caller only passes MORE /
/// COMMAND. The body is written separately so large payloads are never
/// copied.
pub fn put_frame_header(dst: &mut BytesMut, flags: u8, body_len: usize) {
    if body_len <= usize::from(u8::MAX) {
        dst.put_u8(flags & !FLAG_LONG);
        dst.put_u8(body_len as u8);
    } else {
        dst.put_u8(flags | FLAG_LONG);
        dst.put_u64(body_len as u64);
    }
}

/// Encode a complete frame (header + body). Used for small command frames.
pub fn encode_frame(flags: u8, body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(LONG_HEADER_LEN + body.len());
    put_frame_header(&mut out, flags, body.len());
    out.extend_from_slice(body);
    out.freeze()
}

/// Stateful ZMTP decoder.
///
/// The header is consumed as soon as it is complete; the decoder then waits
/// until the whole body is buffered and hands it out as one `Bytes`.
#[derive(Debug, Default)]
pub struct ZmtpDecoder {
    pending: Option<(u8, usize)>,
}

impl ZmtpDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Decode a single frame from `src`.
    ///
    /// Returns:
    /// - Ok(Some(frame)) → frame decoded
    /// - Ok(None) → need more data
    /// - Err → protocol violation
    pub fn decode(&mut self, src: &mut SegmentedBuffer) -> Result<Option<ZmtpFrame>> {
        let (flags, body_len) = match self.pending {
            Some(header) => header,
            None => match Self::decode_header(src)? {
                Some(header) => header,
                None => return Ok(None),
            },
        };

        match src.split_to(body_len) {
            Some(payload) => {
                self.pending = None;
                Ok(Some(ZmtpFrame { flags, payload }))
            }
            None => {
                self.pending = Some((flags, body_len));
                Ok(None)
            }
        }
    }

    /// Whether a header has been consumed and its body is still incomplete.
    #[inline]
    pub const fn mid_frame(&self) -> bool {
        self.pending.is_some()
    }

    fn decode_header(src: &mut SegmentedBuffer) -> Result<Option<(u8, usize)>> {
        let mut header = [0u8; LONG_HEADER_LEN];
        if !src.peek(&mut header[..SHORT_HEADER_LEN]) {
            return Ok(None);
        }

        let flags = header[0];
        if (flags & RESERVED_BITS) != 0 {
            return Err(ZmtpError::ReservedBits);
        }

        if (flags & FLAG_LONG) == 0 {
            src.advance(SHORT_HEADER_LEN);
            return Ok(Some((flags, usize::from(header[1]))));
        }

        if !src.peek(&mut header) {
            return Ok(None);
        }
        let mut size = [0u8; 8];
        size.copy_from_slice(&header[1..]);
        let size = u64::from_be_bytes(size);

        // MSB must be zero in ZMTP 3.x
        if size > i64::MAX as u64 {
            return Err(ZmtpError::SizeTooLarge);
        }
        let body_len = usize::try_from(size).map_err(|_| ZmtpError::SizeTooLarge)?;

        src.advance(LONG_HEADER_LEN);
        Ok(Some((flags, body_len)))
    }
}
