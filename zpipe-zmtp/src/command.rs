use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::ZmtpError;
use crate::socket_type::SocketType;

const READY: &[u8] = b"READY";

/// Metadata carried by a peer's READY command.
#[derive(Debug, Clone)]
pub struct ReadyCommand {
    pub socket_type: SocketType,
    pub identity: Option<Bytes>,
}

/// Build a READY command body (ZMTP/37).
///
/// Grammar:
/// - 1 byte: command name length
/// - "READY"
/// - Repeated properties:
///   - 1 byte: property name length
///   - property name
///   - 4 bytes: value length (BE)
///   - value
pub fn build_ready(socket_type: SocketType) -> Bytes {
    let mut body = BytesMut::with_capacity(32);
    body.put_u8(READY.len() as u8);
    body.extend_from_slice(READY);
    put_property(&mut body, b"Socket-Type", socket_type.as_str().as_bytes());
    body.freeze()
}

#[inline]
fn put_property(dst: &mut BytesMut, name: &[u8], value: &[u8]) {
    dst.put_u8(name.len() as u8);
    dst.extend_from_slice(name);
    dst.put_u32(value.len() as u32);
    dst.extend_from_slice(value);
}

/// Parse a READY command body. `Socket-Type` is mandatory; unknown
/// properties are skipped.
pub fn parse_ready(body: Bytes) -> Result<ReadyCommand, ZmtpError> {
    let mut buf = body;

    if !buf.has_remaining() {
        return Err(ZmtpError::Command("empty command"));
    }
    let name_len = usize::from(buf.get_u8());
    if buf.remaining() < name_len {
        return Err(ZmtpError::Command("truncated command name"));
    }
    if buf.split_to(name_len).as_ref() != READY {
        return Err(ZmtpError::Command("expected READY"));
    }

    let mut socket_type = None;
    let mut identity = None;

    while buf.has_remaining() {
        let name_len = usize::from(buf.get_u8());
        if buf.remaining() < name_len + 4 {
            return Err(ZmtpError::Command("truncated property"));
        }
        let name = buf.split_to(name_len);
        let value_len = buf.get_u32() as usize;
        if buf.remaining() < value_len {
            return Err(ZmtpError::Command("truncated property value"));
        }
        let value = buf.split_to(value_len);

        // Property names are case-insensitive per ZMTP/37.
        if name.eq_ignore_ascii_case(b"Socket-Type") {
            socket_type = Some(SocketType::from_wire(&value)?);
        } else if name.eq_ignore_ascii_case(b"Identity") {
            identity = Some(value);
        }
    }

    Ok(ReadyCommand {
        socket_type: socket_type.ok_or(ZmtpError::Command("READY without Socket-Type"))?,
        identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_layout() {
        let body = build_ready(SocketType::Pull);
        let mut expected = vec![5];
        expected.extend_from_slice(b"READY");
        expected.push(11);
        expected.extend_from_slice(b"Socket-Type");
        expected.extend_from_slice(&4u32.to_be_bytes());
        expected.extend_from_slice(b"PULL");
        assert_eq!(&body[..], &expected[..]);
    }

    #[test]
    fn test_parse_own_ready() {
        let ready = parse_ready(build_ready(SocketType::Push)).unwrap();
        assert_eq!(ready.socket_type, SocketType::Push);
        assert!(ready.identity.is_none());
    }

    #[test]
    fn test_parse_identity_and_unknown_props() {
        let mut body = BytesMut::new();
        body.put_u8(5);
        body.extend_from_slice(b"READY");
        put_property(&mut body, b"X-Custom", b"ignored");
        put_property(&mut body, b"socket-type", b"PUSH");
        put_property(&mut body, b"Identity", b"w1");

        let ready = parse_ready(body.freeze()).unwrap();
        assert_eq!(ready.socket_type, SocketType::Push);
        assert_eq!(ready.identity, Some(Bytes::from_static(b"w1")));
    }

    #[test]
    fn test_missing_socket_type() {
        let body = Bytes::from_static(b"\x05READY");
        assert!(matches!(parse_ready(body), Err(ZmtpError::Command(_))));
    }

    #[test]
    fn test_wrong_command_name() {
        let body = Bytes::from_static(b"\x05ERROR");
        assert!(parse_ready(body).is_err());
    }

    #[test]
    fn test_truncated_property() {
        let mut body = build_ready(SocketType::Pull).to_vec();
        body.truncate(body.len() - 2);
        assert!(parse_ready(Bytes::from(body)).is_err());
    }
}
