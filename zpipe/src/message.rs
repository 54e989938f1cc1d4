//! The benchmark message: `[sender id, sequence number, blob]`.

use bytes::Bytes;

/// Message template built once and re-stamped with a sequence number per
/// send. The blob is shared between sends; only the two 8-byte integer
/// frames are rebuilt.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    sender_id: Bytes,
    sequence: u64,
    blob: Bytes,
}

impl MessageTemplate {
    /// Build a template with a zero-filled blob of `payload_size` bytes.
    pub fn new(sender_id: u64, payload_size: usize) -> Self {
        Self {
            sender_id: encode_u64(sender_id),
            sequence: 0,
            blob: Bytes::from(vec![0u8; payload_size]),
        }
    }

    #[inline]
    pub fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Total bytes put on the wire per message (frame bodies only).
    pub fn wire_size(&self) -> usize {
        self.sender_id.len() + 8 + self.blob.len()
    }

    /// The frames of the current message.
    pub fn frames(&self) -> Vec<Bytes> {
        vec![
            self.sender_id.clone(),
            encode_u64(self.sequence),
            self.blob.clone(),
        ]
    }
}

fn encode_u64(value: u64) -> Bytes {
    Bytes::copy_from_slice(&value.to_be_bytes())
}

/// Read an 8-byte big-endian integer frame.
pub fn decode_u64(frame: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = frame.try_into().ok()?;
    Some(u64::from_be_bytes(raw))
}
