use crate::codec::ZmtpError;

/// ZMTP Greeting is always exactly 64 bytes
pub const GREETING_SIZE: usize = 64;

const SIGNATURE_HEAD: u8 = 0xFF;
const SIGNATURE_TAIL: u8 = 0x7F;
const MECHANISM_OFFSET: usize = 12;
const MECHANISM_LEN: usize = 20;

/// Build our greeting: ZMTP 3.0, NULL mechanism.
///
/// Layout (ZMTP 3.x):
/// ```text
/// [0]      0xFF
/// [1..9]   Padding
/// [9]      0x7F
/// [10]     Major version
/// [11]     Minor version
/// [12..32] Mechanism (ASCII, null-padded)
/// [32]     As-Server flag
/// [33..64] Padding
/// ```
///
/// Version 3.0 is announced so libzmq 4.1+ peers accept it.
#[must_use]
pub fn build_greeting() -> [u8; GREETING_SIZE] {
    let mut g = [0u8; GREETING_SIZE];
    g[0] = SIGNATURE_HEAD;
    g[9] = SIGNATURE_TAIL;
    g[10] = 3;
    g[11] = 0;
    g[MECHANISM_OFFSET..MECHANISM_OFFSET + 4].copy_from_slice(b"NULL");
    g
}

/// Parsed peer greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmtpGreeting {
    pub major: u8,
    pub minor: u8,
}

impl ZmtpGreeting {
    /// Parse and validate a peer greeting.
    ///
    /// Any 3.x version is accepted. The mechanism must be NULL since no
    /// security mechanism is implemented.
    pub fn parse(src: &[u8]) -> Result<Self, ZmtpError> {
        if src.len() < GREETING_SIZE {
            return Err(ZmtpError::Incomplete);
        }
        if src[0] != SIGNATURE_HEAD || src[9] != SIGNATURE_TAIL {
            return Err(ZmtpError::Greeting("bad signature"));
        }

        let major = src[10];
        if major < 3 {
            return Err(ZmtpError::Greeting("peer speaks ZMTP < 3.0"));
        }

        let mech_raw = &src[MECHANISM_OFFSET..MECHANISM_OFFSET + MECHANISM_LEN];
        let mechanism = std::str::from_utf8(mech_raw)
            .map_err(|_| ZmtpError::Greeting("mechanism is not ASCII"))?
            .trim_end_matches(char::from(0));
        if mechanism != "NULL" {
            return Err(ZmtpError::UnsupportedMechanism(mechanism.to_string()));
        }

        Ok(Self {
            major,
            minor: src[11],
        })
    }
}
