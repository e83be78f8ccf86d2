//! Raw event frames as delivered by the transport

use crate::error::{EventError, Result};

/// One notification as the device reports it
///
/// Wire layout is three little-endian `u32`: event code, subject, param.
/// The subject is a property id, an object id or state data depending on
/// the channel of the event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFrame {
    pub event: u32,
    pub subject: u32,
    pub param: u32,
}

impl RawFrame {
    pub const ENCODED_LEN: usize = 12;

    pub const fn new(event: u32, subject: u32, param: u32) -> Self {
        Self {
            event,
            subject,
            param,
        }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..4].copy_from_slice(&self.event.to_le_bytes());
        out[4..8].copy_from_slice(&self.subject.to_le_bytes());
        out[8..12].copy_from_slice(&self.param.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; Self::ENCODED_LEN] = bytes
            .try_into()
            .map_err(|_| EventError::MalformedFrame { len: bytes.len() })?;
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Ok(Self {
            event: word(0),
            subject: word(4),
            param: word(8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout_is_little_endian() {
        let frame = RawFrame::new(0x101, 0x402, 7);
        let bytes = frame.encode();
        assert_eq!(&bytes[0..4], &[0x01, 0x01, 0, 0]);
        assert_eq!(&bytes[4..8], &[0x02, 0x04, 0, 0]);
        assert_eq!(RawFrame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let err = RawFrame::decode(&[0u8; 11]).unwrap_err();
        assert!(matches!(err, EventError::MalformedFrame { len: 11 }));
    }
}
