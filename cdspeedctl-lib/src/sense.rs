//! Fixed-format sense data returned by the pass-through driver.
//!
//! Only the fields useful for a diagnostic line are decoded.

use bitfield::bitfield;
use std::fmt;
use strum::{Display, FromRepr};

/// Bytes needed to reach ASC/ASCQ in fixed format.
pub const FIXED_MIN_LEN: usize = 14;

bitfield! {
    /// Byte 0 of fixed-format sense data.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ResponseByte(u8);
    impl Debug;
    pub valid, _: 7;
    pub u8, response_code, _: 6, 0;
}

bitfield! {
    /// Byte 2 of fixed-format sense data.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct SenseFlags(u8);
    impl Debug;
    pub filemark, _: 7;
    pub eom, _: 6;
    pub ili, _: 5;
    pub u8, sense_key, _: 3, 0;
}

/// SPC sense keys.
#[repr(u8)]
#[derive(Debug, Display, FromRepr, Clone, Copy, PartialEq, Eq)]
pub enum SenseKey {
    #[strum(to_string = "NO SENSE")]
    NoSense = 0x0,
    #[strum(to_string = "RECOVERED ERROR")]
    RecoveredError = 0x1,
    #[strum(to_string = "NOT READY")]
    NotReady = 0x2,
    #[strum(to_string = "MEDIUM ERROR")]
    MediumError = 0x3,
    #[strum(to_string = "HARDWARE ERROR")]
    HardwareError = 0x4,
    #[strum(to_string = "ILLEGAL REQUEST")]
    IllegalRequest = 0x5,
    #[strum(to_string = "UNIT ATTENTION")]
    UnitAttention = 0x6,
    #[strum(to_string = "DATA PROTECT")]
    DataProtect = 0x7,
    #[strum(to_string = "BLANK CHECK")]
    BlankCheck = 0x8,
    #[strum(to_string = "VENDOR SPECIFIC")]
    VendorSpecific = 0x9,
    #[strum(to_string = "COPY ABORTED")]
    CopyAborted = 0xA,
    #[strum(to_string = "ABORTED COMMAND")]
    AbortedCommand = 0xB,
    #[strum(to_string = "VOLUME OVERFLOW")]
    VolumeOverflow = 0xD,
    #[strum(to_string = "MISCOMPARE")]
    Miscompare = 0xE,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    pub response: ResponseByte,
    pub flags: SenseFlags,
    pub asc: u8,
    pub ascq: u8,
}

impl SenseData {
    /// Decode the first `len` bytes the driver wrote into the sense buffer.
    ///
    /// Returns `None` when nothing was written or the buffer is not in fixed
    /// format (response codes 0x70/0x71).
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < 3 {
            return None;
        }
        let response = ResponseByte(buf[0]);
        if !matches!(response.response_code(), 0x70 | 0x71) {
            return None;
        }
        let (asc, ascq) = if buf.len() >= FIXED_MIN_LEN {
            (buf[12], buf[13])
        } else {
            (0, 0)
        };
        Some(Self {
            response,
            flags: SenseFlags(buf[2]),
            asc,
            ascq,
        })
    }

    pub fn sense_key(&self) -> Option<SenseKey> {
        SenseKey::from_repr(self.flags.sense_key())
    }
}

impl fmt::Debug for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenseData")
            .field("response_code", &format_args!("0x{:02X}", self.response.response_code()))
            .field("sense_key", &format_args!("0x{:X}", self.flags.sense_key()))
            .field("asc", &format_args!("0x{:02X}", self.asc))
            .field("ascq", &format_args!("0x{:02X}", self.ascq))
            .finish()
    }
}

impl fmt::Display for SenseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sense_key() {
            Some(key) => write!(f, "sense key = 0x{:x} ({key})", self.flags.sense_key())?,
            None => write!(f, "sense key = 0x{:x}", self.flags.sense_key())?,
        }
        write!(f, ", asc = 0x{:02x}, ascq = 0x{:02x}", self.asc, self.ascq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_illegal_request() {
        let mut buf = [0u8; 32];
        buf[0] = 0x70;
        buf[2] = 0x05;
        buf[7] = 10;
        buf[12] = 0x24;
        buf[13] = 0x00;

        let sense = SenseData::parse(&buf).unwrap();
        assert_eq!(sense.sense_key(), Some(SenseKey::IllegalRequest));
        assert_eq!(sense.asc, 0x24);
        assert_eq!(sense.ascq, 0x00);
        assert!(!sense.flags.ili());
        assert_eq!(
            sense.to_string(),
            "sense key = 0x5 (ILLEGAL REQUEST), asc = 0x24, ascq = 0x00"
        );
    }

    #[test]
    fn empty_or_descriptor_format_is_ignored() {
        assert!(SenseData::parse(&[]).is_none());
        assert!(SenseData::parse(&[0u8; 32]).is_none());

        let mut descriptor = [0u8; 32];
        descriptor[0] = 0x72;
        assert!(SenseData::parse(&descriptor).is_none());
    }
}
