//! Content-Format identifiers recognized by this client.
//!
//! VelocityDRIVE-SP assigns its own numeric identifiers for the YANG/CBOR
//! media types (RFC 7252's IANA registry does not cover them); these values
//! are taken from the device's own option usage, not from a public registry.

/// A recognized `Content-Format`/`Accept` option value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentFormat {
    /// `application/yang-instances+cbor`, used for request payloads.
    YangInstancesCbor,
    /// `application/yang-data+cbor-sid`, used for the requested response format.
    YangDataCborSid,
}

impl ContentFormat {
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::YangInstancesCbor => 140,
            Self::YangDataCborSid => 141,
        }
    }

    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            140 => Some(Self::YangInstancesCbor),
            141 => Some(Self::YangDataCborSid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_numeric_value() {
        for format in [ContentFormat::YangInstancesCbor, ContentFormat::YangDataCborSid] {
            assert_eq!(ContentFormat::from_u16(format.as_u16()), Some(format));
        }
    }
}
