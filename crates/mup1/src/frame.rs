use crate::checksum::{checksum16, format_checksum};
use crate::escape::escape;

/// The five MUP1 frame types the client exchanges with the device.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FrameKind {
    /// `'p'` — host-to-device readiness probe.
    Ping,
    /// `'P'` — device-to-host readiness notification.
    Announce,
    /// `'c'` — CoAP request, carried host-to-device.
    CoapRequest,
    /// `'C'` — CoAP response, carried device-to-host.
    CoapResponse,
    /// `'T'` — device debug text, informational only.
    Trace,
}

impl FrameKind {
    /// The on-wire type byte for this frame kind.
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Ping => b'p',
            Self::Announce => b'P',
            Self::CoapRequest => b'c',
            Self::CoapResponse => b'C',
            Self::Trace => b'T',
        }
    }

    /// Maps a wire type byte to a known frame kind, if recognized.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'p' => Some(Self::Ping),
            b'P' => Some(Self::Announce),
            b'c' => Some(Self::CoapRequest),
            b'C' => Some(Self::CoapResponse),
            b'T' => Some(Self::Trace),
            _ => None,
        }
    }
}

/// A decoded MUP1 frame: a raw type byte plus its unescaped payload.
///
/// The type byte is kept raw (rather than a `FrameKind`) because the
/// reassembler never rejects a frame purely for carrying an unrecognized
/// type; dispatch on unknown types is a caller concern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    frame_type: u8,
    payload: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(frame_type: u8, payload: Vec<u8>) -> Self {
        Self { frame_type, payload }
    }

    /// The raw wire type byte.
    #[must_use]
    pub const fn frame_type(&self) -> u8 {
        self.frame_type
    }

    /// The recognized [`FrameKind`], if the type byte matches one.
    #[must_use]
    pub const fn kind(&self) -> Option<FrameKind> {
        FrameKind::from_byte(self.frame_type)
    }

    /// The frame's unescaped payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the frame, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Builds the on-wire bytes for a MUP1 frame of the given `frame_type` and
/// `payload`.
///
/// The checksum is computed over the canonical (unescaped) form; the bytes
/// actually emitted carry the escaped payload. A second trailing `<` is
/// emitted when `payload` has even length, matching the device's own framing
/// so a byte-level capture of this client's traffic matches production
/// VelocityDRIVE-SP tooling.
#[must_use]
pub fn build(frame_type: u8, payload: &[u8]) -> Vec<u8> {
    let double_lt = payload.len() % 2 == 0;

    let mut canonical = Vec::with_capacity(payload.len() + 4);
    canonical.push(b'>');
    canonical.push(frame_type);
    canonical.extend_from_slice(payload);
    canonical.push(b'<');
    if double_lt {
        canonical.push(b'<');
    }
    let checksum = checksum16(&canonical);

    let mut wire = Vec::with_capacity(canonical.len() + payload.len());
    wire.push(b'>');
    wire.push(frame_type);
    wire.extend(escape(payload));
    wire.push(b'<');
    if double_lt {
        wire.push(b'<');
    }
    wire.extend_from_slice(&format_checksum(checksum));

    tracing::debug!(frame_type = frame_type as char, payload_len = payload.len(), "built mup1 frame");
    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_frame_matches_literal_wire_bytes() {
        // Scenario 1 in the spec: `3E 70 3C 3C` + checksum for an empty ping.
        let frame = build(FrameKind::Ping.byte(), &[]);
        assert_eq!(&frame[..4], &[0x3E, 0x70, 0x3C, 0x3C]);
        assert_eq!(frame.len(), 8);
    }

    #[test]
    fn odd_length_payload_emits_single_angle_bracket() {
        let frame = build(FrameKind::CoapRequest.byte(), b"abc");
        // '>' 'c' "abc" '<' + 4 hex chars, no doubled '<'.
        assert_eq!(frame.len(), 1 + 1 + 3 + 1 + 4);
        assert_eq!(frame[frame.len() - 5], b'<');
    }

    #[test]
    fn even_length_payload_emits_doubled_angle_bracket() {
        let frame = build(FrameKind::CoapRequest.byte(), b"abcd");
        assert_eq!(&frame[frame.len() - 6..frame.len() - 4], b"<<");
    }

    #[test]
    fn frame_kind_round_trips_through_byte() {
        for kind in [
            FrameKind::Ping,
            FrameKind::Announce,
            FrameKind::CoapRequest,
            FrameKind::CoapResponse,
            FrameKind::Trace,
        ] {
            assert_eq!(FrameKind::from_byte(kind.byte()), Some(kind));
        }
    }
}
