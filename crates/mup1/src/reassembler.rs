use crate::checksum::{checksum16, parse_checksum};
use crate::escape::{find_unescaped_lt, unescape};
use crate::frame::Frame;

/// Bytes buffered without yielding a frame before the reassembler resyncs by
/// dropping a byte, guarding against unbounded growth from a noisy line.
const RESYNC_BOUND: usize = 1024;

/// Minimum bytes needed to attempt a parse: `>` + type + `<` + 4 hex digits.
const MIN_FRAME_LEN: usize = 7;

/// Stateful MUP1 stream reassembler.
///
/// Owns a growable buffer of bytes that have arrived but not yet formed a
/// complete, checksum-valid frame. [`feed`](Self::feed) is the only mutator;
/// it is synchronous and never blocks, matching the transport's cooperative
/// scheduling model (frames are assembled between suspension points, never
/// across one).
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: Vec<u8>,
}

impl Reassembler {
    /// Creates an empty reassembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all buffered bytes, discarding any partial frame. Called on
    /// transport disconnect.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Appends `bytes` to the internal buffer and returns every complete,
    /// checksum-valid frame that can now be drained from it.
    ///
    /// Invalid frames (bad checksum, bad escape, non-hex checksum digits)
    /// are never surfaced; the reassembler resyncs by dropping one leading
    /// byte and retrying, per the protocol's silent-failure design.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            if !self.discard_until_start() {
                break;
            }
            if self.buffer.len() < MIN_FRAME_LEN {
                break;
            }
            match self.try_parse_one() {
                ParseOutcome::Frame(frame, consumed) => {
                    self.buffer.drain(0..consumed);
                    frames.push(frame);
                }
                ParseOutcome::NeedMoreData => {
                    if self.buffer.len() >= RESYNC_BOUND {
                        self.buffer.remove(0);
                        continue;
                    }
                    break;
                }
                ParseOutcome::Invalid => {
                    self.buffer.remove(0);
                }
            }
        }

        frames
    }

    /// Drops bytes before the first `>`. Returns `false` if no `>` is
    /// present, meaning the whole buffer was discarded.
    fn discard_until_start(&mut self) -> bool {
        match memchr::memchr(b'>', &self.buffer) {
            Some(0) => true,
            Some(idx) => {
                self.buffer.drain(0..idx);
                true
            }
            None => {
                self.buffer.clear();
                false
            }
        }
    }

    fn try_parse_one(&self) -> ParseOutcome {
        let frame_type = self.buffer[1];
        let Some(rel_lt) = find_unescaped_lt(&self.buffer[2..]) else {
            return ParseOutcome::NeedMoreData;
        };
        let lt_idx = 2 + rel_lt;

        let mut checksum_start = lt_idx + 1;
        let double_lt = self.buffer.get(lt_idx + 1) == Some(&b'<');
        if double_lt {
            checksum_start += 1;
        }

        let Some(checksum_bytes) = self.buffer.get(checksum_start..checksum_start + 4) else {
            return ParseOutcome::NeedMoreData;
        };
        let Some(checksum) = parse_checksum(checksum_bytes) else {
            return ParseOutcome::Invalid;
        };

        let escaped_payload = &self.buffer[2..lt_idx];
        let Some(payload) = unescape(escaped_payload) else {
            return ParseOutcome::Invalid;
        };

        let mut canonical = Vec::with_capacity(payload.len() + 4);
        canonical.push(b'>');
        canonical.push(frame_type);
        canonical.extend_from_slice(&payload);
        canonical.push(b'<');
        if double_lt {
            canonical.push(b'<');
        }

        if checksum16(&canonical) != checksum {
            tracing::debug!("mup1 checksum mismatch, resyncing");
            return ParseOutcome::Invalid;
        }

        tracing::debug!(frame_type = frame_type as char, payload_len = payload.len(), "parsed mup1 frame");
        ParseOutcome::Frame(Frame::new(frame_type, payload), checksum_start + 4)
    }
}

enum ParseOutcome {
    Frame(Frame, usize),
    NeedMoreData,
    Invalid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{build, FrameKind};

    #[test]
    fn round_trips_single_frame() {
        let wire = build(FrameKind::Ping.byte(), b"hello!");
        let mut reassembler = Reassembler::new();
        let frames = reassembler.feed(&wire);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_type(), FrameKind::Ping.byte());
        assert_eq!(frames[0].payload(), b"hello!");
    }

    #[test]
    fn garbage_prefix_is_discarded() {
        let wire = build(FrameKind::Announce.byte(), b"");
        let mut noisy = b"garbage before frame".to_vec();
        noisy.extend_from_slice(&wire);

        let mut reassembler = Reassembler::new();
        let frames = reassembler.feed(&noisy);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_type(), FrameKind::Announce.byte());
    }

    #[test]
    fn single_bit_flip_rejects_frame() {
        let mut wire = build(FrameKind::CoapRequest.byte(), b"payload");
        let last = wire.len() - 1;
        wire[last] ^= 0x01;

        let mut reassembler = Reassembler::new();
        assert!(reassembler.feed(&wire).is_empty());
    }

    #[test]
    fn torn_frame_waits_for_more_bytes() {
        let wire = build(FrameKind::Trace.byte(), b"partial");
        let mut reassembler = Reassembler::new();
        assert!(reassembler.feed(&wire[..wire.len() - 2]).is_empty());
        assert_eq!(reassembler.feed(&wire[wire.len() - 2..]).len(), 1);
    }

    #[test]
    fn multiple_frames_in_one_feed_all_drain() {
        let mut wire = build(FrameKind::Ping.byte(), b"");
        wire.extend(build(FrameKind::Announce.byte(), b""));
        wire.extend(build(FrameKind::CoapRequest.byte(), b"xy"));

        let mut reassembler = Reassembler::new();
        let frames = reassembler.feed(&wire);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].payload(), b"xy");
    }

    #[test]
    fn accepts_either_trailing_angle_bracket_count_on_rx() {
        // Construct a frame with odd-length payload but a doubled `<<`,
        // which a real device is observed to do regardless of parity.
        let payload = b"odd";
        let mut canonical = vec![b'>', FrameKind::Trace.byte()];
        canonical.extend_from_slice(payload);
        canonical.push(b'<');
        canonical.push(b'<');
        let checksum = checksum16(&canonical);

        let mut wire = vec![b'>', FrameKind::Trace.byte()];
        wire.extend_from_slice(payload);
        wire.push(b'<');
        wire.push(b'<');
        wire.extend_from_slice(&crate::checksum::format_checksum(checksum));

        let mut reassembler = Reassembler::new();
        let frames = reassembler.feed(&wire);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), payload);
    }

    #[test]
    fn empty_payload_round_trips() {
        let wire = build(FrameKind::Ping.byte(), b"");
        let mut reassembler = Reassembler::new();
        let frames = reassembler.feed(&wire);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload().is_empty());
    }

    #[test]
    fn resyncs_past_a_long_run_without_a_frame() {
        let mut reassembler = Reassembler::new();
        let mut noise = vec![b'>'];
        noise.extend(std::iter::repeat(b'x').take(2000));
        assert!(reassembler.feed(&noise).is_empty());
        // The sanity bound must have kicked in rather than growing forever.
        assert!(reassembler.buffer.len() < noise.len());
    }
}
