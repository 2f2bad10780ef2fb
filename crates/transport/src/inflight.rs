//! State shared by the serial and UDP event loops: the pending-request
//! table and the dispatch of a completed MUP1 frame onto it.
//!
//! Both transports are single cooperative agents that own one of these
//! tables exclusively; this module only factors out the identical
//! bookkeeping so it isn't duplicated per transport.

use rustc_hash::FxHashMap;
use tokio::sync::{broadcast, oneshot};

use crate::contract::Event;
use crate::error::Error;

pub(crate) struct PendingEntry {
    pub respond: oneshot::Sender<Result<coap::Message, Error>>,
}

pub(crate) enum Command {
    Send {
        message_id: u16,
        frame: Vec<u8>,
        /// `false` for fire-and-forget writes (the startup ping) that never
        /// complete a pending entry.
        expect_response: bool,
        respond: oneshot::Sender<Result<coap::Message, Error>>,
    },
    CancelPending {
        message_id: u16,
    },
    Disconnect,
}

pub(crate) type PendingMap = FxHashMap<u16, PendingEntry>;

/// Dispatches one reassembled MUP1 frame: resolves a matching pending
/// request, emits an unsolicited `Response`/`Announce`/`Trace` event, or
/// discards an unparseable CoAP payload with a warning.
pub(crate) fn dispatch_frame(
    frame: mup1::Frame,
    pending: &mut PendingMap,
    board_ready: &std::sync::atomic::AtomicBool,
    events: &broadcast::Sender<Event>,
) {
    match frame.kind() {
        Some(mup1::FrameKind::Announce) => {
            board_ready.store(true, std::sync::atomic::Ordering::SeqCst);
            tracing::debug!("observed mup1 announce frame");
            let _ = events.send(Event::Announce);
        }
        Some(mup1::FrameKind::Trace) => {
            let text = String::from_utf8_lossy(frame.payload()).into_owned();
            tracing::info!(target: "velocitydrive::trace", "{text}");
            let _ = events.send(Event::Trace(text));
        }
        Some(mup1::FrameKind::CoapResponse | mup1::FrameKind::CoapRequest) => {
            match coap::decode(frame.payload()) {
                Ok(message) => {
                    if let Some(entry) = pending.remove(&message.message_id) {
                        tracing::debug!(message_id = message.message_id, "resolved pending request");
                        let _ = entry.respond.send(Ok(message));
                    } else {
                        tracing::debug!(message_id = message.message_id, "unsolicited coap response");
                        let _ = events.send(Event::Response(message));
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding undecodable coap frame");
                }
            }
        }
        Some(mup1::FrameKind::Ping) | None => {
            tracing::debug!(frame_type = frame.frame_type() as char, "ignoring unexpected frame");
        }
    }
}

/// Rejects every pending request with [`Error::Disconnected`], called on
/// transport close.
pub(crate) fn fail_all_pending(pending: &mut PendingMap) {
    for (_, entry) in pending.drain() {
        let _ = entry.respond.send(Err(Error::Disconnected));
    }
}
