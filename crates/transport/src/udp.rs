//! UDP transport (C5): MUP1 framing over a connectionless datagram socket
//! talking to a bridging proxy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::contract::{Event, Transport, UdpOptions};
use crate::error::Error;
use crate::inflight::{dispatch_frame, fail_all_pending, Command, PendingEntry, PendingMap};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const DATAGRAM_BUFFER_SIZE: usize = 4096;

/// UDP transport, per §4.5. The device handshake (ANNOUNCE) is managed by
/// the bridging proxy on the peer end, so `board_ready` is true as soon as
/// the socket is bound.
pub struct UdpTransport {
    options: UdpOptions,
    command_tx: Option<mpsc::UnboundedSender<Command>>,
    connected: Arc<AtomicBool>,
    board_ready: Arc<AtomicBool>,
    events: broadcast::Sender<Event>,
    loop_handle: Option<JoinHandle<()>>,
}

impl UdpTransport {
    #[must_use]
    pub fn new(options: UdpOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            options,
            command_tx: None,
            connected: Arc::new(AtomicBool::new(false)),
            board_ready: Arc::new(AtomicBool::new(false)),
            events,
            loop_handle: None,
        }
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect((self.options.host.as_str(), self.options.port)).await?;
        let socket = Arc::new(socket);

        let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
        let connected = self.connected.clone();
        let board_ready = self.board_ready.clone();
        let events = self.events.clone();
        let loop_socket = socket.clone();
        self.loop_handle = Some(tokio::spawn(async move {
            run_event_loop(&loop_socket, command_rx, &connected, &board_ready, &events).await;
        }));

        self.connected.store(true, Ordering::SeqCst);
        self.board_ready.store(true, Ordering::SeqCst);
        self.command_tx = Some(command_tx);
        let _ = self.events.send(Event::Connected);
        let _ = self.events.send(Event::Announce);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(Command::Disconnect);
        }
        if let Some(handle) = self.loop_handle.take() {
            let _ = handle.await;
        }
        self.connected.store(false, Ordering::SeqCst);
        self.board_ready.store(false, Ordering::SeqCst);
        let _ = self.events.send(Event::Disconnected);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn board_ready(&self) -> bool {
        self.board_ready.load(Ordering::SeqCst)
    }

    async fn wait_for_ready(&mut self, _timeout: Duration) -> Result<(), Error> {
        // `board_ready` is set synchronously in `connect`; there is no
        // handshake to await on the UDP transport.
        if self.board_ready() {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    async fn send_request(
        &mut self,
        message: coap::Message,
        timeout: Duration,
    ) -> Result<coap::Message, Error> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let Some(command_tx) = self.command_tx.as_ref() else {
            return Err(Error::NotConnected);
        };

        let message_id = message.message_id;
        let frame = mup1::build(mup1::FrameKind::CoapRequest.byte(), &coap::encode(&message));

        let (respond, rx) = oneshot::channel();
        command_tx
            .send(Command::Send { message_id, frame, expect_response: true, respond })
            .map_err(|_| Error::Disconnected)?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Disconnected),
            Err(_) => {
                let _ = command_tx.send(Command::CancelPending { message_id });
                Err(Error::Timeout)
            }
        }
    }
}

async fn run_event_loop(
    socket: &Arc<UdpSocket>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    _connected: &Arc<AtomicBool>,
    board_ready: &Arc<AtomicBool>,
    events: &broadcast::Sender<Event>,
) {
    let mut reassembler = mup1::Reassembler::new();
    let mut pending: PendingMap = PendingMap::default();
    let mut buf = vec![0u8; DATAGRAM_BUFFER_SIZE];

    loop {
        tokio::select! {
            result = socket.recv(&mut buf) => {
                match result {
                    Ok(n) => {
                        for frame in reassembler.feed(&buf[..n]) {
                            dispatch_frame(frame, &mut pending, board_ready, events);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "udp recv failed");
                    }
                }
            }
            command = command_rx.recv() => {
                match command {
                    Some(Command::Send { message_id, frame, expect_response, respond }) => {
                        if let Err(e) = socket.send(&frame).await {
                            let _ = respond.send(Err(Error::Io(e)));
                            continue;
                        }
                        if expect_response {
                            pending.insert(message_id, PendingEntry { respond });
                        }
                    }
                    Some(Command::CancelPending { message_id }) => {
                        pending.remove(&message_id);
                    }
                    Some(Command::Disconnect) | None => {
                        fail_all_pending(&mut pending);
                        reassembler.clear();
                        break;
                    }
                }
            }
        }
    }
}
