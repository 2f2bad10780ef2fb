//! Serial transport (C4): MUP1 framing over a UART device path.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::contract::{Event, SerialOptions, Transport};
use crate::error::Error;
use crate::inflight::{dispatch_frame, fail_all_pending, Command, PendingEntry, PendingMap};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const READ_BUFFER_SIZE: usize = 4096;
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial (UART) transport, per §4.4: a single cooperative event loop owns
/// the reassembly buffer and pending-request table for the life of the
/// connection.
pub struct SerialTransport {
    options: SerialOptions,
    command_tx: Option<mpsc::UnboundedSender<Command>>,
    connected: Arc<AtomicBool>,
    board_ready: Arc<AtomicBool>,
    events: broadcast::Sender<Event>,
    loop_handle: Option<JoinHandle<()>>,
}

impl SerialTransport {
    #[must_use]
    pub fn new(options: SerialOptions) -> Self {
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
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        let port = serialport::new(self.options.device.to_string_lossy(), self.options.baud_rate)
            .timeout(PORT_READ_TIMEOUT)
            .open()?;
        let mut reader = port.try_clone()?;
        let mut writer = port;

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();

        std::thread::spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => continue,
                    Ok(n) => {
                        if inbound_tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "serial read loop exiting");
                        break;
                    }
                }
            }
        });

        let connected = self.connected.clone();
        let board_ready = self.board_ready.clone();
        let events = self.events.clone();
        self.loop_handle = Some(tokio::spawn(async move {
            run_event_loop(&mut writer, inbound_rx, command_rx, &connected, &board_ready, &events).await;
        }));
        self.connected.store(true, Ordering::SeqCst);
        self.command_tx = Some(command_tx.clone());

        let ping = mup1::build(mup1::FrameKind::Ping.byte(), &[]);
        let (respond, _rx) = oneshot::channel();
        let _ = command_tx.send(Command::Send {
            message_id: 0,
            frame: ping,
            expect_response: false,
            respond,
        });
        let _ = self.events.send(Event::Connected);
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

    async fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), Error> {
        if self.board_ready() {
            return Ok(());
        }
        let mut rx = self.events.subscribe();
        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(Event::Announce) => return,
                    Ok(_) => continue,
                    Err(_) => return,
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.map_err(|_| Error::Timeout)?;
        if self.board_ready() {
            Ok(())
        } else {
            Err(Error::Timeout)
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
        if !self.board_ready() {
            return Err(Error::NotReady);
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
    writer: &mut Box<dyn serialport::SerialPort>,
    mut inbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    _connected: &Arc<AtomicBool>,
    board_ready: &Arc<AtomicBool>,
    events: &broadcast::Sender<Event>,
) {
    let mut reassembler = mup1::Reassembler::new();
    let mut pending: PendingMap = PendingMap::default();

    loop {
        tokio::select! {
            bytes = inbound_rx.recv() => {
                let Some(bytes) = bytes else { break };
                for frame in reassembler.feed(&bytes) {
                    dispatch_frame(frame, &mut pending, board_ready, events);
                }
            }
            command = command_rx.recv() => {
                match command {
                    Some(Command::Send { message_id, frame, expect_response, respond }) => {
                        if let Err(e) = writer.write_all(&frame) {
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
