//! End-to-end timeout path (scenario 6): a request with no reply times out,
//! the pending-request table is left empty, and a subsequent request over
//! the same transport succeeds normally.

use std::time::Duration;

use tokio::net::UdpSocket;
use transport::{RequestOptions, Transport, UdpOptions, UdpTransport};

fn request(message_id: u16) -> coap::Message {
    coap::Message {
        msg_type: coap::Type::Confirmable,
        code: coap::Code::GET,
        message_id,
        token: vec![0xAA, 0xBB],
        options: Vec::new(),
        payload: Vec::new(),
    }
}

/// A fake device: the first datagram it receives is silently dropped, every
/// datagram after that is answered with a `2.05 Content` response.
async fn spawn_fake_device() -> std::net::SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        let mut reassembler = mup1::Reassembler::new();
        let mut seen_first = false;

        loop {
            let Ok((n, peer)) = socket.recv_from(&mut buf).await else { break };
            for frame in reassembler.feed(&buf[..n]) {
                if !seen_first {
                    seen_first = true;
                    continue;
                }
                let Ok(message) = coap::decode(frame.payload()) else { continue };
                let mut response = message;
                response.msg_type = coap::Type::Acknowledgement;
                response.code = coap::Code::CONTENT;
                response.options = Vec::new();
                response.payload = Vec::new();
                let wire = mup1::build(mup1::FrameKind::CoapResponse.byte(), &coap::encode(&response));
                let _ = socket.send_to(&wire, peer).await;
            }
        }
    });

    addr
}

#[tokio::test]
async fn unanswered_request_times_out_and_clears_pending_before_the_next_succeeds() {
    let device_addr = spawn_fake_device().await;
    let mut options = UdpOptions::new(device_addr.ip().to_string());
    options.port = device_addr.port();
    let mut transport = UdpTransport::new(options);

    transport.connect().await.unwrap();
    transport.wait_for_ready(Duration::from_secs(1)).await.unwrap();

    let opts = RequestOptions::default();
    let first = transport.send_request(request(1), Duration::from_millis(200)).await;
    assert!(matches!(first, Err(transport::Error::Timeout)));

    let second = transport
        .send_request(request(2), opts.request_timeout)
        .await
        .expect("second request should succeed once the device starts answering");
    assert_eq!(second.code, coap::Code::CONTENT);
    assert_eq!(second.message_id, 2);

    transport.disconnect().await;
}
