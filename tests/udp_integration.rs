//! Integration tests for the UDP actors
//!
//! These tests bind real sockets on localhost, so they run serially.

mod common;

use actorgraph_rs::capability::ParamValue;
use actorgraph_rs::runtime::Payload;
use common::builders::SystemBuilder;
use common::mock_helpers::{data_events, observer_factory};
use serial_test::serial;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

/// Bind a receiver on a localhost port the client's `port` range accepts.
fn bind_low_port() -> UdpSocket {
    let socket = (9000..10000)
        .find_map(|port| UdpSocket::bind(("127.0.0.1", port)).ok())
        .expect("no free UDP port in 9000..10000");
    socket
        .set_read_timeout(Some(common::test_timeout()))
        .unwrap();
    socket
}

fn port_of(socket: &UdpSocket) -> i64 {
    i64::from(socket.local_addr().unwrap().port())
}

/// Receive one datagram, resending `payload` from `send` until it arrives.
/// The client applies API messages asynchronously, so the first sends may go
/// to the previous address.
fn recv_with_retry(receiver: &UdpSocket, mut send: impl FnMut()) -> Vec<u8> {
    receiver
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();
    let mut buf = [0u8; 1024];
    for _ in 0..40 {
        send();
        if let Ok(n) = receiver.recv(&mut buf) {
            return buf[..n].to_vec();
        }
    }
    panic!("no datagram received");
}

#[test]
#[serial]
fn test_client_follows_port_changes() {
    let (factory, _rx) = observer_factory();
    let sys = SystemBuilder::new().with_factory(factory).build();
    let source = sys.create_actor("Observer").unwrap();
    let client = sys.create_actor("Client").unwrap();
    sys.add_connection(source, "osc-out", client, "OSC").unwrap();

    let first = bind_low_port();
    sys.on_parameter_text(client, "ip", "127.0.0.1").unwrap();
    sys.on_parameter_edited(client, "port", ParamValue::Int(port_of(&first)))
        .unwrap();

    let payload: Payload = Arc::from(&b"/one\0\0\0\0,\0\0\0"[..]);
    let got = recv_with_retry(&first, || {
        sys.send(source, "osc-out", payload.clone());
    });
    assert_eq!(got, payload.to_vec());

    let second = bind_low_port();
    sys.on_parameter_edited(client, "port", ParamValue::Int(port_of(&second)))
        .unwrap();

    let payload: Payload = Arc::from(&b"/two\0\0\0\0,\0\0\0"[..]);
    let got = recv_with_retry(&second, || {
        sys.send(source, "osc-out", payload.clone());
    });
    assert_eq!(got, payload.to_vec());
}

#[test]
#[serial]
fn test_natnet_to_client_end_to_end() {
    let sys = SystemBuilder::new().timer_ms(2).build();
    let natnet = sys.create_actor("NatNet").unwrap();
    let client = sys.create_actor("Client").unwrap();
    sys.add_connection(natnet, "OSC", client, "OSC").unwrap();

    let receiver = bind_low_port();
    sys.on_parameter_text(client, "ip", "127.0.0.1").unwrap();
    sys.on_parameter_edited(client, "port", ParamValue::Int(port_of(&receiver)))
        .unwrap();

    // Pick a free port for NatNet by binding and releasing it.
    let natnet_port = {
        let scratch = UdpSocket::bind("127.0.0.1:0").unwrap();
        port_of(&scratch)
    };
    sys.on_parameter_text(natnet, "host", "127.0.0.1").unwrap();
    sys.on_parameter_edited(natnet, "port", ParamValue::Int(natnet_port))
        .unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let target = format!("127.0.0.1:{}", natnet_port);
    let got = recv_with_retry(&receiver, || {
        let _ = sender.send_to(b"frame", &target);
    });
    assert_eq!(got, b"frame".to_vec());
}

#[test]
#[serial]
fn test_natnet_forwards_with_timer_disabled() {
    let (factory, rx) = observer_factory();
    let sys = SystemBuilder::new().timer_ms(0).with_factory(factory).build();
    let natnet = sys.create_actor("NatNet").unwrap();
    let sink = sys.create_actor("Observer").unwrap();
    sys.add_connection(natnet, "OSC", sink, "osc-in").unwrap();

    let natnet_port = {
        let scratch = UdpSocket::bind("127.0.0.1:0").unwrap();
        port_of(&scratch)
    };
    sys.on_parameter_text(natnet, "host", "127.0.0.1").unwrap();
    sys.on_parameter_edited(natnet, "port", ParamValue::Int(natnet_port))
        .unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let target = format!("127.0.0.1:{}", natnet_port);
    let mut seen = Vec::new();
    for _ in 0..40 {
        let _ = sender.send_to(b"frame", &target);
        std::thread::sleep(Duration::from_millis(50));
        seen.extend(data_events(&rx));
        if !seen.is_empty() {
            break;
        }
    }

    assert!(!seen.is_empty(), "no datagram forwarded");
    assert_eq!(seen[0].0, sink);
    assert_eq!(&seen[0].2[..], b"frame");
}
