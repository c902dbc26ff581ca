//! Frame pump tests over a socketpair-backed VDE device

mod common;

use std::thread;
use std::time::Duration;

use vde_net::prelude::*;

/// Test that drain hands over every queued frame and then stops
#[test]
fn test_drain_pending_frames() {
    let (dev, peer) = common::datagram_device();
    let mut pump = FramePump::new(dev);

    for frame in [&b"one"[..], b"two", b"three"] {
        peer.data.send(frame).unwrap();
    }

    let mut frames = Vec::new();
    let count = pump.drain(|frame| frames.push(frame.to_vec())).unwrap();

    assert_eq!(count, 3);
    assert_eq!(frames, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    assert_eq!(pump.stats().rx_frames, 3);
    assert_eq!(pump.stats().rx_bytes, 11);
}

/// Test that drain surfaces a dead switch
#[test]
fn test_drain_connection_lost() {
    let (dev, peer) = common::datagram_device();
    let mut pump = FramePump::new(dev);

    drop(peer.ctl);

    let err = pump.drain(|_| {}).unwrap_err();
    assert!(matches!(err, Error::ConnectionLost(_)));
}

/// Test that send gives up when the channel stays full
#[test]
fn test_send_times_out_on_full_channel() {
    let (dev, _peer) = common::datagram_device();
    let mut pump = FramePump::new(dev);
    let frame = [0u8; 1500];

    while pump.device().tx(&frame).is_ok() {}

    let err = pump
        .send(&frame, Some(Duration::from_millis(50)))
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert!(pump.stats().tx_would_block >= 1);
}

/// Test that send completes once the switch side drains the channel
#[test]
fn test_send_resumes_when_writable() {
    let (dev, peer) = common::datagram_device();
    let mut pump = FramePump::new(dev);
    let frame = [0u8; 1500];

    while pump.device().tx(&frame).is_ok() {}

    let reader = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let mut buf = [0u8; 1500];
        peer.data.set_nonblocking(true).unwrap();
        while peer.data.recv(&mut buf).is_ok() {}
        peer
    });

    pump.send(b"after", Some(Duration::from_secs(5))).unwrap();
    assert_eq!(pump.stats().tx_frames, 1);
    assert_eq!(pump.stats().tx_bytes, 5);

    let _peer = reader.join().unwrap();
}

/// Test that a timeout too large for a deadline waits instead of panicking
#[test]
fn test_send_with_max_timeout_on_full_channel() {
    let (dev, peer) = common::datagram_device();
    let mut pump = FramePump::new(dev);
    let frame = [0u8; 1500];

    while pump.device().tx(&frame).is_ok() {}

    let reader = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let mut buf = [0u8; 1500];
        peer.data.set_nonblocking(true).unwrap();
        while peer.data.recv(&mut buf).is_ok() {}
        peer
    });

    pump.send(b"after", Some(Duration::MAX)).unwrap();
    assert_eq!(pump.stats().tx_frames, 1);
    assert!(pump.stats().tx_would_block >= 1);

    let _peer = reader.join().unwrap();
}

/// Test that a pump without buffer space reports an error and keeps the frame
#[test]
fn test_drain_with_empty_buffer_keeps_frame() {
    let (dev, peer) = common::datagram_device();
    let mut pump = FramePump::with_frame_len(dev, 0);

    peer.data.send(b"ABC").unwrap();

    let err = pump.drain(|_| {}).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(pump.stats().rx_frames, 0);

    let mut dev = pump.into_inner();
    let mut buf = [0u8; 64];
    let len = dev.rx(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"ABC");
}

/// Test that drain_up_to leaves frames past the limit on the channel
#[test]
fn test_drain_up_to_stops_at_limit() {
    let (dev, peer) = common::datagram_device();
    let mut pump = FramePump::new(dev);

    for frame in [&b"one"[..], b"two", b"three"] {
        peer.data.send(frame).unwrap();
    }

    let mut frames = Vec::new();
    assert_eq!(pump.drain_up_to(1, |f| frames.push(f.to_vec())).unwrap(), 1);
    assert_eq!(frames, vec![b"one".to_vec()]);
    assert_eq!(pump.stats().rx_frames, 1);
    assert_eq!(pump.stats().rx_bytes, 3);

    assert_eq!(pump.drain(|f| frames.push(f.to_vec())).unwrap(), 2);
    assert_eq!(frames.len(), 3);
}
