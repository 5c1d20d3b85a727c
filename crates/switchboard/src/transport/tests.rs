//! Unit tests for socket transports.

use std::net::{TcpListener, TcpStream};
use std::thread;

use super::*;

fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
    let addr = listener.local_addr().expect("listener address");
    let client = TcpStream::connect(addr).expect("connect client");
    let (server, _) = listener.accept().expect("accept connection");
    (server, client)
}

#[test]
fn pipe_carries_bytes_both_ways() {
    let (left, right) = pipe().expect("create pipe");
    left.write_with_deadline(b"ping", Duration::from_millis(50))
        .expect("write ping");
    let mut buf = [0_u8; 16];
    let read = Transport::read(&right, &mut buf).expect("read ping");
    assert_eq!(buf.get(..read), Some(&b"ping"[..]));

    right
        .write_with_deadline(b"pong", Duration::from_millis(50))
        .expect("write pong");
    let read = Transport::read(&left, &mut buf).expect("read pong");
    assert_eq!(buf.get(..read), Some(&b"pong"[..]));
}

#[test]
fn close_unblocks_a_parked_reader() {
    let (left, _right) = pipe().expect("create pipe");
    let left = std::sync::Arc::new(left);
    let reader = {
        let left = std::sync::Arc::clone(&left);
        thread::spawn(move || {
            let mut buf = [0_u8; 8];
            Transport::read(&*left, &mut buf)
        })
    };
    thread::sleep(Duration::from_millis(20));
    left.close().expect("close pipe");
    let outcome = reader.join().expect("join reader");
    assert!(matches!(outcome, Ok(0) | Err(_)));
}

#[test]
fn close_is_repeatable() {
    let (server, _client) = tcp_pair();
    server.close().expect("first close");
    server.close().expect("second close");
}

#[test]
fn peer_sees_end_of_stream_after_close() {
    let (server, client) = tcp_pair();
    server.close().expect("close server");
    let mut buf = [0_u8; 8];
    let read = Transport::read(&client, &mut buf).expect("read after close");
    assert_eq!(read, 0);
}

#[test]
fn read_with_retry_skips_interrupted_reads() {
    let mut transport = MockTransport::new();
    let mut sequence = mockall::Sequence::new();
    transport
        .expect_read()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Err(io::ErrorKind::Interrupted.into()));
    transport
        .expect_read()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|buf| {
            if let Some(first) = buf.first_mut() {
                *first = b'x';
            }
            Ok(1)
        });

    let mut buf = [0_u8; 4];
    let read = read_with_retry(&transport, &mut buf).expect("read");
    assert_eq!(read, 1);
    assert_eq!(buf.first(), Some(&b'x'));
}

#[test]
fn read_with_retry_surfaces_other_errors() {
    let mut transport = MockTransport::new();
    transport
        .expect_read()
        .times(1)
        .returning(|_| Err(io::ErrorKind::ConnectionReset.into()));
    let mut buf = [0_u8; 4];
    let error = read_with_retry(&transport, &mut buf).expect_err("read should fail");
    assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
}
