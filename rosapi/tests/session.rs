//! End-to-end session tests against an in-process fake router.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use rosapi::{ApiErrorKind, Attributes, Error, Query, Session, State, Status, challenge_response};
use rosapi_proto::length::{decode_length, encode_length, prefix_width};

const CHALLENGE: &str = "0123456789abcdef0123456789abcdef";
const PASSWORD: &str = "s3cret";

fn write_sentence(stream: &mut TcpStream, words: &[&str]) {
    let mut out = Vec::new();
    for w in words {
        out.extend(encode_length(w.len()).unwrap());
        out.extend_from_slice(w.as_bytes());
    }
    out.push(0);
    stream.write_all(&out).unwrap();
}

/// Reads one request sentence; `None` on EOF.
fn read_sentence(stream: &mut TcpStream) -> Option<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let mut first = [0u8; 1];
        if stream.read_exact(&mut first).is_err() {
            return None;
        }
        let mut prefix = vec![0u8; prefix_width(first[0]).unwrap()];
        prefix[0] = first[0];
        stream.read_exact(&mut prefix[1..]).unwrap();
        let len = decode_length(&prefix).unwrap();
        if len == 0 {
            return Some(words);
        }
        let mut word = vec![0u8; len];
        stream.read_exact(&mut word).unwrap();
        words.push(String::from_utf8(word).unwrap());
    }
}

/// Serves one connection the way a device does.
fn fake_router(mut stream: TcpStream) {
    let expected = challenge_response(PASSWORD, CHALLENGE).unwrap();
    while let Some(words) = read_sentence(&mut stream) {
        match words[0].as_str() {
            "/login" if words.len() == 1 => {
                write_sentence(&mut stream, &["!done", &format!("=ret={CHALLENGE}")]);
            }
            "/login" => {
                if words.contains(&format!("=response={expected}")) {
                    write_sentence(&mut stream, &["!done"]);
                } else {
                    write_sentence(
                        &mut stream,
                        &["!trap", "=message=cannot log in, invalid user name or password"],
                    );
                    write_sentence(&mut stream, &["!done"]);
                }
            }
            "/interface/print" => {
                // One write per row so the client must read repeatedly.
                write_sentence(&mut stream, &["!re", "=.id=*1", "=name=ether1"]);
                stream.flush().unwrap();
                thread::sleep(Duration::from_millis(10));
                write_sentence(&mut stream, &["!re", "=.id=*2", "=name=ether2"]);
                write_sentence(&mut stream, &["!done"]);
            }
            "/quit" => {
                write_sentence(&mut stream, &["!fatal", "session terminated on request"]);
                return;
            }
            _ => {
                write_sentence(&mut stream, &["!trap", "=message=no such command"]);
                write_sentence(&mut stream, &["!done"]);
            }
        }
    }
}

/// Starts a fake router that serves a single connection.
fn spawn_router() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            fake_router(stream);
        }
    });
    port
}

fn none() -> Vec<Query> {
    Vec::new()
}

#[test]
fn login_run_disconnect() {
    let port = spawn_router();
    let mut s = Session::connect("127.0.0.1", port).unwrap();
    assert_eq!(s.state(), State::Connected);

    s.login("admin", PASSWORD).unwrap();
    assert_eq!(s.state(), State::Authenticated);

    let rows = s
        .run("/interface/print", Attributes::new(), none())
        .unwrap();
    let names: Vec<_> = rows.iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(names, ["ether1", "ether2"]);
    assert_eq!(rows.last().unwrap().status, Status::Done);

    let err = s.run("/nope", Attributes::new(), none()).unwrap_err();
    assert!(matches!(
        err,
        Error::Api {
            kind: ApiErrorKind::Trap,
            ..
        }
    ));
    assert_eq!(s.state(), State::Authenticated);

    // Still in sync after the trap.
    assert_eq!(
        s.run("/interface/print", Attributes::new(), none())
            .unwrap()
            .len(),
        3
    );

    s.disconnect();
    s.disconnect();
    assert_eq!(s.state(), State::Closed);
}

#[test]
fn wrong_password_is_authentication_error() {
    let port = spawn_router();
    let mut s = Session::connect("127.0.0.1", port).unwrap();
    let err = s.login("admin", "wrong").unwrap_err();
    match err {
        Error::Authentication(msg) => assert!(msg.contains("invalid user name")),
        other => panic!("expected authentication error, got {other:?}"),
    }
    assert_eq!(s.state(), State::Closed);
}

#[test]
fn fatal_requires_reconnect() {
    let port = spawn_router();
    let mut s = Session::connect("127.0.0.1", port).unwrap();
    s.login("admin", PASSWORD).unwrap();

    let err = s.run("/quit", Attributes::new(), none()).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(s.state(), State::Closed);
    assert!(matches!(
        s.run("/interface/print", Attributes::new(), none()),
        Err(Error::State { .. })
    ));
}

#[test]
fn refused_connection_is_connection_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = Session::connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
}

#[test]
fn silent_device_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(500));
        drop(stream);
    });

    let mut s = Session::builder("127.0.0.1")
        .port(port)
        .timeout(Duration::from_millis(100))
        .connect()
        .unwrap();
    let err = s.login("admin", PASSWORD).unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert_eq!(s.state(), State::Closed);
    server.join().unwrap();
}
