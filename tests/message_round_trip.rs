//! Integration tests for line parsing and export.
//!
//! Lines whose last parameter is in trailing form must come back byte for
//! byte; PING/PONG/NICK/QUIT always export as one joined trailing field.

use bytes::{Bytes, BytesMut};
use slirc_client::{Charset, IrcEncode, LineCodec, Message};
use tokio_util::codec::{Decoder, Encoder};

fn round_trip(line: &str) -> String {
    let msg = Message::parse(Bytes::copy_from_slice(line.as_bytes()), None)
        .expect("Failed to parse message");
    let exported = msg.to_bytes();
    String::from_utf8(exported).expect("export is UTF-8")
}

#[test]
fn test_round_trip_trailing_form() {
    for line in [
        ":demsh!~demsh@12a8e790 PRIVMSG #ircfw-test :heyo people!",
        ":irc.demsh.org 001 ircfw :Welcome to the Internet Relay Network ircfw!~ircfw@127.0.0.1",
        ":irc.demsh.org 353 ircfw = #ircfw-test :@demsh +vasya ircfw",
        "USER ircfw 0.0.0.0 0.0.0.0 :real name",
        "PING :irc.demsh.org",
        "QUIT :going away now",
    ] {
        assert_eq!(round_trip(line), format!("{}\r\n", line));
    }
}

#[test]
fn test_round_trip_normalises_last_param() {
    assert_eq!(round_trip("JOIN #ircfw-test"), "JOIN :#ircfw-test\r\n");
    assert_eq!(
        round_trip(":irc.demsh.org MODE #ircfw-test +nt"),
        ":irc.demsh.org MODE #ircfw-test :+nt\r\n"
    );
    assert_eq!(round_trip("PONG a b"), "PONG :a b\r\n");
}

#[test]
fn test_reparse_is_stable() {
    let original: Message = ":nick!user@host PRIVMSG #channel :Hello, world!"
        .parse()
        .unwrap();
    let reparsed: Message = original.to_string().parse().unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_legacy_line_round_trips_through_codec() {
    let cp1251 = Charset::for_label("windows-1251").unwrap();
    // "привет" in windows-1251
    let mut wire = b":demsh!~d@host PRIVMSG #ircfw-test :".to_vec();
    wire.extend_from_slice(&[0xef, 0xf0, 0xe8, 0xe2, 0xe5, 0xf2]);
    wire.extend_from_slice(b"\r\n");

    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from(&wire[..]);
    let line = codec.decode(&mut buf).unwrap().unwrap();
    let msg = Message::parse(line, Some(cp1251)).unwrap();
    assert!(msg.is_legacy());
    assert_eq!(msg.text().unwrap(), "привет");

    let mut out = BytesMut::new();
    codec.encode(msg, &mut out).unwrap();
    assert_eq!(&out[..], &wire[..]);
}

#[test]
fn test_utf8_line_ignores_charset() {
    let cp1251 = Charset::for_label("windows-1251").unwrap();
    let line = Bytes::from_static(":demsh!~d@host PRIVMSG #ircfw-test :привет".as_bytes());
    let msg = Message::parse(line, Some(cp1251)).unwrap();
    assert!(!msg.is_legacy());
    assert_eq!(msg.text().unwrap(), "привет");
}

#[test]
fn test_codec_frames_several_lines() {
    let mut codec = LineCodec::new();
    let mut buf = BytesMut::from(&b"PING :a\r\n\r\nPING :b\nPING :c"[..]);
    assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "PING :a");
    assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "PING :b");
    assert_eq!(codec.decode(&mut buf).unwrap(), None);
    assert_eq!(codec.decode_eof(&mut buf).unwrap().unwrap(), "PING :c");
}

#[test]
fn test_export_exact_ping() {
    let msg = Message::new("PING", ["irc.demsh.org"]);
    assert_eq!(msg.to_bytes(), b"PING :irc.demsh.org\r\n");
}
