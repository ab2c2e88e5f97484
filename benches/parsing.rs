//! Benchmarks for line parsing, export and chat wrapping.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slirc_client::wrap::wrap_lines;
use slirc_client::{Charset, IrcEncode, Message};

/// Simple PING message
const SIMPLE_MESSAGE: &str = "PING :irc.demsh.org";

/// Message with prefix
const PREFIX_MESSAGE: &str = ":demsh!~demsh@12a8e790 PRIVMSG #ircfw-test :heyo people!";

/// Numeric response
const NUMERIC_RESPONSE: &str =
    ":irc.demsh.org 001 ircfw :Welcome to the Internet Relay Network ircfw!~ircfw@127.0.0.1";

/// ISUPPORT with many tokens
const ISUPPORT: &str = ":irc.demsh.org 005 ircfw CHANTYPES=# EXCEPTS INVEX CHANMODES=eIbq,k,flj,CFLMPQScgimnprstz CHANLIMIT=#:120 PREFIX=(ov)@+ MAXLIST=bqeI:100 MODES=4 NETWORK=demsh KNOCK STATUSMSG=@+ CALLERID=g :are supported by this server";

/// "привет всем" in windows-1251
const LEGACY_MESSAGE: &[u8] = b":demsh!~d@host PRIVMSG #ircfw-test :\xef\xf0\xe8\xe2\xe5\xf2 \xe2\xf1\xe5\xec";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Parsing");

    for (name, line) in [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("numeric_response", NUMERIC_RESPONSE),
        ("isupport", ISUPPORT),
    ] {
        let line = Bytes::from_static(line.as_bytes());
        group.bench_with_input(BenchmarkId::new("utf8", name), &line, |b, line| {
            b.iter(|| {
                let msg = Message::parse(black_box(line.clone()), None).unwrap();
                black_box(msg)
            })
        });
    }

    let cp1251 = Charset::for_label("windows-1251");
    let legacy = Bytes::from_static(LEGACY_MESSAGE);
    group.bench_function("legacy", |b| {
        b.iter(|| {
            let msg = Message::parse(black_box(legacy.clone()), cp1251).unwrap();
            black_box(msg.text().map(|t| t.into_owned()))
        })
    });

    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Serialization");

    let simple: Message = SIMPLE_MESSAGE.parse().unwrap();
    let with_prefix: Message = PREFIX_MESSAGE.parse().unwrap();
    let outbound = Message::new("PRIVMSG", ["#ircfw-test", "Hello, world!"]);

    for (name, msg) in [
        ("simple_ping", &simple),
        ("with_prefix", &with_prefix),
        ("outbound_privmsg", &outbound),
    ] {
        group.bench_with_input(BenchmarkId::new("to_bytes", name), msg, |b, msg| {
            b.iter(|| black_box(black_box(msg).to_bytes()))
        });
    }

    group.finish();
}

fn benchmark_wrapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("Wrapping");

    let short = ["Hello, world!".to_string()];
    let long = ["lorem ipsum dolor sit amet ".repeat(60)];
    let cyrillic = ["съешь же ещё этих мягких французских булок ".repeat(30)];

    group.bench_function("fits", |b| b.iter(|| black_box(wrap_lines(black_box(&short), 440))));
    group.bench_function("ascii", |b| b.iter(|| black_box(wrap_lines(black_box(&long), 440))));
    group.bench_function("cyrillic", |b| {
        b.iter(|| black_box(wrap_lines(black_box(&cyrillic), 440)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_serialization,
    benchmark_wrapping,
);

criterion_main!(benches);
