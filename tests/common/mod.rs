//! A scripted fake server on the far end of a `tokio::io::duplex` pipe.

#![allow(dead_code)]

use std::time::Duration;

use slirc_client::{ChatMessage, Client, ClientConfig, MessageHandler};
use tokio::io::{split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::timeout;

pub const NICK: &str = "ircfw";
pub const PREFIX: &str = "ircfw!~ircfw@127.0.0.1";

const STEP: Duration = Duration::from_secs(5);

pub struct Server {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

impl Server {
    /// Next line written by the client, terminator stripped.
    pub async fn expect(&mut self) -> String {
        String::from_utf8(self.expect_raw().await).expect("line is UTF-8")
    }

    /// Next line as raw bytes, for legacy-encoded traffic.
    pub async fn expect_raw(&mut self) -> Vec<u8> {
        self.next_raw().await.expect("client closed the connection")
    }

    pub async fn expect_line(&mut self, want: &str) {
        assert_eq!(self.expect().await, want);
    }

    /// `None` once the client has closed its side.
    pub async fn next(&mut self) -> Option<String> {
        self.next_raw()
            .await
            .map(|line| String::from_utf8(line).expect("line is UTF-8"))
    }

    async fn next_raw(&mut self) -> Option<Vec<u8>> {
        let mut line = Vec::new();
        let read = timeout(STEP, self.reader.read_until(b'\n', &mut line))
            .await
            .expect("client went quiet")
            .expect("read failed");
        if read == 0 {
            return None;
        }
        if line.ends_with(b"\n") {
            line.pop();
        }
        if line.ends_with(b"\r") {
            line.pop();
        }
        Some(line)
    }

    pub async fn send(&mut self, line: &str) {
        self.send_raw(format!("{}\r\n", line).as_bytes()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("write failed");
    }

    /// Round-trip a PING so every line sent before it has been dispatched.
    pub async fn sync(&mut self) {
        self.send("PING :sync").await;
        self.expect_line("PONG :sync").await;
    }

    /// Consume NICK and USER, send welcome and ISUPPORT, and wait until
    /// the client has processed them.
    pub async fn register(&mut self) {
        self.welcome().await;
        self.sync().await;
    }

    /// Consume NICK and USER, then send welcome and ISUPPORT.
    pub async fn welcome(&mut self) {
        self.expect_line("NICK :ircfw").await;
        self.expect_line("USER ircfw 0.0.0.0 0.0.0.0 :ircfw").await;
        self.send(&format!(
            ":irc.demsh.org 001 ircfw :Welcome to the Internet Relay Network {}",
            PREFIX
        ))
        .await;
        self.send(":irc.demsh.org 005 ircfw CHANTYPES=# PREFIX=(ov)@+ EXCEPTS :are supported by this server")
            .await;
    }

    /// Serve a join the client has already started.
    pub async fn accept_join(&mut self, channel: &str) {
        self.expect_line(&format!("JOIN :{}", channel)).await;
        self.send(&format!(":{} JOIN {}", PREFIX, channel)).await;
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::builder(NICK).build().expect("valid config")
}

pub async fn connect<H: MessageHandler>(config: ClientConfig, handler: H) -> (Client, Server) {
    let (local, remote) = tokio::io::duplex(64 * 1024);
    let client = Client::new(local, config, handler)
        .await
        .expect("client starts");
    let (reader, writer) = split(remote);
    let server = Server {
        reader: BufReader::new(reader),
        writer,
    };
    (client, server)
}

pub async fn ignore(_msg: ChatMessage) {}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
