//! Echo bot: joins the given channels and repeats what it hears.
//!
//! ```text
//! RUST_LOG=slirc_client=debug cargo run --example echo_bot -- irc.libera.chat:6667 ircfw '#ircfw-test'
//! ```
//!
//! Set `IRC_CHARSET=windows-1251` to talk to a legacy-encoded network.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use slirc_client::{ChatMessage, Client, ClientConfig};
use tokio::net::TcpStream;
use tracing::{info, warn};

async fn echo(msg: ChatMessage) {
    if msg.is_notice() || msg.text().is_empty() {
        return;
    }
    info!(from = msg.nick(), channel = %msg.channel(), text = ?msg.text(), "heard");
    let lines: Vec<String> = msg.text().iter().map(|l| format!("{}: {}", msg.nick(), l)).collect();
    if let Err(err) = msg.reply(lines, Duration::from_secs(10)).await {
        warn!(%err, "reply failed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let (Some(addr), Some(nick)) = (args.next(), args.next()) else {
        bail!("usage: echo_bot <host:port> <nick> [#channel...]");
    };
    let channels: Vec<String> = args.collect();

    let mut builder = ClientConfig::builder(nick);
    if let Ok(charset) = env::var("IRC_CHARSET") {
        builder = builder.charset(charset);
    }
    if let Ok(password) = env::var("NICKSERV_PASSWORD") {
        builder = builder.nickserv_password(password);
    }
    let config = builder.build()?;

    let socket = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("connecting to {}", addr))?;
    let client = Client::new(socket, config, echo).await?;

    for name in &channels {
        let channel = client.join_timeout(name, Duration::from_secs(30)).await?;
        channel.say("echo bot reporting in").await?;
    }

    tokio::select! {
        res = client.wait() => res?,
        _ = tokio::signal::ctrl_c() => {
            client.quit("interrupted").await;
            client.wait().await?;
        }
    }
    Ok(())
}
