//! # slirc-client
//!
//! The core of an IRC client: one persistent connection, a codec that
//! round-trips both UTF-8 and legacy single-byte traffic, and a protocol state
//! machine that tracks the session and every joined channel.
//!
//! ## Features
//!
//! - Line parsing and export with the mandatory trailing-parameter form
//! - Per-line UTF-8 or legacy charset decoding (`windows-1251`, `koi8-r`, ...)
//! - Supervised read, write, keepalive and dispatch tasks on tokio
//! - Channel actors with membership, topic and mode tracking
//! - Chat text wrapping that respects the 512 byte line limit
//! - Optional `serde` support for [`ClientConfig`]

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing lines
//!
//! ```rust
//! use slirc_client::Message;
//!
//! let msg: Message = ":demsh!~demsh@12a8e790 PRIVMSG #ircfw-test :heyo people!"
//!     .parse()
//!     .expect("valid line");
//! assert_eq!(msg.nick(), "demsh");
//! assert_eq!(msg.params(), ["#ircfw-test", "heyo people!"]);
//! ```
//!
//! ### Running a bot
//!
//! ```no_run
//! use std::time::Duration;
//! use slirc_client::{ChatMessage, Client, ClientConfig};
//! use tokio::net::TcpStream;
//!
//! # async fn run() -> slirc_client::Result<()> {
//! let socket = TcpStream::connect("irc.example.org:6667").await.map_err(slirc_client::ClientError::from)?;
//! let config = ClientConfig::builder("ircfw").build()?;
//! let client = Client::new(socket, config, |msg: ChatMessage| async move {
//!     let text = msg.text().to_vec();
//!     let _ = msg.reply(text, Duration::from_secs(5)).await;
//! })
//! .await?;
//! client.join("#ircfw-test").await?;
//! client.wait().await
//! # }
//! ```

pub mod channel;
pub mod charset;
pub mod chat;
pub mod client;
pub mod colors;
pub mod command;
pub mod config;
pub mod encode;
pub mod error;
mod handlers;
pub mod isupport;
pub mod line;
pub mod message;
pub mod response;
mod signal;
mod supervisor;
pub mod util;
pub mod validation;
pub mod wrap;

pub use self::channel::{Channel, Members, TopicMeta};
pub use self::charset::{Charset, Encoding};
pub use self::chat::{ChatMessage, MessageHandler};
pub use self::client::Client;
pub use self::colors::IrcColor;
pub use self::command::Command;
pub use self::config::{ClientConfig, ClientConfigBuilder};
pub use self::encode::IrcEncode;
pub use self::error::{ClientError, ProtocolError, Result};
pub use self::isupport::{Isupport, IsupportEntry, PrefixSpec};
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::response::Response;
pub use self::validation::{validate_channel, validate_nick, ValidationError};
