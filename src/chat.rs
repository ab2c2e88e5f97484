//! Chat text flowing between the server and the message handler.
//!
//! An inbound PRIVMSG/NOTICE becomes a [`ChatMessage`] on its channel's
//! receive queue; [`ChatMessage::reply`] and [`Channel::say`] put new ones on
//! the channel's send queue, where the transmit task expands them into wire
//! messages.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::time::{timeout_at, Instant};

use crate::channel::Channel;
use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::message::Message;
use crate::util::pop;
use crate::wrap::wrap_lines;

/// Callback invoked for every chat message, one at a time per channel.
pub trait MessageHandler: Send + Sync + 'static {
    fn handle(&self, msg: ChatMessage) -> BoxFuture<'static, ()>;
}

impl<F, Fut> MessageHandler for F
where
    F: Fn(ChatMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle(&self, msg: ChatMessage) -> BoxFuture<'static, ()> {
        Box::pin(self(msg))
    }
}

/// Lines of chat text bound to a channel.
#[derive(Clone)]
pub struct ChatMessage {
    lines: Vec<String>,
    channel: Channel,
    client: Client,
    prefix: String,
    time: DateTime<Utc>,
    deadline: Option<Instant>,
    utf8: bool,
    notice: bool,
}

impl ChatMessage {
    pub(crate) fn new(lines: Vec<String>, channel: Channel, client: Client) -> Self {
        Self {
            lines,
            channel,
            client,
            prefix: String::new(),
            time: Utc::now(),
            deadline: None,
            utf8: false,
            notice: false,
        }
    }

    /// Build from an inbound PRIVMSG/NOTICE.
    pub(crate) fn from_wire(msg: &Message, channel: Channel, client: Client) -> Self {
        let text = msg.text().map(|t| t.into_owned()).unwrap_or_default();
        Self {
            prefix: msg.prefix().map(|p| p.into_owned()).unwrap_or_default(),
            utf8: !msg.is_legacy(),
            notice: msg.command().eq_ignore_ascii_case("NOTICE"),
            ..Self::new(vec![text], channel, client)
        }
    }

    /// Text lines as received or queued.
    pub fn text(&self) -> &[String] {
        &self.lines
    }

    /// Text lines split to fit the channel's message limit.
    pub fn wrapped_text(&self) -> Vec<String> {
        wrap_lines(&self.lines, self.channel.msg_limit())
    }

    /// Sender's prefix, `nick!ident@host`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Sender's nick.
    pub fn nick(&self) -> &str {
        pop(&self.prefix, '!').0
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// When this message was created.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the text arrived as valid UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    pub fn is_private(&self) -> bool {
        self.channel.is_private()
    }

    /// Whether this arrived as a NOTICE rather than a PRIVMSG.
    pub fn is_notice(&self) -> bool {
        self.notice
    }

    /// Queue `lines` back to where this message came from.
    ///
    /// Private messages are answered to the sender's nick. Queueing and the
    /// eventual socket write both have to finish within `timeout`.
    pub async fn reply<I, S>(&self, lines: I, timeout: Duration) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let deadline = Instant::now() + timeout;
        let reply = ChatMessage {
            lines: lines.into_iter().map(Into::into).collect(),
            channel: self.channel.clone(),
            client: self.client.clone(),
            prefix: self.prefix.clone(),
            time: Utc::now(),
            deadline: Some(deadline),
            utf8: self.utf8,
            notice: false,
        };
        match timeout_at(deadline, self.channel.enqueue(reply)).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(channel = %self.channel, "reply timed out");
                Err(ClientError::QueueTimeout)
            }
        }
    }

    /// Expand into PRIVMSG wire messages, one per wrapped line.
    pub(crate) fn messages(&self) -> Vec<Message> {
        let target = if self.is_private() {
            self.nick()
        } else {
            self.channel.name()
        };
        let charset = self.client.charset();
        self.wrapped_text()
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| {
                Message::outbound("PRIVMSG", &[target, line.as_str()], charset)
                    .with_deadline(self.deadline)
            })
            .collect()
    }
}

impl fmt::Debug for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatMessage")
            .field("time", &self.time.format("%Y-%m-%d %H:%M:%S").to_string())
            .field("prefix", &self.prefix)
            .field("channel", &self.channel.name())
            .field("utf8", &self.utf8)
            .field("notice", &self.notice)
            .field("text", &self.lines)
            .finish()
    }
}
