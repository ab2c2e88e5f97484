//! Channel actors.
//!
//! A [`Channel`] is created when [`Client::join`](crate::Client::join) asks
//! for it and started when the server echoes our JOIN. Starting spawns two
//! tasks: a receive task that feeds inbound chat to the message handler one
//! message at a time, and a transmit task that expands queued chat into
//! PRIVMSG lines on the connection's outbound queue. Killing a channel stops
//! both and is permanent.
//!
//! The private channel has an empty name and carries direct messages. It is
//! started with the connection and never joined or parted.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};

use crate::chat::{ChatMessage, MessageHandler};
use crate::client::{Client, Shared};
use crate::error::{ClientError, Result};
use crate::message::Message;
use crate::signal::Signal;
use crate::supervisor::Supervisor;
use crate::util::MAX_MESSAGE_SIZE;
use crate::validation::NICK_LENGTH_LIMIT;

/// Capacity of each per-channel queue.
pub const CHANNEL_QUEUE_SIZE: usize = 8;

/// Bytes of a PRIVMSG line that are not prefix, target or text:
/// the separator, `PRIVMSG `, and ` :` plus CRLF.
const PRIVMSG_SEPARATOR: usize = 1;
const PRIVMSG_COMMAND: usize = 9;
const PRIVMSG_TAIL: usize = 4;

/// Who set a topic and when (RPL_TOPICWHOTIME).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicMeta {
    pub setter: String,
    pub set_at: Option<DateTime<Utc>>,
}

impl TopicMeta {
    pub(crate) fn new(setter: &str, timestamp: &str) -> Self {
        let set_at = timestamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        Self {
            setter: setter.to_string(),
            set_at,
        }
    }
}

/// Nicks present in a channel.
#[derive(Debug, Default)]
pub struct Members {
    nicks: Mutex<HashSet<String>>,
}

impl Members {
    pub fn add(&self, nick: &str) {
        if !nick.is_empty() {
            self.nicks.lock().insert(nick.to_string());
        }
    }

    pub fn remove(&self, nick: &str) -> bool {
        self.nicks.lock().remove(nick)
    }

    /// Replace `old` with `new`. Does nothing if `old` is absent.
    pub fn rename(&self, old: &str, new: &str) -> bool {
        let mut nicks = self.nicks.lock();
        if !nicks.remove(old) {
            return false;
        }
        nicks.insert(new.to_string());
        true
    }

    pub fn contains(&self, nick: &str) -> bool {
        self.nicks.lock().contains(nick)
    }

    pub fn list(&self) -> Vec<String> {
        self.nicks.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.nicks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nicks.lock().is_empty()
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    topic: String,
    topic_meta: Option<TopicMeta>,
    modes: String,
}

#[derive(Debug, Clone)]
struct Rejection {
    code: u16,
    reason: String,
}

type Queues = (mpsc::Receiver<ChatMessage>, mpsc::Receiver<ChatMessage>);

struct ChannelInner {
    name: String,
    state: Mutex<ChannelState>,
    members: Members,
    send_tx: mpsc::Sender<ChatMessage>,
    receive_tx: mpsc::Sender<ChatMessage>,
    /// Receive and send queue consumers, taken by `start`.
    queues: Mutex<Option<Queues>>,
    started: Signal,
    killed: CancellationToken,
    /// Set when the server refused our JOIN. Every pending joiner reads it.
    rejection: Mutex<Option<Rejection>>,
    client: Weak<Shared>,
    outbound: mpsc::Sender<Message>,
    supervisor: Supervisor,
    handler: Arc<dyn MessageHandler>,
}

/// A joined channel, or the private channel.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    pub(crate) fn new(
        name: &str,
        client: Weak<Shared>,
        outbound: mpsc::Sender<Message>,
        supervisor: Supervisor,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        let (send_tx, send_rx) = mpsc::channel(CHANNEL_QUEUE_SIZE);
        let (receive_tx, receive_rx) = mpsc::channel(CHANNEL_QUEUE_SIZE);
        Self {
            inner: Arc::new(ChannelInner {
                name: name.to_string(),
                state: Mutex::new(ChannelState::default()),
                members: Members::default(),
                send_tx,
                receive_tx,
                queues: Mutex::new(Some((receive_rx, send_rx))),
                started: Signal::new(),
                killed: supervisor.child_token(),
                rejection: Mutex::new(None),
                client,
                outbound,
                supervisor,
                handler,
            }),
        }
    }

    /// Spawn the receive and transmit tasks. Does nothing if already started
    /// or killed.
    pub(crate) fn start(&self) {
        if self.is_killed() {
            debug!(channel = %self, "not starting killed channel");
            return;
        }
        let Some((receive_rx, send_rx)) = self.inner.queues.lock().take() else {
            return;
        };

        let span = tracing::info_span!("channel", name = %self.inner.name);
        let supervisor = &self.inner.supervisor;
        supervisor.spawn(
            "channel-rx",
            receive_loop(self.clone(), receive_rx).instrument(span.clone()),
        );
        supervisor.spawn(
            "channel-tx",
            transmit_loop(self.clone(), send_rx).instrument(span),
        );
        self.inner.started.fire();
        debug!(channel = %self, "channel started");
    }

    /// Stop both tasks and drop anything still queued. Idempotent.
    pub(crate) fn kill(&self) {
        self.inner.killed.cancel();
        self.inner.queues.lock().take();
    }

    /// Kill because the server refused the JOIN.
    pub(crate) fn reject(&self, code: u16, reason: String) {
        self.inner
            .rejection
            .lock()
            .get_or_insert(Rejection { code, reason });
        self.kill();
    }

    /// The refusal recorded by [`reject`](Self::reject), as a join error.
    pub(crate) fn rejection(&self) -> Option<ClientError> {
        self.inner
            .rejection
            .lock()
            .as_ref()
            .map(|r| ClientError::JoinRejected {
                channel: self.name().to_string(),
                code: r.code,
                reason: r.reason.clone(),
            })
    }

    pub(crate) async fn wait_started(&self) {
        self.inner.started.wait().await
    }

    pub(crate) async fn wait_killed(&self) {
        self.inner.killed.cancelled().await
    }

    pub(crate) fn is_killed(&self) -> bool {
        self.inner.killed.is_cancelled()
    }

    pub(crate) fn same(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn client(&self) -> Option<Client> {
        self.inner.client.upgrade().map(Client::from_shared)
    }

    /// Put a chat message on the send queue, waiting for room.
    pub(crate) async fn enqueue(&self, msg: ChatMessage) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.inner.killed.cancelled() => Err(ClientError::ChannelClosed(self.name().to_string())),
            res = self.inner.send_tx.send(msg) => {
                res.map_err(|_| ClientError::ChannelClosed(self.name().to_string()))
            }
        }
    }

    /// Hand an inbound chat message to the receive task.
    pub(crate) async fn deliver(&self, msg: ChatMessage) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.inner.killed.cancelled() => Err(ClientError::ChannelClosed(self.name().to_string())),
            res = self.inner.receive_tx.send(msg) => {
                res.map_err(|_| ClientError::ChannelClosed(self.name().to_string()))
            }
        }
    }

    async fn send_command(&self, command: &str, params: &[&str]) {
        if let Some(client) = self.client() {
            client.send_message(Message::new(command, params.iter().copied())).await;
        }
    }

    /// Say `text` in this channel. Empty text is ignored.
    pub async fn say(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if text.is_empty() {
            return Ok(());
        }
        if self.is_private() {
            debug!("say on the private channel has no target");
            return Ok(());
        }
        let client = self.client().ok_or(ClientError::ConnectionClosed)?;
        self.enqueue(ChatMessage::new(vec![text], self.clone(), client))
            .await
    }

    /// Ask the server to change the topic.
    pub async fn set_topic(&self, topic: &str) {
        if self.is_private() {
            debug!("attempt to set topic on private");
            return;
        }
        self.send_command("TOPIC", &[&self.inner.name, topic]).await;
    }

    /// Ask the server for the current topic.
    pub async fn query_topic(&self) {
        if self.is_private() {
            debug!("attempt to query topic on private");
            return;
        }
        self.send_command("TOPIC", &[&self.inner.name]).await;
    }

    /// Leave the channel.
    pub async fn part(&self) {
        if self.is_private() {
            return;
        }
        info!(channel = %self, "parting");
        self.send_command("PART", &[&self.inner.name]).await;
        self.kill();
    }

    /// Longest text that still fits one PRIVMSG line from us.
    pub fn msg_limit(&self) -> usize {
        let client = self.client();
        let prefix_len = client.as_ref().map_or(0, |c| c.prefix().len());
        let target_len = if self.is_private() {
            // Replies go to the sender, whose nick may exceed the RFC limit
            client
                .as_ref()
                .and_then(|c| c.isupport("NICKLEN"))
                .and_then(|len| len.parse::<usize>().ok())
                .map_or(NICK_LENGTH_LIMIT, |len| len.max(NICK_LENGTH_LIMIT))
        } else {
            self.inner.name.len()
        };
        MAX_MESSAGE_SIZE.saturating_sub(
            PRIVMSG_SEPARATOR + prefix_len + PRIVMSG_COMMAND + target_len + PRIVMSG_TAIL,
        )
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn topic(&self) -> String {
        self.inner.state.lock().topic.clone()
    }

    pub fn topic_meta(&self) -> Option<TopicMeta> {
        self.inner.state.lock().topic_meta.clone()
    }

    pub fn modes(&self) -> String {
        self.inner.state.lock().modes.clone()
    }

    pub(crate) fn set_topic_text(&self, topic: &str) {
        self.inner.state.lock().topic = topic.to_string();
    }

    pub(crate) fn set_topic_meta(&self, meta: TopicMeta) {
        self.inner.state.lock().topic_meta = Some(meta);
    }

    pub(crate) fn set_modes(&self, modes: &str) {
        self.inner.state.lock().modes = modes.to_string();
    }

    pub fn members(&self) -> &Members {
        &self.inner.members
    }

    pub fn has_member(&self, nick: &str) -> bool {
        self.inner.members.contains(nick)
    }

    pub fn is_private(&self) -> bool {
        self.inner.name.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.is_fired()
    }
}

/// Identity: two handles are equal when they share one channel actor.
impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Channel {}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("started", &self.is_started())
            .field("killed", &self.is_killed())
            .finish()
    }
}

async fn receive_loop(channel: Channel, mut queue: mpsc::Receiver<ChatMessage>) -> Result<()> {
    let killed = channel.inner.killed.clone();
    let handler = channel.inner.handler.clone();
    loop {
        let msg = tokio::select! {
            biased;
            _ = killed.cancelled() => return Ok(()),
            msg = queue.recv() => msg,
        };
        let Some(msg) = msg else {
            channel.kill();
            return Ok(());
        };
        if killed.is_cancelled() {
            return Ok(());
        }
        handler.handle(msg).await;
    }
}

async fn transmit_loop(channel: Channel, mut queue: mpsc::Receiver<ChatMessage>) -> Result<()> {
    let killed = channel.inner.killed.clone();
    let outbound = channel.inner.outbound.clone();
    loop {
        let msg = tokio::select! {
            biased;
            _ = killed.cancelled() => return Ok(()),
            msg = queue.recv() => msg,
        };
        let Some(msg) = msg else {
            info!("send queue closed, killing channel");
            channel.kill();
            return Ok(());
        };
        for wire in msg.messages() {
            tokio::select! {
                biased;
                _ = killed.cancelled() => return Ok(()),
                res = outbound.send(wire) => {
                    if res.is_err() {
                        return Err(ClientError::ConnectionClosed);
                    }
                }
            }
        }
    }
}
