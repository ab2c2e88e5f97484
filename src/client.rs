//! The connection actor.
//!
//! A [`Client`] owns one upstream link. Construction splits the socket and
//! spawns four supervised tasks:
//!
//! - **read**: frames lines with [`LineCodec`], parses them and pushes them on
//!   the inbound queue. Malformed lines are logged and dropped; framing and
//!   socket errors are fatal.
//! - **write**: drains the outbound queue onto the socket, honouring each
//!   message's deadline.
//! - **keepalive**: pings the server when it goes quiet and declares the
//!   connection dead after `alive_timeout` of silence.
//! - **dispatch**: the single consumer of the inbound queue; runs the handler
//!   for each command in arrival order.
//!
//! Session state lives behind one lock that is only held for a single
//! read-modify-write, never across a queue operation or socket I/O.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, timeout_at, Instant, MissedTickBehavior};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace, warn, Instrument};

use crate::channel::Channel;
use crate::charset::Charset;
use crate::chat::MessageHandler;
use crate::config::ClientConfig;
use crate::error::{ClientError, ProtocolError, Result};
use crate::handlers;
use crate::line::LineCodec;
use crate::message::Message;
use crate::signal::Signal;
use crate::supervisor::Supervisor;
use crate::util::pop;
use crate::validation::{validate_channel, validate_nick};

/// Capacity of the parsed-message queue between read and dispatch.
pub const INBOUND_QUEUE_SIZE: usize = 32;

/// Capacity of the wire-message queue feeding the write task.
pub const OUTBOUND_QUEUE_SIZE: usize = 32;

/// How long an internal command waits for room on the outbound queue.
const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Budget for writing out already queued messages after a quit.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Smallest keepalive tick.
const MIN_KEEPALIVE_PERIOD: Duration = Duration::from_millis(1);

/// Mutable session state.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) prefix: String,
    pub(crate) user_mode: String,
    pub(crate) user_modes: String,
    pub(crate) chan_modes: String,
    pub(crate) motd: Vec<String>,
    pub(crate) isupport: HashMap<String, String>,
    pub(crate) last_message: Instant,
    pub(crate) channels: HashMap<String, Channel>,
}

impl Session {
    fn new(nickname: &str) -> Self {
        Self {
            prefix: nickname.to_string(),
            user_mode: String::new(),
            user_modes: String::new(),
            chan_modes: String::new(),
            motd: Vec::new(),
            isupport: HashMap::new(),
            last_message: Instant::now(),
            channels: HashMap::new(),
        }
    }

    pub(crate) fn nick(&self) -> &str {
        pop(&self.prefix, '!').0
    }
}

pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) charset: Option<Charset>,
    pub(crate) session: Mutex<Session>,
    pub(crate) outbound: mpsc::Sender<Message>,
    pub(crate) ready: Signal,
    pub(crate) supervisor: Supervisor,
    pub(crate) private: Channel,
    pub(crate) handler: Arc<dyn MessageHandler>,
}

/// Handle to one IRC connection. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    /// Start a connection over an already connected socket.
    ///
    /// Registration (PASS, NICK, USER) is queued before this returns; use
    /// [`join`](Self::join) to enter channels once the server is ready.
    pub async fn new<S, H>(socket: S, config: ClientConfig, handler: H) -> Result<Client>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        H: MessageHandler,
    {
        config.validate()?;
        let charset = config.legacy_charset()?;

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_SIZE);
        let supervisor = Supervisor::new();
        let handler: Arc<dyn MessageHandler> = Arc::new(handler);

        let shared = Arc::new_cyclic(|weak| Shared {
            private: Channel::new(
                "",
                weak.clone(),
                outbound_tx.clone(),
                supervisor.clone(),
                handler.clone(),
            ),
            session: Mutex::new(Session::new(&config.nickname)),
            config,
            charset,
            outbound: outbound_tx,
            ready: Signal::new(),
            supervisor: supervisor.clone(),
            handler,
        });
        let client = Client { shared };

        let span = tracing::info_span!("irc", nick = %client.shared.config.nickname);
        let (reader, writer) = tokio::io::split(socket);
        supervisor.spawn(
            "write",
            write_loop(writer, outbound_rx, supervisor.clone()).instrument(span.clone()),
        );
        supervisor.spawn(
            "read",
            read_loop(client.clone(), reader, inbound_tx).instrument(span.clone()),
        );
        supervisor.spawn(
            "keepalive",
            keepalive_loop(client.clone()).instrument(span.clone()),
        );
        supervisor.spawn(
            "dispatch",
            dispatch_loop(client.clone(), inbound_rx).instrument(span.clone()),
        );

        client.register().instrument(span).await;
        client.shared.private.start();
        Ok(client)
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Client { shared }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    async fn register(&self) {
        let config = &self.shared.config;
        if let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) {
            self.send_message(Message::new("PASS", [password])).await;
        }
        self.send_message(Message::new("NICK", [config.nickname.as_str()]))
            .await;
        self.send_message(Message::new(
            "USER",
            [
                config.username.as_str(),
                "0.0.0.0",
                "0.0.0.0",
                config.realname.as_str(),
            ],
        ))
        .await;
    }

    /// Queue a wire message, giving up after a short timeout or on shutdown.
    ///
    /// Returns whether the message was queued.
    pub(crate) async fn send_message(&self, msg: Message) -> bool {
        let token = self.shared.supervisor.token();
        let command = msg.command().to_string();
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(%command, "connection closing, message dropped");
                false
            }
            res = timeout(SEND_TIMEOUT, self.shared.outbound.send(msg)) => match res {
                Ok(Ok(())) => true,
                Ok(Err(_)) => {
                    debug!(%command, "outbound queue closed, message dropped");
                    false
                }
                Err(_) => {
                    warn!(%command, "outbound queue full, message dropped");
                    false
                }
            },
        }
    }

    /// Join `name` and wait for the server to confirm it.
    ///
    /// Returns the existing channel if it is already joined. Concurrent joins
    /// of the same name share one channel. Dropping the returned future before
    /// it resolves abandons the join and removes the pending channel.
    pub async fn join(&self, name: &str) -> Result<Channel> {
        validate_channel(name).map_err(|cause| ClientError::InvalidChannel {
            channel: name.to_string(),
            cause,
        })?;
        if let Some(channel) = self.channel(name) {
            if channel.is_started() && !channel.is_killed() {
                return Ok(channel);
            }
        }

        // Servers reject JOIN sent before registration completes
        let token = self.shared.supervisor.token().clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ClientError::ConnectionClosed),
            _ = self.shared.ready.wait() => {}
        }
        if token.is_cancelled() {
            return Err(ClientError::ConnectionClosed);
        }

        let (channel, created) = {
            let mut session = self.shared.session.lock();
            match session.channels.get(name) {
                Some(channel) if !channel.is_killed() => (channel.clone(), false),
                _ => {
                    let channel = self.new_channel(name);
                    session.channels.insert(name.to_string(), channel.clone());
                    (channel, true)
                }
            }
        };
        if channel.is_started() {
            return Ok(channel);
        }

        let mut pending = PendingJoin {
            shared: &self.shared,
            channel: channel.clone(),
            armed: created,
        };
        if created {
            info!(channel = name, "joining");
            self.send_message(Message::new("JOIN", [name])).await;
        }

        let outcome = tokio::select! {
            biased;
            _ = channel.wait_started() => Ok(channel.clone()),
            _ = channel.wait_killed() => Err(channel
                .rejection()
                .unwrap_or_else(|| ClientError::ChannelClosed(name.to_string()))),
        };
        pending.armed = false;
        outcome
    }

    /// [`join`](Self::join) with a time limit.
    pub async fn join_timeout(&self, name: &str, limit: Duration) -> Result<Channel> {
        match timeout(limit, self.join(name)).await {
            Ok(res) => res,
            Err(_) => Err(ClientError::JoinCancelled(name.to_string())),
        }
    }

    pub(crate) fn new_channel(&self, name: &str) -> Channel {
        Channel::new(
            name,
            Arc::downgrade(&self.shared),
            self.shared.outbound.clone(),
            self.shared.supervisor.clone(),
            self.shared.handler.clone(),
        )
    }

    /// Ask the server for a new nick. Invalid nicks are logged and ignored.
    pub async fn set_nick(&self, nick: &str) {
        if let Err(err) = validate_nick(nick) {
            warn!(nick, %err, "attempt to set invalid nick");
            return;
        }
        self.send_message(Message::new("NICK", [nick])).await;
    }

    /// Send WHOIS. Invalid nicks are logged and ignored.
    pub async fn whois(&self, nick: &str) {
        if let Err(err) = validate_nick(nick) {
            warn!(nick, %err, "whois for invalid nick");
            return;
        }
        self.send_message(Message::new("WHOIS", [nick])).await;
    }

    /// Send QUIT, kill every channel and shut the connection down.
    ///
    /// Messages already queued are still written within a short budget.
    /// [`wait`](Self::wait) then returns `Ok(())`.
    pub async fn quit(&self, reason: &str) {
        info!(reason, "quitting");
        self.send_message(Message::new("QUIT", [reason])).await;
        let channels: Vec<Channel> = {
            let mut session = self.shared.session.lock();
            session.channels.drain().map(|(_, channel)| channel).collect()
        };
        for channel in channels {
            channel.kill();
        }
        self.shared.private.kill();
        self.shared.ready.fire();
        self.shared.supervisor.shutdown();
    }

    /// Wait for every task to exit.
    ///
    /// Returns the first fatal error, or `Ok(())` after [`quit`](Self::quit).
    /// Must not be awaited from inside the message handler.
    pub async fn wait(&self) -> Result<()> {
        self.shared.supervisor.wait().await
    }

    /// Our current `nick!ident@host`, or just the nick before the server
    /// has told us more.
    pub fn prefix(&self) -> String {
        self.shared.session.lock().prefix.clone()
    }

    pub fn nick(&self) -> String {
        self.shared.session.lock().nick().to_string()
    }

    /// MOTD lines received so far.
    pub fn motd(&self) -> Vec<String> {
        self.shared.session.lock().motd.clone()
    }

    /// An ISUPPORT value; bare tokens map to an empty string.
    pub fn isupport(&self, key: &str) -> Option<String> {
        self.shared.session.lock().isupport.get(key).cloned()
    }

    /// Our user mode as last set by the server.
    pub fn user_mode(&self) -> String {
        self.shared.session.lock().user_mode.clone()
    }

    /// User and channel mode alphabets from RPL_MYINFO.
    pub fn modes(&self) -> (String, String) {
        let session = self.shared.session.lock();
        (session.user_modes.clone(), session.chan_modes.clone())
    }

    /// A registered channel by name.
    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.shared.session.lock().channels.get(name).cloned()
    }

    /// The channel carrying direct messages.
    pub fn private_channel(&self) -> Channel {
        self.shared.private.clone()
    }

    /// Whether ISUPPORT has arrived and joins are allowed.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.is_fired()
    }

    /// Whether the connection has shut down or failed.
    pub fn is_closed(&self) -> bool {
        self.shared.supervisor.is_shutdown()
    }

    /// The configured legacy charset.
    pub fn charset(&self) -> Option<Charset> {
        self.shared.charset
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub(crate) fn touch(&self) {
        self.shared.session.lock().last_message = Instant::now();
    }

    pub(crate) fn set_nick_in_prefix(&self, nick: &str) {
        let mut session = self.shared.session.lock();
        let (_, ident_host) = pop(&session.prefix, '!');
        session.prefix = if ident_host.is_empty() {
            nick.to_string()
        } else {
            format!("{}!{}", nick, ident_host)
        };
    }

    pub(crate) fn set_hostname(&self, hostname: &str) {
        let mut session = self.shared.session.lock();
        let (nick, ident_host) = pop(&session.prefix, '!');
        let (ident, _) = pop(ident_host, '@');
        let ident = if ident.is_empty() {
            self.shared.config.username.as_str()
        } else {
            ident
        };
        session.prefix = format!("{}!{}@{}", nick, ident, hostname);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("prefix", &self.prefix())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Removes a half-created channel if its joiner goes away.
struct PendingJoin<'a> {
    shared: &'a Shared,
    channel: Channel,
    armed: bool,
}

impl Drop for PendingJoin<'_> {
    fn drop(&mut self) {
        if !self.armed || self.channel.is_started() {
            return;
        }
        {
            let mut session = self.shared.session.lock();
            let name = self.channel.name();
            if session
                .channels
                .get(name)
                .map_or(false, |existing| existing.same(&self.channel))
            {
                session.channels.remove(name);
            }
        }
        self.channel.kill();
        debug!(channel = %self.channel, "join abandoned");
    }
}

fn write_deadline_exceeded() -> ClientError {
    ClientError::Transport(ProtocolError::Io(io::Error::new(
        io::ErrorKind::TimedOut,
        "write deadline exceeded",
    )))
}

async fn write_one<W>(sink: &mut FramedWrite<W, LineCodec>, msg: Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match msg.deadline() {
        Some(deadline) if deadline <= Instant::now() => {
            warn!(line = %msg, "deadline passed before write, dropped");
            Ok(())
        }
        Some(deadline) => {
            trace!(line = %msg, ">>");
            timeout_at(deadline, sink.send(msg))
                .await
                .map_err(|_| write_deadline_exceeded())??;
            Ok(())
        }
        None => {
            trace!(line = %msg, ">>");
            sink.send(msg).await?;
            Ok(())
        }
    }
}

async fn write_loop<W>(
    writer: W,
    mut outbound: mpsc::Receiver<Message>,
    supervisor: Supervisor,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let token = supervisor.token().clone();
    let mut sink = FramedWrite::new(writer, LineCodec::new());
    loop {
        let msg = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = outbound.recv() => msg,
        };
        let Some(msg) = msg else {
            return Err(ClientError::ConnectionClosed);
        };
        write_one(&mut sink, msg).await?;
    }

    if supervisor.has_failed() {
        return Ok(());
    }
    let flush = async {
        while let Ok(msg) = outbound.try_recv() {
            write_one(&mut sink, msg).await?;
        }
        SinkExt::<Message>::close(&mut sink).await?;
        Ok::<_, ClientError>(())
    };
    match timeout(FLUSH_TIMEOUT, flush).await {
        Ok(Ok(())) => debug!("outbound queue flushed"),
        Ok(Err(err)) => debug!(%err, "flush on shutdown failed"),
        Err(_) => debug!("flush on shutdown timed out"),
    }
    Ok(())
}

async fn read_loop<R>(client: Client, reader: R, inbound: mpsc::Sender<Message>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let token = client.shared.supervisor.token().clone();
    let charset = client.shared.charset;
    let codec = LineCodec::with_max_len(client.shared.config.max_line_len);
    let mut lines = FramedRead::new(reader, codec);
    loop {
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            frame = lines.next() => frame,
        };
        let line = match frame {
            Some(Ok(line)) => line,
            Some(Err(err)) => return Err(ClientError::Transport(err)),
            None => {
                info!("server closed the connection");
                return Err(ClientError::ConnectionClosed);
            }
        };
        client.touch();
        trace!(line = %String::from_utf8_lossy(&line), "<<");

        let msg = match Message::parse(line, charset) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(err = %ClientError::MalformedLine(err), "dropping line");
                continue;
            }
        };
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            res = inbound.send(msg) => {
                if res.is_err() {
                    return Err(ClientError::ConnectionClosed);
                }
            }
        }
    }
}

async fn keepalive_loop(client: Client) -> Result<()> {
    let token = client.shared.supervisor.token().clone();
    let alive = client.shared.config.alive_timeout;
    let period = (alive / 4).max(MIN_KEEPALIVE_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            _ = ticker.tick() => {}
        }
        let (silence, nick) = {
            let session = client.shared.session.lock();
            (session.last_message.elapsed(), session.nick().to_string())
        };
        if silence >= alive {
            warn!(?silence, "server timed out");
            return Err(ClientError::Timeout);
        }
        if silence >= period {
            client.send_message(Message::new("PING", [nick])).await;
        }
    }
}

async fn dispatch_loop(client: Client, mut inbound: mpsc::Receiver<Message>) -> Result<()> {
    let token = client.shared.supervisor.token().clone();
    loop {
        let msg = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            msg = inbound.recv() => msg,
        };
        let Some(msg) = msg else {
            return Err(ClientError::ConnectionClosed);
        };
        handlers::dispatch(&client, &msg).await;
    }
}
