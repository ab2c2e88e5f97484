//! The protocol state machine.
//!
//! [`dispatch`] classifies each inbound [`Message`] into a [`Command`] and
//! applies its effect to the session or to a channel. Commands without a
//! handler are logged at debug level and otherwise ignored.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

use crate::channel::{Channel, TopicMeta};
use crate::chat::ChatMessage;
use crate::client::Client;
use crate::command::Command;
use crate::isupport::{strip_status, Isupport, PrefixSpec, DEFAULT_PREFIXES};
use crate::message::Message;
use crate::response::Response;
use crate::validation::{is_channel, is_nick};

/// How long routing an inbound PRIVMSG may wait for room on a channel queue.
pub const ROUTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Apply one inbound message.
pub(crate) async fn dispatch(client: &Client, msg: &Message) {
    match Command::from(msg) {
        Command::PING => handle_ping(client, msg).await,
        Command::PONG => trace!("pong"),
        Command::PRIVMSG | Command::NOTICE => handle_privmsg(client, msg).await,
        Command::ERROR => error!(line = %msg, "error from server"),
        Command::JOIN => handle_join(client, msg),
        Command::NICK => handle_nick(client, msg),
        Command::PART => handle_part(client, msg),
        Command::MODE => handle_mode(client, msg).await,
        Command::Response(resp) => handle_response(client, resp, msg),
        Command::Raw(_) => debug!(line = %msg, "unhandled"),
    }
}

fn handle_response(client: &Client, resp: Response, msg: &Message) {
    match resp {
        Response::RPL_WELCOME => handle_welcome(client, msg),
        Response::RPL_MYINFO => handle_myinfo(client, msg),
        Response::RPL_ISUPPORT => handle_isupport(client, msg),
        Response::RPL_TOPIC => handle_topic(client, msg),
        Response::RPL_TOPICWHOTIME => handle_topic_meta(client, msg),
        Response::RPL_NAMREPLY => handle_names(client, msg),
        Response::RPL_MOTD => handle_motd(client, msg),
        Response::RPL_HOSTHIDDEN => handle_hostname(client, msg),
        Response::RPL_ENDOFMOTD => {
            debug!(lines = client.shared().session.lock().motd.len(), "end of MOTD")
        }
        r if r.is_join_error() => handle_join_error(client, r, msg),
        r if r.is_whois_related() => trace!(line = %msg, "whois reply"),
        _ => debug!(line = %msg, "unhandled"),
    }
}

async fn handle_ping(client: &Client, msg: &Message) {
    let pong = Message::from_raw_params("PONG", msg.raw_params().to_vec(), client.charset());
    client.send_message(pong).await;
}

/// The last space-separated token of the welcome text, which servers make
/// our full `nick!ident@host`.
fn welcome_prefix(text: &str) -> &str {
    text.rsplit(' ').next().unwrap_or(text)
}

fn handle_welcome(client: &Client, msg: &Message) {
    let Some(text) = msg.param(msg.param_count().saturating_sub(1)) else {
        debug!(line = %msg, "RPL_WELCOME without parameters");
        return;
    };
    let prefix = welcome_prefix(&text);
    if prefix.is_empty() {
        return;
    }
    info!(prefix, "registered");
    client.shared().session.lock().prefix = prefix.to_string();
}

fn handle_myinfo(client: &Client, msg: &Message) {
    if msg.param_count() != 5 {
        debug!(line = %msg, "RPL_MYINFO param length is not 5");
        return;
    }
    let params = msg.params();
    let mut session = client.shared().session.lock();
    session.user_modes = params[3].to_string();
    session.chan_modes = params[4].to_string();
}

fn handle_isupport(client: &Client, msg: &Message) {
    let params = msg.params();
    let args: Vec<&str> = params.iter().map(|p| p.as_ref()).collect();
    if let Some(isupport) = Isupport::from_response_args(&args) {
        let mut session = client.shared().session.lock();
        for entry in isupport.iter() {
            session
                .isupport
                .insert(entry.key.to_string(), entry.value.unwrap_or("").to_string());
        }
    }
    if client.shared().ready.fire() {
        info!("server ready, joins allowed");
    }
}

fn handle_motd(client: &Client, msg: &Message) {
    let params = msg.params();
    let line = params.get(1..).unwrap_or_default().join(" ");
    client
        .shared()
        .session
        .lock()
        .motd
        .push(line.trim().to_string());
}

fn handle_hostname(client: &Client, msg: &Message) {
    match msg.param(1) {
        Some(host) if !host.is_empty() => client.set_hostname(&host),
        _ => debug!(line = %msg, "RPL_HOSTHIDDEN without host"),
    }
}

async fn handle_mode(client: &Client, msg: &Message) {
    if msg.param_count() < 2 {
        warn!(line = %msg, "MODE with less than 2 parameters");
        return;
    }
    let (Some(target), Some(mode)) = (msg.param(0), msg.param(1)) else {
        return;
    };
    if is_nick(&target) {
        if !target.eq_ignore_ascii_case(&client.nick()) {
            debug!(%target, "MODE for another nick");
            return;
        }
        client.shared().session.lock().user_mode = mode.to_string();
        if let Some(password) = client
            .config()
            .nickserv_password
            .as_deref()
            .filter(|p| !p.is_empty())
        {
            info!("identifying with NickServ");
            let identify = format!("identify {}", password);
            client
                .send_message(Message::outbound(
                    "PRIVMSG",
                    &["NickServ", identify.as_str()],
                    client.charset(),
                ))
                .await;
        }
    } else if is_channel(&target) {
        match client.channel(&target) {
            Some(channel) => channel.set_modes(&mode),
            None => debug!(%target, "MODE for unknown channel"),
        }
    }
}

fn handle_join(client: &Client, msg: &Message) {
    let Some(name) = msg.param(0) else {
        return;
    };
    let joiner = msg.nick();
    if joiner == client.nick() {
        match client.channel(&name) {
            Some(channel) => {
                info!(channel = %name, "joined");
                channel.start();
            }
            None => debug!(channel = %name, "unsolicited JOIN"),
        }
        return;
    }
    match client.channel(&name) {
        Some(channel) => channel.members().add(&joiner),
        None => debug!(line = %msg, "unsolicited notification about join"),
    }
}

fn handle_part(client: &Client, msg: &Message) {
    let Some(name) = msg.param(0) else {
        return;
    };
    let leaver = msg.nick();
    if leaver == client.nick() {
        // A pending entry belongs to a rejoin issued after this PART
        let removed = {
            let mut session = client.shared().session.lock();
            match session.channels.get(&*name) {
                Some(channel) if channel.is_started() => session.channels.remove(&*name),
                _ => None,
            }
        };
        match removed {
            Some(channel) => {
                info!(channel = %name, "parted");
                channel.kill();
            }
            None => debug!(channel = %name, "PART for a channel not joined"),
        }
        return;
    }
    if let Some(channel) = client.channel(&name) {
        channel.members().remove(&leaver);
    }
}

fn handle_nick(client: &Client, msg: &Message) {
    let old = msg.nick();
    let Some(new) = msg.param(0) else {
        return;
    };
    if old == client.nick() {
        info!(%old, %new, "nick changed");
        client.set_nick_in_prefix(&new);
        return;
    }
    let channels: Vec<Channel> = client
        .shared()
        .session
        .lock()
        .channels
        .values()
        .cloned()
        .collect();
    for channel in channels {
        channel.members().rename(&old, &new);
    }
}

async fn handle_privmsg(client: &Client, msg: &Message) {
    let Some(target) = msg.param(0) else {
        return;
    };
    let channel = if is_nick(&target) {
        client.private_channel()
    } else if is_channel(&target) {
        match client.channel(&target) {
            Some(channel) => channel,
            None => {
                debug!(line = %msg, "message for unknown channel");
                return;
            }
        }
    } else {
        debug!(line = %msg, "message for invalid target");
        return;
    };

    let chat = ChatMessage::from_wire(msg, channel.clone(), client.clone());
    match timeout(ROUTE_TIMEOUT, channel.deliver(chat)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(channel = %channel, %err, "message dropped"),
        Err(_) => warn!(channel = %channel, "handler queue full, message dropped"),
    }
}

fn handle_topic(client: &Client, msg: &Message) {
    let (Some(name), Some(topic)) = (msg.channel_name(), msg.param(2)) else {
        debug!(line = %msg, "short RPL_TOPIC");
        return;
    };
    if let Some(channel) = client.channel(&name) {
        channel.set_topic_text(&topic);
    }
}

fn handle_topic_meta(client: &Client, msg: &Message) {
    let (Some(name), Some(setter), Some(time)) = (msg.param(1), msg.param(2), msg.param(3))
    else {
        debug!(line = %msg, "short RPL_TOPICWHOTIME");
        return;
    };
    if let Some(channel) = client.channel(&name) {
        channel.set_topic_meta(TopicMeta::new(&setter, &time));
    }
}

fn handle_names(client: &Client, msg: &Message) {
    let (Some(name), Some(names)) = (msg.channel_name(), msg.param(3)) else {
        debug!(line = %msg, "short RPL_NAMREPLY");
        return;
    };
    let Some(channel) = client.channel(&name) else {
        debug!(channel = %name, "names for unknown channel");
        return;
    };
    let prefixes = client
        .isupport("PREFIX")
        .and_then(|spec| PrefixSpec::parse(&spec).map(|p| p.prefixes.to_string()))
        .unwrap_or_else(|| DEFAULT_PREFIXES.to_string());
    for nick in names.split(' ') {
        channel.members().add(strip_status(nick, &prefixes));
    }
}

fn handle_join_error(client: &Client, resp: Response, msg: &Message) {
    let Some(name) = msg.param(1) else {
        debug!(line = %msg, "join error without channel");
        return;
    };
    let reason = msg
        .param(msg.param_count().saturating_sub(1))
        .map(|r| r.into_owned())
        .unwrap_or_default();
    let removed = client.shared().session.lock().channels.remove(&*name);
    match removed {
        Some(channel) => {
            warn!(channel = %name, code = resp.code(), %reason, "join rejected");
            channel.reject(resp.code(), reason);
        }
        None => debug!(line = %msg, "join error for unknown channel"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_prefix() {
        assert_eq!(
            welcome_prefix("Welcome to the Internet Relay Network ircfw!~ircfw@127.0.0.1"),
            "ircfw!~ircfw@127.0.0.1"
        );
        assert_eq!(welcome_prefix("ircfw"), "ircfw");
        assert_eq!(welcome_prefix(""), "");
    }
}
