//! Connection configuration.
//!
//! ```
//! use std::time::Duration;
//! use slirc_client::ClientConfig;
//!
//! let config = ClientConfig::builder("ircfw")
//!     .username("bot")
//!     .realname("IRC framework")
//!     .charset("windows-1251")
//!     .alive_timeout(Duration::from_secs(120))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.nickname, "ircfw");
//! assert_eq!(config.legacy_charset().unwrap().unwrap().name(), "windows-1251");
//! ```

use std::time::Duration;

use crate::charset::Charset;
use crate::error::{ClientError, Result};
use crate::util::MAX_MESSAGE_SIZE;
use crate::validation::validate_nick;

/// Default nickname, ident and real name.
pub const DEFAULT_NAME: &str = "ircfw";

/// Silence allowed from the server before the connection is declared dead.
pub const DEFAULT_ALIVE_TIMEOUT: Duration = Duration::from_secs(240);

/// Settings for one connection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Nickname to register with.
    pub nickname: String,
    /// Ident sent in USER.
    pub username: String,
    /// Real name sent in USER.
    pub realname: String,
    /// Server password, sent as PASS before registration.
    pub password: Option<String>,
    /// NickServ password, sent with `identify` once the server sets our user mode.
    pub nickserv_password: Option<String>,
    /// Label of a single-byte fallback charset, e.g. `windows-1251`.
    pub charset: Option<String>,
    /// Silence allowed from the server.
    pub alive_timeout: Duration,
    /// Longest accepted inbound line, terminator included.
    pub max_line_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nickname: DEFAULT_NAME.to_string(),
            username: DEFAULT_NAME.to_string(),
            realname: DEFAULT_NAME.to_string(),
            password: None,
            nickserv_password: None,
            charset: None,
            alive_timeout: DEFAULT_ALIVE_TIMEOUT,
            max_line_len: MAX_MESSAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Start a builder. Ident and real name default to the nickname.
    pub fn builder(nickname: impl Into<String>) -> ClientConfigBuilder {
        let nickname = nickname.into();
        ClientConfigBuilder {
            config: ClientConfig {
                username: nickname.clone(),
                realname: nickname.clone(),
                nickname,
                ..ClientConfig::default()
            },
        }
    }

    /// Resolve the fallback charset label.
    pub fn legacy_charset(&self) -> Result<Option<Charset>> {
        match self.charset.as_deref() {
            None => Ok(None),
            Some(label) => Charset::for_label(label).map(Some).ok_or_else(|| {
                ClientError::InvalidConfig(format!("{:?} is not a single-byte charset", label))
            }),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        validate_nick(&self.nickname).map_err(|cause| ClientError::InvalidNick {
            nick: self.nickname.clone(),
            cause,
        })?;
        if self.username.trim().is_empty() || self.username.contains(' ') {
            return Err(ClientError::InvalidConfig(format!(
                "invalid username {:?}",
                self.username
            )));
        }
        if self.realname.trim().is_empty() {
            return Err(ClientError::InvalidConfig("empty realname".to_string()));
        }
        if self.alive_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "alive timeout must be non-zero".to_string(),
            ));
        }
        if self.max_line_len < 3 {
            return Err(ClientError::InvalidConfig(format!(
                "max line length {} too small",
                self.max_line_len
            )));
        }
        self.legacy_charset()?;
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn realname(mut self, realname: impl Into<String>) -> Self {
        self.config.realname = realname.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    pub fn nickserv_password(mut self, password: impl Into<String>) -> Self {
        self.config.nickserv_password = Some(password.into());
        self
    }

    pub fn charset(mut self, label: impl Into<String>) -> Self {
        self.config.charset = Some(label.into());
        self
    }

    pub fn alive_timeout(mut self, timeout: Duration) -> Self {
        self.config.alive_timeout = timeout;
        self
    }

    pub fn max_line_len(mut self, len: usize) -> Self {
        self.config.max_line_len = len;
        self
    }

    /// Validate and finish.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.nickname, "ircfw");
        assert_eq!(config.alive_timeout, Duration::from_secs(240));
        assert_eq!(config.max_line_len, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_inherits_nick() {
        let config = ClientConfig::builder("demsh").build().unwrap();
        assert_eq!(config.username, "demsh");
        assert_eq!(config.realname, "demsh");
        assert_eq!(config.legacy_charset().unwrap(), None);
    }

    #[test]
    fn test_builder_rejects_bad_nick() {
        let err = ClientConfig::builder("#notanick").build().unwrap_err();
        assert!(matches!(err, ClientError::InvalidNick { .. }));
        let err = ClientConfig::builder("waytoolongnick").build().unwrap_err();
        assert!(matches!(err, ClientError::InvalidNick { .. }));
    }

    #[test]
    fn test_builder_rejects_bad_charset() {
        for label in ["utf-8", "shift_jis", "nope"] {
            let err = ClientConfig::builder("ircfw").charset(label).build().unwrap_err();
            assert!(matches!(err, ClientError::InvalidConfig(_)), "{}", label);
        }
        assert!(ClientConfig::builder("ircfw").charset("koi8-r").build().is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_fields() {
        assert!(ClientConfig::builder("ircfw").username("").build().is_err());
        assert!(ClientConfig::builder("ircfw").username("a b").build().is_err());
        assert!(ClientConfig::builder("ircfw").realname("  ").build().is_err());
        assert!(ClientConfig::builder("ircfw")
            .alive_timeout(Duration::ZERO)
            .build()
            .is_err());
    }
}
