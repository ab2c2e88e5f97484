//! RPL_ISUPPORT (005) token parsing.
//!
//! A 005 line looks like
//! `:srv 005 <nick> CHANTYPES=# PREFIX=(ov)@+ EXCEPTS :are supported by this server`.
//! The first parameter is our nick and the trailing text is human readable;
//! everything in between is a `KEY=VALUE` or bare `KEY` token.

/// One advertised token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

/// Tokens from one or more 005 lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport<'a> {
    entries: Vec<IsupportEntry<'a>>,
}

impl<'a> Isupport<'a> {
    /// Parse bare tokens.
    pub fn parse_params(params: &[&'a str]) -> Self {
        let mut entries = Vec::with_capacity(params.len());
        for &p in params {
            if p.is_empty() || p.contains(' ') {
                continue;
            }
            let (key, value) = match p.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (p, None),
            };
            entries.push(IsupportEntry { key, value });
        }
        Isupport { entries }
    }

    /// Parse the full parameter list of a 005 reply, skipping the nick and
    /// the human readable trailing text.
    pub fn from_response_args(args: &[&'a str]) -> Option<Self> {
        if args.is_empty() {
            return None;
        }

        let mut tokens = &args[1..];
        if let Some(last) = tokens.last() {
            if last.contains(' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }
        Some(Self::parse_params(tokens))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IsupportEntry<'a>> {
        self.entries.iter()
    }

    /// Value for `key`; `Some(None)` for a bare token. Later entries win.
    pub fn get(&self, key: &str) -> Option<Option<&'a str>> {
        self.entries
            .iter()
            .rfind(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value)
    }

    pub fn prefix(&self) -> Option<PrefixSpec<'a>> {
        self.get("PREFIX").flatten().and_then(PrefixSpec::parse)
    }
}

/// The `PREFIX=(modes)sigils` token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixSpec<'a> {
    pub modes: &'a str,
    pub prefixes: &'a str,
}

/// Status sigils assumed when the server did not advertise PREFIX.
pub const DEFAULT_PREFIXES: &str = "~&@%+";

impl<'a> PrefixSpec<'a> {
    pub fn parse(s: &'a str) -> Option<Self> {
        if let Some(open) = s.find('(') {
            let close = open + 1 + s[open + 1..].find(')')?;
            let modes = &s[open + 1..close];
            let prefixes = &s[close + 1..];
            if !modes.is_empty() && !prefixes.is_empty() {
                return Some(PrefixSpec { modes, prefixes });
            }
        } else if !s.is_empty() {
            return Some(PrefixSpec { modes: "", prefixes: s });
        }
        None
    }
}

/// Strip leading status sigils (`@`, `+`, ...) from a NAMES entry.
///
/// ```
/// use slirc_client::isupport::strip_status;
///
/// assert_eq!(strip_status("@+demsh", "~&@%+"), "demsh");
/// assert_eq!(strip_status("plain", "~&@%+"), "plain");
/// ```
pub fn strip_status<'n>(nick: &'n str, prefixes: &str) -> &'n str {
    nick.trim_start_matches(|c: char| prefixes.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_args() {
        let args = [
            "ircfw",
            "CHANTYPES=#&",
            "PREFIX=(ov)@+",
            "EXCEPTS",
            "are supported by this server",
        ];
        let isupport = Isupport::from_response_args(&args).unwrap();
        assert_eq!(isupport.iter().count(), 3);
        assert_eq!(isupport.get("CHANTYPES"), Some(Some("#&")));
        assert_eq!(isupport.get("excepts"), Some(None));
        assert_eq!(isupport.get("ircfw"), None);
        assert_eq!(isupport.get("NETWORK"), None);
    }

    #[test]
    fn test_value_with_equals() {
        let isupport = Isupport::parse_params(&["EXTBAN=~,qjncrRa", "KEY=a=b"]);
        assert_eq!(isupport.get("KEY"), Some(Some("a=b")));
    }

    #[test]
    fn test_empty_args() {
        assert!(Isupport::from_response_args(&[]).is_none());
    }

    #[test]
    fn test_prefix_spec() {
        let spec = PrefixSpec::parse("(qaohv)~&@%+").unwrap();
        assert_eq!(spec.modes, "qaohv");
        assert_eq!(spec.prefixes, "~&@%+");
        assert!(PrefixSpec::parse("(ov").is_none());
        assert!(PrefixSpec::parse("").is_none());

        let isupport = Isupport::parse_params(&["PREFIX=(ov)@+"]);
        assert_eq!(isupport.prefix().unwrap().prefixes, "@+");
    }

    #[test]
    fn test_strip_status() {
        assert_eq!(strip_status("~owner", DEFAULT_PREFIXES), "owner");
        assert_eq!(strip_status("%half", "@+"), "%half");
    }
}
