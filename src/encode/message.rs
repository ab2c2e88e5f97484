use std::io::{self, Write};

use super::{joins_trailing, sanitize, write_cmd_freeform, write_cmd_joined, IrcEncode};
use crate::message::Message;

impl IrcEncode for Message {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut line = Vec::with_capacity(128);

        if let Some(prefix) = self.raw_prefix() {
            line.push(b':');
            line.extend_from_slice(prefix);
            line.push(b' ');
        }

        let command = self.command().as_bytes();
        if joins_trailing(self.command()) {
            write_cmd_joined(&mut line, command, self.raw_params())?;
        } else {
            write_cmd_freeform(&mut line, command, self.raw_params())?;
        }

        sanitize(&mut line);
        line.extend_from_slice(b"\r\n");
        w.write_all(&line)?;
        Ok(line.len())
    }
}
