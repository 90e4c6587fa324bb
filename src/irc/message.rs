//! IRC line parsing.
//!
//! Grammar handled here:
//!   [`:`prefix SPACE] command [SPACE middle]* [SPACE `:` trailing]
//!
//! Input is one line with the `\r\n` already removed by the framer.

/// A parsed IRC line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Origin of the message (`nick!user@host` or a server name).
    pub prefix: Option<String>,
    /// Alphabetic command name or a 3-digit numeric reply.
    pub command: String,
    /// Space-separated parameters before the trailing one.
    pub params: Vec<String>,
    /// The `:`-introduced free text. `Some("")` when the colon is present
    /// but nothing follows.
    pub trailing: Option<String>,
}

/// Reasons a line does not parse into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("line has no command")]
    MissingCommand,
    #[error("invalid command token {0:?}")]
    InvalidCommand(String),
}

impl Message {
    /// Parse a single line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut rest = line.trim_start_matches(' ');
        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        let prefix = match rest.strip_prefix(':') {
            Some(after) => {
                let (prefix, remainder) = after.split_once(' ').unwrap_or((after, ""));
                rest = remainder;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut remaining) = next_token(rest).ok_or(ParseError::MissingCommand)?;
        if !is_command(command) {
            return Err(ParseError::InvalidCommand(command.to_string()));
        }

        let mut params = Vec::new();
        let mut trailing = None;
        loop {
            let after = remaining.trim_start_matches(' ');
            if let Some(text) = after.strip_prefix(':') {
                trailing = Some(text.to_string());
                break;
            }
            match next_token(after) {
                Some((token, tail)) => {
                    params.push(token.to_string());
                    remaining = tail;
                }
                None => break,
            }
        }

        Ok(Message {
            prefix,
            command: command.to_string(),
            params,
            trailing,
        })
    }

    /// Nick portion of the prefix, or `""` when the line had no prefix.
    pub fn source_nick(&self) -> &str {
        self.prefix.as_deref().map(source_nick).unwrap_or("")
    }

    /// Full prefix, or `""` when the line had no prefix.
    pub fn source(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// First parameter, falling back to the trailing text.
    ///
    /// Servers send both `JOIN #chan` and `JOIN :#chan`, `PING token` and
    /// `PING :token`; this treats them alike.
    pub fn middle(&self) -> Option<&str> {
        self.params
            .first()
            .map(String::as_str)
            .or(self.trailing.as_deref())
    }

    /// Trailing text, or the last parameter when no trailing part was sent.
    pub fn text(&self) -> &str {
        match &self.trailing {
            Some(text) => text,
            None if self.params.len() > 1 => self.params.last().map(String::as_str).unwrap_or(""),
            None => "",
        }
    }
}

/// Extract the nick from a `nick!user@host` prefix.
///
/// A prefix without `!` (a server name) is returned unchanged.
pub fn source_nick(prefix: &str) -> &str {
    let prefix = prefix.strip_prefix(':').unwrap_or(prefix);
    match prefix.split_once('!') {
        Some((nick, _)) => nick,
        None => prefix,
    }
}

fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start_matches(' ');
    if input.is_empty() {
        return None;
    }
    Some(input.split_once(' ').unwrap_or((input, "")))
}

fn is_command(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_alphabetic())
        || (token.len() == 3 && token.chars().all(|c| c.is_ascii_digit()))
}
