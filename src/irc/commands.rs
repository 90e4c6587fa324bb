//! Outbound protocol lines.
//!
//! Every builder returns complete wire lines including the `\r\n`
//! terminator. Caller-supplied text has any embedded CR or LF replaced by a
//! space so a single call always produces the lines it claims to.

/// PRIVMSG payloads longer than this many bytes are split.
pub const MAX_MESSAGE_LEN: usize = 400;

/// A split point is searched for back to this offset before giving up and
/// cutting mid-word.
pub const MIN_SPLIT_OFFSET: usize = 350;

pub fn join(channel: &str) -> String {
    line(format!("JOIN {}", clean(channel)))
}

pub fn part(channel: &str, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => line(format!("PART {} :{}", clean(channel), clean(reason))),
        None => line(format!("PART {}", clean(channel))),
    }
}

pub fn pong(token: &str) -> String {
    line(format!("PONG :{}", clean(token)))
}

pub fn nick(nick: &str) -> String {
    line(format!("NICK {}", clean(nick)))
}

pub fn user(username: &str, realname: &str) -> String {
    line(format!("USER {} 0 * :{}", clean(username), clean(realname)))
}

pub fn quit(reason: &str) -> String {
    line(format!("QUIT :{}", clean(reason)))
}

pub fn raw(text: &str) -> String {
    line(clean(text))
}

/// `PRIVMSG` lines for `text`, split so no payload exceeds
/// [`MAX_MESSAGE_LEN`] bytes.
pub fn privmsg(target: &str, text: &str) -> Vec<String> {
    let target = clean(target);
    split_message(&clean(text))
        .into_iter()
        .map(|chunk| line(format!("PRIVMSG {} :{}", target, chunk)))
        .collect()
}

/// Break `text` into chunks of at most [`MAX_MESSAGE_LEN`] bytes.
///
/// Each cut prefers the last space between [`MIN_SPLIT_OFFSET`] and
/// [`MAX_MESSAGE_LEN`]; that space is consumed by the split. Without one the
/// text is cut at the limit (backed off to a UTF-8 boundary).
pub fn split_message(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > MAX_MESSAGE_LEN {
        let bytes = rest.as_bytes();
        let space = (MIN_SPLIT_OFFSET..=MAX_MESSAGE_LEN)
            .rev()
            .find(|&i| bytes[i] == b' ');

        let (head, tail) = match space {
            Some(at) => (&rest[..at], &rest[at + 1..]),
            None => {
                let mut at = MAX_MESSAGE_LEN;
                while !rest.is_char_boundary(at) {
                    at -= 1;
                }
                rest.split_at(at)
            }
        };
        chunks.push(head);
        rest = tail;
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}

fn clean(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn line(mut text: String) -> String {
    text.push_str("\r\n");
    text
}
