//! Session state derived from server traffic: per-channel nick lists, the
//! in-progress NAMES accumulation, and whether the handshake has completed.

use std::collections::{HashMap, HashSet};

/// Nicks accumulated from consecutive `353` replies for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNames {
    pub channel: String,
    pub nicks: Vec<String>,
    seen: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct Session {
    active: bool,
    nick_lists: HashMap<String, Vec<String>>,
    pending: Option<PendingNames>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the first PING has been answered.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mark the session active. Returns `true` only on the transition.
    pub fn activate(&mut self) -> bool {
        !std::mem::replace(&mut self.active, true)
    }

    pub fn nick_list(&self, channel: &str) -> Option<&[String]> {
        self.nick_lists.get(channel).map(Vec::as_slice)
    }

    pub fn nick_lists(&self) -> &HashMap<String, Vec<String>> {
        &self.nick_lists
    }

    pub fn pending_names(&self) -> Option<&PendingNames> {
        self.pending.as_ref()
    }

    /// Append nicks from a `353` reply.
    ///
    /// A reply for a channel other than the pending one starts over, dropping
    /// whatever was collected for the previous channel.
    pub fn begin_names<I, S>(&mut self, channel: &str, nicks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.pending.as_ref().is_some_and(|p| p.channel != channel) {
            self.pending = None;
        }
        let pending = self.pending.get_or_insert_with(|| PendingNames {
            channel: channel.to_string(),
            nicks: Vec::new(),
            seen: HashSet::new(),
        });
        for nick in nicks {
            let nick = nick.into();
            if pending.seen.insert(nick.clone()) {
                pending.nicks.push(nick);
            }
        }
    }

    /// Commit the pending accumulation on `366`, replacing the channel's list.
    ///
    /// Returns the committed channel, or `None` if nothing was pending.
    pub fn end_names(&mut self) -> Option<String> {
        let PendingNames { channel, nicks, .. } = self.pending.take()?;
        self.nick_lists.insert(channel.clone(), nicks);
        Some(channel)
    }

    /// Remove `nick` from every channel's list.
    pub fn remove_nick(&mut self, nick: &str) {
        for list in self.nick_lists.values_mut() {
            list.retain(|n| n != nick);
        }
    }

    /// Rename `old` to `new` in every list that contains `old`. The new nick
    /// goes to the end of the list.
    pub fn rename_nick(&mut self, old: &str, new: &str) {
        for list in self.nick_lists.values_mut() {
            if let Some(pos) = list.iter().position(|n| n == old) {
                list.remove(pos);
                if !list.iter().any(|n| n == new) {
                    list.push(new.to_string());
                }
            }
        }
    }

    /// Forget everything; used when the connection is torn down.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
