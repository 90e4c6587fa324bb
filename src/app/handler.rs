use crate::app::action::Action;
use crate::app::event::{CallbackRegistry, Context, Event};
use crate::app::state::Session;
use crate::irc::message::Message;
use tracing::{debug, error, info, trace};

/// Non-alphanumeric characters that are kept at the start of a NAMES token.
const NICK_SPECIALS: &str = "[]{}";

/// The commands this client interprets. Everything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Join,
    Kick,
    Nick,
    Part,
    Quit,
    Ping,
    Privmsg,
    Notice,
    Error,
    /// `353` RPL_NAMREPLY
    NamReply,
    /// `366` RPL_ENDOFNAMES
    EndOfNames,
}

impl Command {
    /// Exact, case-sensitive lookup of a command token.
    pub fn lookup(token: &str) -> Option<Self> {
        let command = match token {
            "JOIN" => Command::Join,
            "KICK" => Command::Kick,
            "NICK" => Command::Nick,
            "PART" => Command::Part,
            "QUIT" => Command::Quit,
            "PING" => Command::Ping,
            "PRIVMSG" => Command::Privmsg,
            "NOTICE" => Command::Notice,
            "ERROR" => Command::Error,
            "353" => Command::NamReply,
            "366" => Command::EndOfNames,
            _ => return None,
        };
        Some(command)
    }
}

/// Parse and dispatch one line. Lines that fail to parse are dropped.
pub fn handle_line(session: &mut Session, callbacks: &mut CallbackRegistry, line: &str) -> Vec<Action> {
    match Message::parse(line) {
        Ok(message) => handle_irc_message(session, callbacks, &message),
        Err(e) => {
            debug!(error = %e, line, "dropping unparseable line");
            Vec::new()
        }
    }
}

/// Apply a parsed message to the session and fire the matching callback.
///
/// Callbacks run before nick lists are mutated. The returned actions hold the
/// protocol's own replies first, followed by anything the callback queued.
pub fn handle_irc_message(
    session: &mut Session,
    callbacks: &mut CallbackRegistry,
    message: &Message,
) -> Vec<Action> {
    let mut actions = Vec::new();

    let Some(command) = Command::lookup(&message.command) else {
        trace!(command = %message.command, "ignoring unhandled command");
        return actions;
    };

    let source = message.source();

    match command {
        Command::Ping => {
            let token = message.middle().unwrap_or_default();
            actions.push(Action::Pong {
                token: token.to_string(),
            });
            if session.activate() {
                info!("session active");
                fire(session, callbacks, &mut actions, &Event::Connected);
            }
        }

        Command::Join => {
            let channel = message.middle().unwrap_or_default();
            fire(session, callbacks, &mut actions, &Event::Join { source, channel });
        }

        Command::Kick => {
            let channel = message.params.first().map(String::as_str).unwrap_or_default();
            let target = message
                .params
                .get(1)
                .map(String::as_str)
                .or_else(|| message.trailing.as_deref()?.split_whitespace().next());

            fire(session, callbacks, &mut actions, &Event::Kick { source, channel, target });

            if let Some(target) = target {
                session.remove_nick(target);
            }
        }

        Command::Nick => {
            let Some(new_nick) = message.middle().filter(|n| !n.is_empty()) else {
                debug!(source, "NICK without a new nick");
                return actions;
            };

            fire(session, callbacks, &mut actions, &Event::NickChange { source, new_nick });

            session.rename_nick(message.source_nick(), new_nick);
        }

        Command::Part => {
            let channel = message.middle().unwrap_or_default();
            let reason = message.text();

            fire(session, callbacks, &mut actions, &Event::Part { source, channel, reason });

            session.remove_nick(message.source_nick());
        }

        Command::Quit => {
            let nick = message.source_nick();
            let reason = message
                .params
                .iter()
                .map(String::as_str)
                .chain(message.trailing.as_deref())
                .collect::<Vec<_>>()
                .join(" ");

            fire(session, callbacks, &mut actions, &Event::Quit { nick, reason: &reason });

            session.remove_nick(nick);
        }

        Command::Privmsg | Command::Notice => {
            let Some(target) = message.params.first() else {
                debug!(command = %message.command, source, "message without a target");
                return actions;
            };
            // Private messages are answered to whoever sent them.
            let target = if target.starts_with('#') { target.as_str() } else { source };
            let text = message.text();

            let event = if command == Command::Privmsg {
                Event::Privmsg { source, target, message: text }
            } else {
                Event::Notice { source, target, message: text }
            };
            fire(session, callbacks, &mut actions, &event);
        }

        Command::Error => {
            error!(reason = message.text(), "server reported an error");
        }

        Command::NamReply => {
            // :server 353 <me> [<symbol>] <channel> :<nicks>
            let [_, .., channel] = message.params.as_slice() else {
                debug!(params = ?message.params, "353 without a channel");
                return actions;
            };
            let names = message.trailing.as_deref().unwrap_or_default();
            session.begin_names(channel, parse_names(names));
        }

        Command::EndOfNames => match session.end_names() {
            Some(channel) => {
                let count = session.nick_list(&channel).map_or(0, <[String]>::len);
                debug!(%channel, count, "nick list complete");
            }
            None => debug!("366 without a pending nick list"),
        },
    }

    actions
}

fn fire(session: &Session, callbacks: &mut CallbackRegistry, actions: &mut Vec<Action>, event: &Event<'_>) {
    callbacks.fire(event, &mut Context::new(session, actions));
}

/// Split a NAMES payload into bare nicks, dropping one leading privilege
/// marker (`@`, `+`, `%`, ...) from each.
pub fn parse_names(names: &str) -> impl Iterator<Item = &str> {
    names.split_whitespace().filter_map(strip_privilege)
}

fn strip_privilege(token: &str) -> Option<&str> {
    let mut chars = token.chars();
    let nick = match chars.next()? {
        c if !c.is_alphanumeric() && !NICK_SPECIALS.contains(c) => chars.as_str(),
        _ => token,
    };
    (!nick.is_empty()).then_some(nick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::EventKind;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Registry that records every event as a string.
    fn recording_registry() -> (CallbackRegistry, Log) {
        let log: Log = Rc::default();
        let mut registry = CallbackRegistry::new();
        for kind in EventKind::ALL {
            let log = Rc::clone(&log);
            registry.register(kind, move |event, _| log.borrow_mut().push(format!("{:?}", event)));
        }
        (registry, log)
    }

    fn feed(session: &mut Session, registry: &mut CallbackRegistry, lines: &[&str]) -> Vec<Action> {
        lines
            .iter()
            .flat_map(|line| handle_line(session, registry, line))
            .collect()
    }

    fn session_with_names(lines: &[&str]) -> Session {
        let mut session = Session::new();
        feed(&mut session, &mut CallbackRegistry::new(), lines);
        session
    }

    #[test]
    fn test_command_lookup_is_exact() {
        assert_eq!(Command::lookup("PRIVMSG"), Some(Command::Privmsg));
        assert_eq!(Command::lookup("353"), Some(Command::NamReply));
        assert_eq!(Command::lookup("privmsg"), None);
        assert_eq!(Command::lookup("001"), None);
    }

    #[test]
    fn test_privmsg_to_channel() {
        let mut session = Session::new();
        let (mut registry, log) = recording_registry();
        feed(&mut session, &mut registry, &[":nick!user@host PRIVMSG #chan :hello there"]);

        let expected = Event::Privmsg {
            source: "nick!user@host",
            target: "#chan",
            message: "hello there",
        };
        assert_eq!(*log.borrow(), vec![format!("{:?}", expected)]);
    }

    #[test]
    fn test_private_message_target_is_redirected_to_source() {
        let mut session = Session::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let privmsgs = Rc::clone(&seen);
        registry.register(EventKind::Privmsg, move |event, _| {
            if let Event::Privmsg { source, target, .. } = event {
                privmsgs.borrow_mut().push((source.to_string(), target.to_string()));
            }
        });
        let notices = Rc::clone(&seen);
        registry.register(EventKind::Notice, move |event, _| {
            if let Event::Notice { source, target, .. } = event {
                notices.borrow_mut().push((source.to_string(), target.to_string()));
            }
        });

        feed(
            &mut session,
            &mut registry,
            &[
                ":alice!a@h PRIVMSG mybot :psst",
                ":server.example NOTICE mybot :*** Looking up your hostname",
            ],
        );

        assert_eq!(
            *seen.borrow(),
            vec![
                ("alice!a@h".to_string(), "alice!a@h".to_string()),
                ("server.example".to_string(), "server.example".to_string()),
            ]
        );
    }

    #[test]
    fn test_ping_replies_and_connects_once() {
        let mut session = Session::new();
        let (mut registry, log) = recording_registry();

        let actions = feed(&mut session, &mut registry, &["PING :irc.example.net"]);
        assert_eq!(actions, vec![Action::Pong { token: "irc.example.net".into() }]);
        assert!(session.is_active());

        let actions = feed(&mut session, &mut registry, &["PING token2"]);
        assert_eq!(actions, vec![Action::Pong { token: "token2".into() }]);

        assert_eq!(*log.borrow(), vec!["Connected".to_string()]);
    }

    #[test]
    fn test_pong_precedes_actions_queued_on_connect() {
        let mut session = Session::new();
        let mut registry = CallbackRegistry::new();
        registry.register(EventKind::Connected, |_, ctx| ctx.join("#rust"));

        let actions = feed(&mut session, &mut registry, &["PING :x"]);
        assert_eq!(
            actions,
            vec![
                Action::Pong { token: "x".into() },
                Action::JoinChannel { channel: "#rust".into() },
            ]
        );
    }

    #[test]
    fn test_names_strip_privilege_markers() {
        let session = session_with_names(&[
            ":irc.example.net 353 me = #chan :alice @bob +carol",
            ":irc.example.net 366 me #chan :End of /NAMES list.",
        ]);
        assert_eq!(
            session.nick_list("#chan").unwrap(),
            &["alice", "bob", "carol"][..]
        );
        assert_eq!(session.pending_names(), None);
    }

    #[test]
    fn test_names_across_several_replies() {
        let session = session_with_names(&[
            ":srv 353 me @ #chan :~owner %half",
            ":srv 353 me @ #chan :_under [bracket] @",
            ":srv 366 me #chan :End",
        ]);
        assert_eq!(
            session.nick_list("#chan").unwrap(),
            &["owner", "half", "_under", "[bracket]"][..]
        );
    }

    #[test]
    fn test_incomplete_names_for_other_channel_is_discarded() {
        let session = session_with_names(&[
            ":srv 353 me = #one :a b",
            ":srv 353 me = #two :c",
            ":srv 366 me #two :End",
        ]);
        assert_eq!(session.nick_list("#one"), None);
        assert_eq!(session.nick_list("#two").unwrap(), &["c"][..]);
    }

    #[test]
    fn test_nick_change_renames_in_every_channel() {
        let mut session = session_with_names(&[
            ":srv 353 me = #a :old x",
            ":srv 366 me #a :End",
            ":srv 353 me = #b :y old",
            ":srv 366 me #b :End",
        ]);
        let (mut registry, log) = recording_registry();

        let nick = ":old!u@h NICK :new";
        feed(&mut session, &mut registry, &[nick, nick]);

        assert_eq!(session.nick_list("#a").unwrap(), &["x", "new"][..]);
        assert_eq!(session.nick_list("#b").unwrap(), &["y", "new"][..]);

        let expected = format!(
            "{:?}",
            Event::NickChange { source: "old!u@h", new_nick: "new" }
        );
        assert_eq!(*log.borrow(), vec![expected.clone(), expected]);
    }

    #[test]
    fn test_callback_sees_lists_before_mutation() {
        let mut session = session_with_names(&[":srv 353 me = #a :bob", ":srv 366 me #a :End"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let inner = Rc::clone(&seen);
        registry.register(EventKind::Quit, move |_, ctx| {
            let nicks = ctx.session().nick_list("#a").map(<[String]>::to_vec);
            inner.borrow_mut().push(nicks);
        });

        feed(&mut session, &mut registry, &[":bob!b@h QUIT :Quit: bye"]);

        assert_eq!(*seen.borrow(), vec![Some(vec!["bob".to_string()])]);
        assert_eq!(session.nick_list("#a").unwrap(), &[] as &[&str]);
    }

    #[test]
    fn test_kick_removes_target_everywhere() {
        let mut session = session_with_names(&[
            ":srv 353 me = #a :victim x",
            ":srv 366 me #a :End",
            ":srv 353 me = #b :victim",
            ":srv 366 me #b :End",
        ]);
        let (mut registry, log) = recording_registry();

        feed(&mut session, &mut registry, &[":op!o@h KICK #a victim :spamming"]);

        assert_eq!(session.nick_list("#a").unwrap(), &["x"][..]);
        assert_eq!(session.nick_list("#b").unwrap(), &[] as &[&str]);
        let expected = Event::Kick {
            source: "op!o@h",
            channel: "#a",
            target: Some("victim"),
        };
        assert_eq!(*log.borrow(), vec![format!("{:?}", expected)]);
    }

    #[test]
    fn test_part_removes_source_and_reports_reason() {
        let mut session = session_with_names(&[":srv 353 me = #a :bob x", ":srv 366 me #a :End"]);
        let (mut registry, log) = recording_registry();

        feed(
            &mut session,
            &mut registry,
            &[":bob!b@h PART #a :see you later", ":x!x@h PART #a"],
        );

        assert_eq!(session.nick_list("#a").unwrap(), &[] as &[&str]);
        assert_eq!(
            *log.borrow(),
            vec![
                format!(
                    "{:?}",
                    Event::Part { source: "bob!b@h", channel: "#a", reason: "see you later" }
                ),
                format!(
                    "{:?}",
                    Event::Part { source: "x!x@h", channel: "#a", reason: "" }
                ),
            ]
        );
    }

    #[test]
    fn test_quit_reason_joins_fields() {
        let mut session = Session::new();
        let (mut registry, log) = recording_registry();

        feed(
            &mut session,
            &mut registry,
            &[":bob!b@h QUIT :Ping timeout", ":carol!c@h QUIT gone fishing", ":dave!d@h QUIT"],
        );

        assert_eq!(
            *log.borrow(),
            vec![
                format!("{:?}", Event::Quit { nick: "bob", reason: "Ping timeout" }),
                format!("{:?}", Event::Quit { nick: "carol", reason: "gone fishing" }),
                format!("{:?}", Event::Quit { nick: "dave", reason: "" }),
            ]
        );
    }

    #[test]
    fn test_join_does_not_touch_lists() {
        let mut session = session_with_names(&[":srv 353 me = #a :x", ":srv 366 me #a :End"]);
        let (mut registry, log) = recording_registry();

        feed(&mut session, &mut registry, &[":newbie!n@h JOIN :#a"]);

        assert_eq!(session.nick_list("#a").unwrap(), &["x"][..]);
        assert_eq!(
            *log.borrow(),
            vec![format!("{:?}", Event::Join { source: "newbie!n@h", channel: "#a" })]
        );
    }

    #[test]
    fn test_unknown_and_malformed_lines_are_dropped() {
        let mut session = Session::new();
        let (mut registry, log) = recording_registry();

        let actions = feed(
            &mut session,
            &mut registry,
            &[
                ":srv 001 me :Welcome",
                ":srv TOPIC #a :new topic",
                "join #a",
                "",
                ":prefix-only",
                ":srv ERROR :Closing link",
            ],
        );

        assert!(actions.is_empty());
        assert!(log.borrow().is_empty());
        assert!(!session.is_active());
    }

    #[test]
    fn test_parse_names_edge_cases() {
        let nicks: Vec<&str> =
            parse_names("  @op  +v   plain ^caret `tick |pipe _under 9lives [away] {x} @").collect();
        assert_eq!(
            nicks,
            vec!["op", "v", "plain", "caret", "tick", "pipe", "under", "9lives", "[away]", "{x}"]
        );
    }
}
