//! Semantic events surfaced to the host application and the registry that
//! routes them to caller-supplied handlers.

use crate::app::action::Action;
use crate::app::state::Session;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An event raised after a server line has been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    Join {
        source: &'a str,
        channel: &'a str,
    },
    Kick {
        source: &'a str,
        channel: &'a str,
        target: Option<&'a str>,
    },
    NickChange {
        source: &'a str,
        new_nick: &'a str,
    },
    Part {
        source: &'a str,
        channel: &'a str,
        reason: &'a str,
    },
    Quit {
        nick: &'a str,
        reason: &'a str,
    },
    /// The first PING of the connection has been answered.
    Connected,
    Privmsg {
        source: &'a str,
        target: &'a str,
        message: &'a str,
    },
    Notice {
        source: &'a str,
        target: &'a str,
        message: &'a str,
    },
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Join { .. } => EventKind::Join,
            Event::Kick { .. } => EventKind::Kick,
            Event::NickChange { .. } => EventKind::NickChange,
            Event::Part { .. } => EventKind::Part,
            Event::Quit { .. } => EventKind::Quit,
            Event::Connected => EventKind::Connected,
            Event::Privmsg { .. } => EventKind::Privmsg,
            Event::Notice { .. } => EventKind::Notice,
        }
    }
}

/// Registry key, one per event a handler can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Join,
    Kick,
    NickChange,
    Part,
    Quit,
    Connected,
    Privmsg,
    Notice,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Join,
        EventKind::Kick,
        EventKind::NickChange,
        EventKind::Part,
        EventKind::Quit,
        EventKind::Connected,
        EventKind::Privmsg,
        EventKind::Notice,
    ];

    /// Registration name, e.g. `"on_join"`.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Join => "on_join",
            EventKind::Kick => "on_kick",
            EventKind::NickChange => "on_nick_change",
            EventKind::Part => "on_part",
            EventKind::Quit => "on_quit",
            EventKind::Connected => "on_connected",
            EventKind::Privmsg => "on_privmsg",
            EventKind::Notice => "on_notice",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event name {0:?}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// What a handler can see and do while it runs.
///
/// Nick lists are read as they were before the triggering line mutated them.
/// Outbound lines queued here are sent after the line is fully handled.
pub struct Context<'a> {
    session: &'a Session,
    actions: &'a mut Vec<Action>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(session: &'a Session, actions: &'a mut Vec<Action>) -> Self {
        Self { session, actions }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn join(&mut self, channel: &str) {
        self.actions.push(Action::JoinChannel {
            channel: channel.to_string(),
        });
    }

    pub fn tell(&mut self, target: &str, text: &str) {
        self.actions.push(Action::SendPrivmsg {
            target: target.to_string(),
            text: text.to_string(),
        });
    }

    pub fn send_raw(&mut self, line: &str) {
        self.actions.push(Action::SendRaw {
            line: line.to_string(),
        });
    }
}

pub type Handler = Box<dyn FnMut(&Event<'_>, &mut Context<'_>)>;

/// At most one handler per [`EventKind`]; events without one are dropped.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<EventKind, Handler>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` to `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event<'_>, &mut Context<'_>) + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn unregister(&mut self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler for `event`, if any.
    pub fn fire(&mut self, event: &Event<'_>, ctx: &mut Context<'_>) {
        if let Some(handler) = self.handlers.get_mut(&event.kind()) {
            handler(event, ctx);
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_event_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.name().parse::<EventKind>(), Ok(kind));
        }
        assert_eq!(
            "on_topic".parse::<EventKind>(),
            Err(UnknownEvent("on_topic".into()))
        );
    }

    #[test]
    fn test_register_overwrites_previous_handler() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();

        let first = Rc::clone(&calls);
        registry.register(EventKind::Connected, move |_, _| first.borrow_mut().push("first"));
        let second = Rc::clone(&calls);
        registry.register(EventKind::Connected, move |_, _| second.borrow_mut().push("second"));

        let session = Session::new();
        let mut actions = Vec::new();
        registry.fire(&Event::Connected, &mut Context::new(&session, &mut actions));

        assert_eq!(*calls.borrow(), vec!["second"]);
    }

    #[test]
    fn test_unregistered_event_is_dropped() {
        let mut registry = CallbackRegistry::new();
        registry.register(EventKind::Join, |_, ctx| ctx.tell("#x", "unexpected"));

        let session = Session::new();
        let mut actions = Vec::new();
        registry.fire(
            &Event::Quit { nick: "bob", reason: "" },
            &mut Context::new(&session, &mut actions),
        );
        assert!(actions.is_empty());

        assert!(registry.unregister(EventKind::Join));
        assert!(!registry.is_registered(EventKind::Join));
    }

    #[test]
    fn test_context_queues_actions_in_order() {
        let session = Session::new();
        let mut actions = Vec::new();
        let mut ctx = Context::new(&session, &mut actions);
        ctx.join("#rust");
        ctx.tell("#rust", "hi");
        ctx.send_raw("MODE #rust");

        assert_eq!(
            actions,
            vec![
                Action::JoinChannel { channel: "#rust".into() },
                Action::SendPrivmsg { target: "#rust".into(), text: "hi".into() },
                Action::SendRaw { line: "MODE #rust".into() },
            ]
        );
    }
}
