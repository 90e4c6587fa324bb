//! A poll-driven client for a single IRC connection.
//!
//! Bytes read from the socket are framed into lines, parsed, and dispatched
//! to per-command handlers that keep channel nick lists current and raise
//! [`Event`]s to whatever the host application registered.

pub mod app;
pub mod config;
pub mod irc;
pub mod logging;

pub use app::event::{CallbackRegistry, Context, Event, EventKind};
pub use app::state::Session;
pub use irc::client::{ClientError, IrcClient};
pub use irc::connection::Transport;
pub use irc::message::{source_nick, Message, ParseError};
