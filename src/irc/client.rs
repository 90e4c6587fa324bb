use crate::app::action::Action;
use crate::app::event::{CallbackRegistry, Context, Event, EventKind};
use crate::app::handler;
use crate::app::state::Session;
use crate::irc::commands;
use crate::irc::connection::{connect_tcp, Transport};
use crate::irc::framer::LineFramer;
use std::io;
use std::net::TcpStream;
use tracing::{debug, info, warn};

/// Bytes requested from the transport per tick.
const READ_SIZE: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A single-connection IRC client driven by repeated calls to [`tick`].
///
/// Not thread-safe: `tick` and the send methods are meant to be called from
/// one event loop.
///
/// [`tick`]: IrcClient::tick
pub struct IrcClient<T = TcpStream> {
    transport: Option<T>,
    framer: LineFramer,
    session: Session,
    callbacks: CallbackRegistry,
    max_line_len: Option<usize>,
}

impl<T: Transport> Default for IrcClient<T> {
    fn default() -> Self {
        Self {
            transport: None,
            framer: LineFramer::new(),
            session: Session::new(),
            callbacks: CallbackRegistry::new(),
            max_line_len: None,
        }
    }
}

impl IrcClient<TcpStream> {
    /// Connect to `host:port` over plain TCP. Any previous connection is
    /// dropped first.
    pub fn connect(&mut self, host: &str, port: u16) -> bool {
        self.disconnect();
        match connect_tcp(host, port) {
            Ok(stream) => {
                info!(host, port, "connected");
                self.attach(stream);
                true
            }
            Err(e) => {
                warn!(host, port, error = %e, "connection failed");
                false
            }
        }
    }
}

impl<T: Transport> IrcClient<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard unterminated input longer than `max_line_len` bytes instead of
    /// buffering it forever.
    pub fn with_max_line_len(mut self, max_line_len: Option<usize>) -> Self {
        self.max_line_len = max_line_len;
        self.framer = self.new_framer();
        self
    }

    /// Start a fresh session over an already connected transport.
    pub fn attach(&mut self, transport: T) {
        self.framer = self.new_framer();
        self.session.reset();
        self.transport = Some(transport);
    }

    /// Tear down the connection, returning the transport if there was one.
    pub fn disconnect(&mut self) -> Option<T> {
        self.framer.clear();
        self.transport.take()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Register the handler for `kind`, replacing any earlier one.
    pub fn register<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event<'_>, &mut Context<'_>) + 'static,
    {
        self.callbacks.register(kind, handler);
    }

    pub fn join(&mut self, channel: &str) -> Result<usize, ClientError> {
        self.send_line(&commands::join(channel))
    }

    /// Send `text` to `target`, split over as many PRIVMSG lines as needed.
    ///
    /// Returns the total byte count reported by the transport. Sending stops
    /// at the first failed line.
    pub fn tell(&mut self, target: &str, text: &str) -> Result<usize, ClientError> {
        let mut sent = 0;
        for line in commands::privmsg(target, text) {
            sent += self.send_line(&line)?;
        }
        Ok(sent)
    }

    pub fn part(&mut self, channel: &str, reason: Option<&str>) -> Result<usize, ClientError> {
        self.send_line(&commands::part(channel, reason))
    }

    pub fn nick(&mut self, nick: &str) -> Result<usize, ClientError> {
        self.send_line(&commands::nick(nick))
    }

    /// Send `USER`, completing registration together with [`nick`].
    ///
    /// [`nick`]: IrcClient::nick
    pub fn user(&mut self, username: &str, realname: &str) -> Result<usize, ClientError> {
        self.send_line(&commands::user(username, realname))
    }

    pub fn quit(&mut self, reason: &str) -> Result<usize, ClientError> {
        self.send_line(&commands::quit(reason))
    }

    /// Send one raw protocol line; the terminator is added.
    pub fn send_raw(&mut self, line: &str) -> Result<usize, ClientError> {
        self.send_line(&commands::raw(line))
    }

    /// Perform one non-blocking read and dispatch every line it completes.
    ///
    /// Returns the number of lines dispatched. Would-block and read errors
    /// both yield `0`; read errors are logged and otherwise ignored. A closed
    /// stream disconnects the client.
    pub fn tick(&mut self) -> usize {
        let Some(transport) = self.transport.as_mut() else {
            return 0;
        };

        let mut buf = [0u8; READ_SIZE];
        let n = match transport.recv(&mut buf) {
            Ok(0) => {
                info!("server closed the connection");
                self.disconnect();
                return 0;
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                return 0;
            }
            Err(e) => {
                warn!(error = %e, "read failed");
                return 0;
            }
        };

        let lines = self.framer.feed(&buf[..n]);
        for line in &lines {
            debug!(%line, "<<");
            let actions = handler::handle_line(&mut self.session, &mut self.callbacks, line);
            self.perform(actions);
        }
        lines.len()
    }

    fn perform(&mut self, actions: Vec<Action>) {
        for action in actions {
            let result = match &action {
                Action::Pong { token } => self.send_line(&commands::pong(token)),
                Action::JoinChannel { channel } => self.join(channel),
                Action::SendPrivmsg { target, text } => self.tell(target, text),
                Action::SendRaw { line } => self.send_raw(line),
            };
            if let Err(e) = result {
                warn!(?action, error = %e, "failed to send");
            }
        }
    }

    fn send_line(&mut self, line: &str) -> Result<usize, ClientError> {
        let transport = self.transport.as_mut().ok_or(ClientError::NotConnected)?;
        debug!(line = line.trim_end(), ">>");
        Ok(transport.send(line.as_bytes())?)
    }

    fn new_framer(&self) -> LineFramer {
        match self.max_line_len {
            Some(max_len) => LineFramer::with_max_len(max_len),
            None => LineFramer::new(),
        }
    }
}
