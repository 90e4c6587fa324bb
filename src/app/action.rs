/// Outbound work produced while handling a line, executed by the client once
/// the line has been fully dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Pong { token: String },
    JoinChannel { channel: String },
    SendPrivmsg { target: String, text: String },
    SendRaw { line: String },
}
