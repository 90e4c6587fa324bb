//! IRC protocol layer: line framing, message parsing, outbound formatting and
//! the poll-driven client that ties them to a socket.

pub mod client;
pub mod commands;
pub mod connection;
pub mod framer;
pub mod message;
