use std::io::{self, Read, Write};
use std::net::TcpStream;

/// The byte stream an [`IrcClient`](crate::irc::client::IrcClient) talks over.
///
/// `recv` must not block: with nothing to read it fails with
/// [`io::ErrorKind::WouldBlock`]. `Ok(0)` means the peer closed the stream.
pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl Transport for TcpStream {
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.write(bytes)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Open a TCP connection and switch it to non-blocking mode.
pub fn connect_tcp(host: &str, port: u16) -> io::Result<TcpStream> {
    let stream = TcpStream::connect((host, port))?;
    stream.set_nonblocking(true)?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
