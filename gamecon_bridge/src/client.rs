// Game-side TCP client for feeding a bridge.
//
// This is the sending half of the protocol: what a game (or a test, or the
// `gamecon send` subcommand) uses to push event lines at a running bridge.
// It is synchronous and write-only; the bridge never replies. Each send
// writes one line and flushes, which suits the small per-frame messages a
// game emits.
//
// `send_raw` bypasses line framing entirely so tests can reproduce
// fragmented or multi-message writes exactly as the bridge would see them.

use std::io::{self, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use gamecon_protocol::{GameEvent, write_line};
use tracing::debug;

/// Connection from a game to a bridge.
pub struct GameClient {
    writer: BufWriter<TcpStream>,
    peer: SocketAddr,
}

impl GameClient {
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        debug!(%peer, "connected to bridge");
        Ok(Self {
            writer: BufWriter::new(stream),
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Encode an event to its wire line and send it.
    pub fn send(&mut self, event: &GameEvent) -> io::Result<()> {
        self.send_line(&event.to_string())
    }

    /// Send one already-formatted line. The terminator is added here.
    pub fn send_line(&mut self, line: &str) -> io::Result<()> {
        write_line(&mut self.writer, line)
    }

    /// Write bytes as-is, with no terminator.
    pub fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }

    /// Flush and close both directions. The bridge sees an orderly close.
    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().shutdown(Shutdown::Both)
    }
}
