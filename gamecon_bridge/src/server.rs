// TCP listener and background loop for the game bridge.
//
// Architecture: one background thread owns everything.
//
// - The thread owns the `TcpListener` and at most one accepted `TcpStream`.
//   While no game is connected it waits (bounded by `accept_poll`) for a
//   connection. While one is connected it waits (bounded by the tick
//   interval) for data, reassembles lines with `LineBuffer`, and dispatches
//   each line through `gamecon_protocol::dispatch_line`.
// - After either branch, the tick check runs: if a tick interval has passed
//   since the last tick, `on_tick` fires and the baseline moves to now. A
//   slow frame delays the next tick; missed ticks are never replayed.
// - Every handler call happens on this thread, in order, so consumers can
//   talk to single-threaded engines (audio, say) from their callbacks
//   without locking.
//
// Only one game is served at a time. The listener is not polled while a
// connection is active, so a second game waits in the OS backlog until the
// first disconnects.
//
// Link states: `Listening → Active → Listening` on connect/disconnect, and
// `→ ShuttingDown → Closed` when `stop` is requested. Dropping the connection
// during shutdown deliberately skips `on_disconnect`, so consumer teardown
// code never runs while the bridge itself is being torn down.
//
// Shutdown: `BridgeHandle::stop` raises a flag that the loop checks every
// frame, then waits up to the configured grace period for the thread to
// finish.

use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use gamecon_protocol::{GameEventHandler, LineBuffer, dispatch_line};
use tracing::{debug, error, info, trace, warn};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, TransportError};

/// Sleep between non-blocking accept attempts inside one accept wait.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(5);

/// Poll interval used by `stop` while waiting for the thread to finish.
const STOP_POLL: Duration = Duration::from_millis(5);

/// Consumer of bridge events. Lifecycle notifications live here; the typed
/// game events come from the `GameEventHandler` supertrait.
pub trait BridgeHandler: GameEventHandler {
    /// A game connected. Good place to bring up the consumer's engine.
    fn on_connect(&mut self) {}

    /// The game disconnected or the connection failed. Not called when the
    /// bridge itself is shutting down.
    fn on_disconnect(&mut self) {}

    /// Fixed-cadence callback, roughly once per game frame, whether or not
    /// data arrived.
    fn on_tick(&mut self) {}
}

/// Handle returned by `start_bridge` to control the running bridge.
pub struct BridgeHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    local_addr: SocketAddr,
    grace: Duration,
}

impl BridgeHandle {
    /// Address the listener is bound to (useful when port 0 was requested).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the bridge thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the bridge to stop and wait up to the grace period for it.
    ///
    /// A thread that outlives the grace period is left detached and
    /// `ShutdownTimeout` is returned; callers should treat that as fatal.
    pub fn stop(mut self) -> Result<(), BridgeError> {
        self.shutdown.store(true, Ordering::SeqCst);
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + self.grace;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                error!(grace = ?self.grace, "bridge thread did not stop in time");
                return Err(BridgeError::ShutdownTimeout { grace: self.grace });
            }
            thread::sleep(STOP_POLL);
        }
        thread.join().map_err(|_| BridgeError::ThreadPanic)
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Bind the listener and start the bridge on a background thread.
///
/// The handler is moved onto that thread; every callback runs there.
pub fn start_bridge<H>(config: BridgeConfig, handler: H) -> Result<BridgeHandle, BridgeError>
where
    H: BridgeHandler + Send + 'static,
{
    config.validate()?;

    let addr = config.listen_addr();
    let bind_err = |source| BridgeError::Bind { addr, source };
    let listener = TcpListener::bind(addr).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;
    info!(%local_addr, "game bridge listening");

    let shutdown = Arc::new(AtomicBool::new(false));
    let grace = config.shutdown_grace();
    let engine = Engine::new(listener, config, handler, Arc::clone(&shutdown));
    let thread = thread::Builder::new()
        .name("gamecon-bridge".into())
        .spawn(move || engine.run())
        .map_err(BridgeError::Spawn)?;

    Ok(BridgeHandle {
        shutdown,
        thread: Some(thread),
        local_addr,
        grace,
    })
}

/// Where the connection state machine currently is.
enum Link {
    Listening,
    Active(Connection),
    ShuttingDown,
    Closed,
}

/// The one accepted game connection.
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    lines: LineBuffer,
}

impl Connection {
    fn open(
        stream: TcpStream,
        peer: SocketAddr,
        config: &BridgeConfig,
    ) -> Result<Self, TransportError> {
        // Accepted sockets may inherit the listener's non-blocking mode.
        stream
            .set_nonblocking(false)
            .map_err(TransportError::Configure)?;
        stream
            .set_read_timeout(Some(config.tick_interval()))
            .map_err(TransportError::Configure)?;
        Ok(Self {
            stream,
            peer,
            lines: LineBuffer::new(),
        })
    }
}

/// Result of one read wait on the active connection.
enum ReadOutcome {
    Lines(Vec<String>),
    Idle,
    Spurious,
    Closed(Option<String>),
    Failed(TransportError),
}

/// State owned by the bridge thread.
struct Engine<H> {
    listener: TcpListener,
    config: BridgeConfig,
    handler: H,
    shutdown: Arc<AtomicBool>,
    link: Link,
    last_tick: Option<Instant>,
}

impl<H: BridgeHandler> Engine<H> {
    fn new(
        listener: TcpListener,
        config: BridgeConfig,
        handler: H,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            listener,
            config,
            handler,
            shutdown,
            link: Link::Listening,
            last_tick: None,
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Main loop. Runs until the shutdown flag is raised.
    fn run(mut self) {
        let mut buffer = vec![0u8; self.config.read_buffer_size];
        while !self.shutdown_requested() {
            self.step(&mut buffer);
            if self.shutdown_requested() {
                break;
            }
            self.tick_if_due();
        }
        self.close();
    }

    /// One frame: either wait for a game or service the connected one.
    fn step(&mut self, buffer: &mut [u8]) {
        match self.link {
            Link::Listening => self.await_peer(),
            Link::Active(_) => self.service_connection(buffer),
            Link::ShuttingDown | Link::Closed => {}
        }
    }

    fn tick_if_due(&mut self) {
        let now = Instant::now();
        let interval = self.config.tick_interval();
        if self
            .last_tick
            .is_none_or(|last| now.duration_since(last) >= interval)
        {
            // Baseline is the check time, so a slow handler does not push
            // the schedule back.
            self.handler.on_tick();
            self.last_tick = Some(now);
        }
    }

    /// Wait up to `accept_poll` for a game to connect.
    fn await_peer(&mut self) {
        let deadline = Instant::now() + self.config.accept_poll();
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    self.attach(stream, peer);
                    return;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => warn!(error = %e, "accept failed"),
            }

            let now = Instant::now();
            if now >= deadline || self.shutdown_requested() {
                return;
            }
            thread::sleep(ACCEPT_BACKOFF.min(deadline - now));
        }
    }

    fn attach(&mut self, stream: TcpStream, peer: SocketAddr) {
        match Connection::open(stream, peer, &self.config) {
            Ok(connection) => {
                info!(%peer, "game connected");
                self.link = Link::Active(connection);
                // A fresh connection starts a fresh tick schedule.
                self.last_tick = Some(Instant::now());
                self.handler.on_connect();
            }
            Err(err) => warn!(%peer, error = %err, "failed to set up game connection"),
        }
    }

    /// Wait up to one tick interval for data and dispatch whatever lines it
    /// completes.
    fn service_connection(&mut self, buffer: &mut [u8]) {
        let Link::Active(connection) = &mut self.link else {
            return;
        };

        let outcome = match connection.stream.read(buffer) {
            Ok(0) => ReadOutcome::Closed(connection.lines.take_remainder()),
            Ok(n) => ReadOutcome::Lines(connection.lines.push(&buffer[..n])),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                ReadOutcome::Idle
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => ReadOutcome::Spurious,
            Err(e) => ReadOutcome::Failed(TransportError::Read(e)),
        };

        match outcome {
            ReadOutcome::Lines(lines) => {
                for line in &lines {
                    self.deliver(line);
                }
            }
            ReadOutcome::Idle => thread::sleep(self.config.tick_interval()),
            ReadOutcome::Spurious => {}
            ReadOutcome::Closed(remainder) => {
                // The game may not terminate its final message.
                if let Some(line) = remainder {
                    self.deliver(&line);
                }
                self.disconnect(TransportError::PeerClosed);
            }
            ReadOutcome::Failed(err) => self.disconnect(err),
        }
    }

    fn deliver(&mut self, line: &str) {
        trace!(line, "message received");
        dispatch_line(line, &mut self.handler);
    }

    /// Drop the active connection and notify the handler, then go back to
    /// listening. Does nothing outside the `Active` state.
    fn disconnect(&mut self, reason: TransportError) {
        match std::mem::replace(&mut self.link, Link::Listening) {
            Link::Active(connection) => {
                info!(
                    peer = %connection.peer,
                    %reason,
                    unterminated_bytes = connection.lines.pending_len(),
                    "game disconnected"
                );
                drop(connection);
                self.handler.on_disconnect();
            }
            other => self.link = other,
        }
    }

    /// Shutdown path: drop any connection without `on_disconnect`.
    ///
    /// `ShuttingDown` covers the teardown of the stream. Any `disconnect`
    /// reached in that state is ignored, which is what keeps the handler from
    /// seeing `on_disconnect` during shutdown.
    fn close(&mut self) {
        if let Link::Active(connection) = std::mem::replace(&mut self.link, Link::ShuttingDown) {
            debug!(peer = %connection.peer, "dropping game connection for shutdown");
            connection.stream.shutdown(Shutdown::Both).ok();
        }
        self.link = Link::Closed;
        debug!("bridge thread exiting");
    }
}
