use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::board::Player;
use crate::turn::MoveError;

use super::protocol::{self, Message, MoveRecord, ProtocolError};

const EVENT_CAPACITY: usize = 64;
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// Which end of the stream this process is. The host always plays first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The well-known port is taken: a game is already being hosted here.
    /// The existing session is unaffected; there is no queueing or retry.
    #[error("A game is already being hosted")]
    PortInUse,
    /// Nobody is listening on the target endpoint.
    #[error("No games found")]
    NoSessionFound,
    #[error("Peer disconnected")]
    PeerDisconnected,
    #[error("malformed message from peer: {0}")]
    MalformedMessage(ProtocolError),
    /// A well-formed record that cannot be applied here, either an illegal
    /// move or one arriving after the round is decided. The session closes
    /// rather than letting the two boards diverge.
    #[error("peer sent an illegal move: {0}")]
    ProtocolViolation(MoveError),
    #[error("network error: {0}")]
    Io(#[from] io::Error),
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> SessionError {
        match err {
            ProtocolError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                SessionError::PeerDisconnected
            }
            ProtocolError::Io(e) => SessionError::Io(e),
            other => SessionError::MalformedMessage(other),
        }
    }
}

/// What the background reader hands to the foreground loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// The single peer connected (host side only; a client is connected from
    /// the moment `join` returns).
    PeerConnected(SocketAddr),
    /// A move to replay through the regular apply path.
    Move(MoveRecord),
    /// The peer ended the session cleanly.
    Closed,
    /// The stream broke or produced something that is not a frame.
    Failed(SessionError),
}

enum Writer {
    /// Host before the peer arrives: the reader thread hands the write half
    /// over once it has accepted.
    Pending(Receiver<TcpStream>),
    Ready(TcpStream),
    Gone,
}

/// A point-to-point session with the single remote peer.
///
/// Reads happen on one dedicated thread that blocks on the socket, decodes
/// frames and forwards typed events over a bounded channel; the foreground
/// loop drains that channel once per frame and never blocks. Sends go out on
/// the caller's thread. [`Session::shutdown`] closes the socket, which wakes
/// the blocked reader instead of leaving it parked.
pub struct Session {
    role: Role,
    writer: Writer,
    events: Receiver<SessionEvent>,
    reader: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl Session {
    /// Binds `addr` and accepts at most one inbound connection. A second
    /// bind while a session is active fails fast with [`SessionError::PortInUse`].
    pub fn host<A: ToSocketAddrs>(addr: A) -> Result<Session, SessionError> {
        let listener = TcpListener::bind(addr).map_err(|e| {
            if e.kind() == io::ErrorKind::AddrInUse {
                SessionError::PortInUse
            } else {
                SessionError::Io(e)
            }
        })?;
        listener.set_nonblocking(true)?;
        log::info!("hosting on {}", listener.local_addr()?);

        let (event_tx, event_rx) = sync_channel(EVENT_CAPACITY);
        let (stream_tx, stream_rx) = sync_channel(1);
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let reader = thread::spawn(move || {
            accept_then_read(listener, event_tx, stream_tx, thread_running);
        });

        Ok(Session {
            role: Role::Host,
            writer: Writer::Pending(stream_rx),
            events: event_rx,
            reader: Some(reader),
            running,
        })
    }

    /// Connects to a hosted game. A refused connection is reported as
    /// [`SessionError::NoSessionFound`] and not retried.
    pub fn join<A: ToSocketAddrs>(addr: A) -> Result<Session, SessionError> {
        let mut last_err = SessionError::NoSessionFound;
        let mut stream = None;
        for candidate in addr.to_socket_addrs()? {
            match TcpStream::connect(candidate) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    last_err = SessionError::NoSessionFound;
                }
                Err(e) => last_err = SessionError::Io(e),
            }
        }
        let stream = stream.ok_or(last_err)?;
        stream.set_nodelay(true)?;
        log::info!("joined game at {}", stream.peer_addr()?);

        let (event_tx, event_rx) = sync_channel(EVENT_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let read_half = stream.try_clone()?;

        let reader = thread::spawn(move || {
            read_loop(read_half, &event_tx, &thread_running);
        });

        Ok(Session {
            role: Role::Client,
            writer: Writer::Ready(stream),
            events: event_rx,
            reader: Some(reader),
            running,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The mark this side plays: the host is Crosses and moves first.
    pub fn local_player(&self) -> Player {
        match self.role {
            Role::Host => Player::Cross,
            Role::Client => Player::Nought,
        }
    }

    /// Non-blocking: returns the next queued event, if any. Called once per
    /// frame by the foreground loop.
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Serializes one applied move and sends it to the peer.
    pub fn send_move(&mut self, record: MoveRecord) -> Result<(), SessionError> {
        self.send(&Message::Move(record))
    }

    /// Tells the peer the session is over. Best effort; the socket closes
    /// shortly after either way.
    pub fn send_bye(&mut self) {
        if let Err(err) = self.send(&Message::Bye) {
            log::debug!("bye not delivered: {}", err);
        }
    }

    fn send(&mut self, message: &Message) -> Result<(), SessionError> {
        let stream = self.stream()?;
        protocol::write_frame(stream, message)?;
        Ok(())
    }

    fn stream(&mut self) -> Result<&mut TcpStream, SessionError> {
        if let Writer::Pending(rx) = &self.writer {
            match rx.try_recv() {
                Ok(stream) => self.writer = Writer::Ready(stream),
                Err(_) => {
                    return Err(SessionError::Io(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "no peer connected yet",
                    )));
                }
            }
        }
        match &mut self.writer {
            Writer::Ready(stream) => Ok(stream),
            _ => Err(SessionError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "session closed",
            ))),
        }
    }

    /// Closes the connection and wakes the reader thread. Idempotent.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Ok(stream) = self.stream() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.writer = Writer::Gone;
        if let Some(handle) = self.reader.take() {
            // Keep draining so a reader parked on a full channel can finish.
            while !handle.is_finished() {
                while self.events.try_recv().is_ok() {}
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Host-side reader: waits for the single peer, hands the write half to the
/// session, then reads frames until the stream ends.
fn accept_then_read(
    listener: TcpListener,
    events: SyncSender<SessionEvent>,
    stream_tx: SyncSender<TcpStream>,
    running: Arc<AtomicBool>,
) {
    let (stream, peer) = loop {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        match listener.accept() {
            Ok(accepted) => break accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                let _ = events.send(SessionEvent::Failed(SessionError::Io(e)));
                return;
            }
        }
    };
    // The listener stays bound for the life of the session so a second host
    // attempt on the port keeps failing fast. It accepts nobody else.
    let _listener = listener;

    log::info!("peer connected from {}", peer);
    if stream.set_nonblocking(false).is_err() || stream.set_nodelay(true).is_err() {
        let _ = events.send(SessionEvent::Failed(SessionError::Io(io::Error::new(
            io::ErrorKind::Other,
            "could not configure accepted socket",
        ))));
        return;
    }

    let write_half = match stream.try_clone() {
        Ok(half) => half,
        Err(e) => {
            let _ = events.send(SessionEvent::Failed(SessionError::Io(e)));
            return;
        }
    };
    if stream_tx.send(write_half).is_err() {
        return; // session already dropped
    }
    if events.send(SessionEvent::PeerConnected(peer)).is_err() {
        return;
    }

    read_loop(stream, &events, &running);
}

/// Blocks on the socket decoding one frame at a time, in arrival order, and
/// forwards each as an event. Exits on Bye, on any error, or when the
/// foreground side has shut the socket down.
fn read_loop(stream: TcpStream, events: &SyncSender<SessionEvent>, running: &AtomicBool) {
    let mut reader = BufReader::new(stream);
    loop {
        match protocol::read_frame(&mut reader) {
            Ok(Message::Move(record)) => {
                if events.send(SessionEvent::Move(record)).is_err() {
                    return;
                }
            }
            Ok(Message::Bye) => {
                log::info!("peer closed the session");
                let _ = events.send(SessionEvent::Closed);
                return;
            }
            Err(err) => {
                if !running.load(Ordering::SeqCst) {
                    return; // local shutdown woke us
                }
                let failure: SessionError = err.into();
                log::warn!("session read failed: {}", failure);
                let _ = events.send(SessionEvent::Failed(failure));
                return;
            }
        }
    }
}
