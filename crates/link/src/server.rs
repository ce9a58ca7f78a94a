//! Single-client TCP server.
//!
//! Listens on a TCP port and serves one client at a time. A receive
//! thread accepts the client and decodes its byte stream into frames for
//! a [`FrameHandler`]; a sender thread drains the outbound queue to the
//! socket. Both run until [`ServerHandle::shutdown`].

use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use camctl_protocol::{DEFAULT_PORT, Frame, FrameDecoder};

use crate::LinkError;
use crate::outbound::Outbound;
use crate::writer::{FrameWriter, LogSink};

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Capacity of the outbound ring buffer in bytes.
    pub send_buffer_size: usize,
    /// Size of one socket read.
    pub recv_chunk_size: usize,
    /// Maximum bytes moved from the queue to the socket per write.
    pub send_chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            send_buffer_size: 1024 * 1024,
            recv_chunk_size: 512,
            send_chunk_size: 512,
        }
    }
}

/// Receives decoded frames and connection events.
///
/// Called from the receive thread only, so implementations may hold
/// `&mut` state without extra locking.
pub trait FrameHandler: Send + 'static {
    /// Called for every complete inbound frame.
    fn on_frame(&mut self, frame: Frame);

    /// Called after a client has been accepted.
    fn on_client_connected(&mut self, _peer: SocketAddr) {}

    /// Called after the client has gone away and the decoder was reset.
    fn on_client_disconnected(&mut self) {}
}

/// State shared by the two server threads and the handle.
#[derive(Debug)]
struct Shared {
    outbound: Arc<Outbound>,
    client: Mutex<Option<Arc<TcpStream>>>,
    stop: AtomicBool,
}

impl Shared {
    fn client(&self) -> MutexGuard<'_, Option<Arc<TcpStream>>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The link server, before it starts listening.
///
/// Producers can be handed out first so nothing logged during startup is
/// lost; frames queued before a client connects are delivered once it does.
#[derive(Debug)]
pub struct LinkServer {
    config: ServerConfig,
    outbound: Arc<Outbound>,
}

impl LinkServer {
    /// Creates the server and its outbound queue.
    ///
    /// # Panics
    ///
    /// Panics if `config.send_buffer_size` is zero.
    pub fn new(config: ServerConfig) -> Self {
        let outbound = Arc::new(Outbound::new(config.send_buffer_size));
        Self { config, outbound }
    }

    /// Returns a frame producer for this server.
    pub fn writer(&self) -> FrameWriter {
        FrameWriter::new(Arc::clone(&self.outbound))
    }

    /// Returns an `io::Write` sink that streams bytes as `Log` frames.
    pub fn log_sink(&self) -> LogSink {
        LogSink::new(self.writer())
    }

    /// Binds the listening socket and spawns the receive and sender threads.
    ///
    /// A bind or listen failure is returned; nothing is spawned in that case.
    pub fn start<H: FrameHandler>(self, handler: H) -> Result<ServerHandle, LinkError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener =
            TcpListener::bind(addr).map_err(|source| LinkError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "link server listening");

        let shared = Arc::new(Shared {
            outbound: self.outbound,
            client: Mutex::new(None),
            stop: AtomicBool::new(false),
        });

        let recv_chunk = self.config.recv_chunk_size.max(1);
        let receiver = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("link-receiver".into())
                .spawn(move || receive_loop(listener, &shared, handler, recv_chunk))
                .map_err(|source| LinkError::Spawn {
                    name: "receiver",
                    source,
                })?
        };

        let send_chunk = self.config.send_chunk_size.max(1);
        let sender = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("link-sender".into())
                .spawn(move || send_loop(&shared, send_chunk))
        };

        let mut handle = ServerHandle {
            local_addr,
            shared,
            receiver: Some(receiver),
            sender: None,
        };
        match sender {
            Ok(sender) => {
                handle.sender = Some(sender);
                Ok(handle)
            }
            Err(source) => {
                // Dropping the handle stops the receiver again.
                drop(handle);
                Err(LinkError::Spawn {
                    name: "sender",
                    source,
                })
            }
        }
    }
}

/// Running server; dropping it shuts the server down.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    receiver: Option<JoinHandle<()>>,
    sender: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether a client is currently attached.
    pub fn is_client_connected(&self) -> bool {
        self.shared.outbound.is_connected()
    }

    /// Stops both threads, closes the client and waits for the threads to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.shared.stop.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("link server shutting down");

        self.shared.outbound.close();
        if let Some(stream) = self.shared.client().take() {
            let _ = stream.shutdown(Shutdown::Both);
        }

        // Unblock accept() with a throwaway connection.
        let mut wake = self.local_addr;
        if wake.ip().is_unspecified() {
            wake.set_ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        if let Err(e) = TcpStream::connect_timeout(&wake, Duration::from_secs(1)) {
            tracing::debug!(error = %e, "wake connection failed");
        }

        for handle in [self.receiver.take(), self.sender.take()].into_iter().flatten() {
            if handle.join().is_err() {
                tracing::error!("link thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Waits for the next client, pausing between failed accepts.
///
/// Returns `None` once the stop flag is raised.
fn accept_client(listener: &TcpListener, stop: &AtomicBool) -> Option<(TcpStream, SocketAddr)> {
    loop {
        match listener.accept() {
            Ok(accepted) => return Some(accepted),
            Err(e) => {
                if stop.load(Ordering::SeqCst) {
                    return None;
                }
                tracing::warn!(error = %e, "accept failed");
                thread::sleep(ACCEPT_RETRY_DELAY);
            }
        }
    }
}

fn receive_loop<H: FrameHandler>(
    listener: TcpListener,
    shared: &Shared,
    mut handler: H,
    chunk_size: usize,
) {
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; chunk_size];

    loop {
        let Some((stream, peer)) = accept_client(&listener, &shared.stop) else {
            break;
        };

        let stream = Arc::new(stream);
        {
            // Checked under the client lock so shutdown cannot miss a new client.
            let mut slot = shared.client();
            if shared.stop.load(Ordering::SeqCst) {
                break;
            }
            *slot = Some(Arc::clone(&stream));
        }
        shared.outbound.set_connected(true);
        tracing::info!(%peer, "client connected");
        handler.on_client_connected(peer);

        loop {
            match (&*stream).read(&mut buf) {
                Ok(0) => break,
                Ok(n) => decoder.decode(&buf[..n], |frame| handler.on_frame(frame)),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(%peer, error = %e, "receive failed");
                    break;
                }
            }
        }

        shared.outbound.set_connected(false);
        shared.client().take();
        let _ = stream.shutdown(Shutdown::Both);
        decoder.reset();
        handler.on_client_disconnected();
        tracing::info!(%peer, "client disconnected");

        if shared.stop.load(Ordering::SeqCst) {
            break;
        }
    }
}

fn send_loop(shared: &Shared, chunk_size: usize) {
    let mut buf = vec![0u8; chunk_size];

    // The queue lock is released inside wait_pop before the socket write.
    while let Some(n) = shared.outbound.wait_pop(&mut buf) {
        let Some(stream) = shared.client().clone() else {
            tracing::debug!(dropped = n, "client gone, dropping outbound bytes");
            continue;
        };
        if let Err(e) = (&*stream).write_all(&buf[..n]) {
            tracing::warn!(error = %e, "send failed, closing client");
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
