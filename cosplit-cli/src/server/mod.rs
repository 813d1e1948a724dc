//! Line-oriented socket server
//!
//! A client connects, sends `lemma,method` and reads back the parts of the
//! best candidate joined by commas. The server closes the connection after
//! the reply. Failures are answered with `error: <message>`.
//!
//! A [`ShutdownHandle`] stops the accept loop from another thread, e.g. a
//! signal handler.

use anyhow::{Context, Result};
use cosplit_engine::EngineManager;
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MAX_REQUEST: usize = 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Socket server sharing one engine manager between connections
pub struct SplitServer {
    listener: TcpListener,
    manager: Arc<EngineManager>,
    stopping: Arc<AtomicBool>,
}

/// Stops the accept loop of a [`SplitServer`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stopping: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting connections
    ///
    /// Connections already accepted are still answered.
    pub fn shutdown(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        // accept() only returns on a new connection
        let mut wake = self.addr;
        if wake.ip().is_unspecified() {
            wake.set_ip(match wake.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            });
        }
        if let Err(e) = TcpStream::connect(wake) {
            log::warn!("Failed to wake server at {wake}: {e}");
        }
    }

    /// Whether shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }
}

impl SplitServer {
    /// Bind to `addr`
    pub fn bind(addr: &str, manager: Arc<EngineManager>) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("Failed to bind {addr}"))?;
        Ok(Self {
            listener,
            manager,
            stopping: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle that stops [`serve`](Self::serve) from another thread
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            stopping: Arc::clone(&self.stopping),
            addr: self.local_addr()?,
        })
    }

    /// Address the server listens on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections, each on its own thread
    ///
    /// Returns once a [`ShutdownHandle`] fired, after `max_connections`
    /// connections, or when accepting fails. Handlers still running are
    /// joined first.
    pub fn serve(self, max_connections: Option<usize>) -> Result<()> {
        log::info!("Listening at {}", self.local_addr()?);

        let limit = max_connections.unwrap_or(usize::MAX);
        let mut workers = Vec::new();
        for stream in self.listener.incoming().take(limit) {
            if self.stopping.load(Ordering::SeqCst) {
                log::info!("Shutdown requested, no longer accepting connections");
                break;
            }
            let stream = stream.context("Failed to accept connection")?;
            let manager = Arc::clone(&self.manager);
            workers.push(thread::spawn(move || {
                if let Err(e) = handle_connection(stream, &manager) {
                    log::warn!("Connection failed: {e:#}");
                }
            }));
            workers.retain(|worker| !worker.is_finished());
        }

        for worker in workers {
            if worker.join().is_err() {
                log::error!("Connection handler panicked");
            }
        }
        Ok(())
    }
}

fn handle_connection(mut stream: TcpStream, manager: &EngineManager) -> Result<()> {
    let peer = stream.peer_addr()?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let mut buf = [0u8; MAX_REQUEST];
    let len = stream.read(&mut buf)?;
    let request = String::from_utf8_lossy(&buf[..len]);
    log::debug!("{peer} wrote: {:?}", request.trim());

    let reply = respond(manager, &request);
    log::info!("{peer}: {} -> {reply}", request.trim());
    stream.write_all(reply.as_bytes())?;
    stream.flush()?;
    Ok(())
}

/// Answer one `lemma,method` request
pub fn respond(manager: &EngineManager, request: &str) -> String {
    let Some((lemma, method)) = parse_request(request) else {
        return "error: request must be of the form \"lemma,method\"".to_string();
    };

    match manager.split(method, lemma) {
        Ok(result) => match result.best() {
            Some(candidate) => candidate.parts.join(","),
            None => lemma.to_string(),
        },
        Err(e) => format!("error: {e}"),
    }
}

fn parse_request(request: &str) -> Option<(&str, &str)> {
    let (lemma, method) = request.trim().split_once(',')?;
    let (lemma, method) = (lemma.trim(), method.trim());
    if lemma.is_empty() || method.is_empty() || method.contains(',') {
        return None;
    }
    Some((lemma, method))
}
