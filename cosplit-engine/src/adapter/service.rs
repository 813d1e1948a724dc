//! TCP service adapter
//!
//! Talks a line protocol to a long-lived splitting server: the word followed
//! by a newline goes out, one line of space- or dash-separated parts comes
//! back. An empty reply means the word was left whole.

use super::prepare::run_prepare;
use super::retry::RetryAction;
use super::SplitEngine;
use crate::candidate::{Candidate, SplitResult};
use crate::descriptor::ServiceSpec;
use crate::error::{EngineError, Result};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

const PROBE_INTERVAL: Duration = Duration::from_millis(250);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const IO_TIMEOUT: Duration = Duration::from_secs(60);

/// Adapter for engines running as a TCP server
#[derive(Debug)]
pub struct ServiceEngine {
    method: String,
    dir: PathBuf,
    spec: ServiceSpec,
    child: Mutex<Option<Child>>,
}

impl ServiceEngine {
    /// Create the adapter
    pub fn new(method: &str, dir: &Path, spec: ServiceSpec) -> Self {
        Self {
            method: method.to_string(),
            dir: dir.to_path_buf(),
            spec,
            child: Mutex::new(None),
        }
    }

    fn lock_child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn address(&self) -> io::Result<SocketAddr> {
        (self.spec.host.as_str(), self.spec.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("{} does not resolve", self.spec.host),
                )
            })
    }

    fn spawn_server(&self) -> Result<()> {
        let Some(server) = &self.spec.server else {
            return Ok(());
        };

        let mut child = self.lock_child();
        if child.is_some() {
            return Ok(());
        }

        tracing::info!(method = %self.method, command = %server.command, "spawning engine server");
        let spawned = Command::new(&server.command)
            .args(&server.args)
            .envs(&server.env)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| {
                EngineError::start(&self.method, format!("failed to spawn {}: {e}", server.command))
            })?;
        *child = Some(spawned);
        Ok(())
    }

    /// Exit status of the server if it already terminated
    fn server_exit(&self) -> Option<ExitStatus> {
        let mut guard = self.lock_child();
        let status = guard.as_mut().and_then(|child| child.try_wait().ok().flatten());
        if status.is_some() {
            guard.take();
        }
        status
    }

    fn wait_ready(&self, addr: SocketAddr) -> Result<()> {
        let warmup = Duration::from_secs(self.spec.warmup_secs);
        let deadline = Instant::now() + warmup;

        loop {
            if TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok() {
                return Ok(());
            }
            if let Some(status) = self.server_exit() {
                return Err(EngineError::start(
                    &self.method,
                    format!("server exited with {status}"),
                ));
            }
            if Instant::now() >= deadline {
                return Err(EngineError::start(
                    &self.method,
                    format!("{addr} not accepting connections after {}s", warmup.as_secs()),
                ));
            }
            thread::sleep(PROBE_INTERVAL);
        }
    }

    fn request(&self, word: &str, addr: SocketAddr) -> io::Result<String> {
        let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.write_all(format!("{word}\n").as_bytes())?;

        let mut reply = String::new();
        BufReader::new(&stream).read_line(&mut reply)?;
        Ok(reply)
    }
}

/// Parse one reply line
pub fn parse_reply(word: &str, reply: &str) -> SplitResult {
    let parts: Vec<&str> = reply
        .trim()
        .split([' ', '-'])
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return SplitResult::unsplit(word);
    }
    SplitResult::new(vec![Candidate::new(parts, 1.0)])
}

impl SplitEngine for ServiceEngine {
    fn start(&self) -> Result<()> {
        self.spawn_server()?;
        let addr = self
            .address()
            .map_err(|e| EngineError::start(&self.method, e.to_string()))?;

        match self.wait_ready(addr) {
            Ok(()) => {
                tracing::info!(method = %self.method, %addr, "engine service ready");
                Ok(())
            }
            Err(e) => {
                let _ = self.stop();
                Err(e)
            }
        }
    }

    fn stop(&self) -> Result<()> {
        let Some(mut child) = self.lock_child().take() else {
            return Ok(());
        };

        if let Err(e) = child.kill() {
            tracing::debug!(method = %self.method, error = %e, "server already gone");
        }
        let status = child.wait()?;
        tracing::info!(method = %self.method, %status, "engine server stopped");
        Ok(())
    }

    fn split(&self, word: &str) -> Result<SplitResult> {
        let addr = self
            .address()
            .map_err(|e| EngineError::call(&self.method, e.to_string()))?;
        let policy = self.spec.retry;
        let mut last_error = String::new();

        for attempt in 0..policy.attempts() {
            match policy.action(attempt) {
                RetryAction::Immediate => {}
                RetryAction::Wait(delay) => thread::sleep(delay),
                RetryAction::Restart(delay) => {
                    tracing::warn!(method = %self.method, attempt, "restarting engine");
                    let restarted = self.stop().and_then(|()| {
                        thread::sleep(delay);
                        self.start()
                    });
                    if let Err(e) = restarted {
                        last_error = e.to_string();
                        continue;
                    }
                }
            }

            match self.request(word, addr) {
                Ok(reply) => return Ok(parse_reply(word, &reply)),
                Err(e) => {
                    tracing::warn!(
                        method = %self.method,
                        attempt,
                        error = %e,
                        "split request failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        if policy.fallback_unsplit {
            tracing::warn!(method = %self.method, word, "giving up, returning word unsplit");
            return Ok(SplitResult::unsplit(word));
        }
        Err(EngineError::call(&self.method, last_error))
    }

    fn prepare(&self) -> Result<()> {
        match &self.spec.prepare {
            Some(spec) => run_prepare(&self.method, &self.dir, spec),
            None => Ok(()),
        }
    }
}

impl Drop for ServiceEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::RetryPolicy;
    use crate::descriptor::ServerCommand;
    use std::collections::BTreeMap;
    use std::net::TcpListener;

    /// Serve `connections` requests, answering each line with `reply(line)`
    fn fake_server<F>(connections: usize, reply: F) -> u16
    where
        F: Fn(&str) -> String + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let mut stream = stream.unwrap();
                let mut line = String::new();
                if BufReader::new(&stream).read_line(&mut line).unwrap() == 0 {
                    continue;
                }
                let answer = reply(line.trim_end());
                stream.write_all(answer.as_bytes()).unwrap();
            }
        });
        port
    }

    fn spec(port: u16) -> ServiceSpec {
        ServiceSpec {
            server: None,
            host: "127.0.0.1".to_string(),
            port,
            warmup_secs: 0,
            retry: RetryPolicy::none(),
            prepare: None,
        }
    }

    fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_parse_reply() {
        let result = parse_reply("kwaliteitscontrole", "kwaliteits controle\n");
        assert_eq!(result.candidates[0].parts, vec!["kwaliteits", "controle"]);

        let result = parse_reply("zee-egel", "zee-egel");
        assert_eq!(result.candidates[0].parts, vec!["zee", "egel"]);

        let result = parse_reply("tafel", "\n");
        assert_eq!(result, SplitResult::unsplit("tafel"));
    }

    #[test]
    fn test_split_over_tcp() {
        // one probe during start, then one request
        let port = fake_server(2, |word| match word {
            "huisjacht" => "huis jacht\n".to_string(),
            _ => "\n".to_string(),
        });
        let engine = ServiceEngine::new("svc", Path::new("."), spec(port));
        engine.start().unwrap();

        let result = engine.split("huisjacht").unwrap();
        assert_eq!(result.candidates[0].parts, vec!["huis", "jacht"]);
        engine.stop().unwrap();
        engine.stop().unwrap();
    }

    #[test]
    fn test_start_fails_when_unreachable() {
        let engine = ServiceEngine::new("svc", Path::new("."), spec(unused_port()));
        let err = engine.start().unwrap_err();
        assert!(matches!(err, EngineError::EngineStart { .. }));
    }

    #[test]
    fn test_split_without_service_fails() {
        let engine = ServiceEngine::new("svc", Path::new("."), spec(unused_port()));
        let err = engine.split("tafel").unwrap_err();
        assert!(matches!(err, EngineError::EngineCall { ref method, .. } if method == "svc"));
    }

    #[test]
    fn test_fallback_unsplit_after_retries() {
        let mut s = spec(unused_port());
        s.retry = RetryPolicy {
            max_attempts: 2,
            delay_ms: 1,
            restart_after: None,
            fallback_unsplit: true,
        };
        let engine = ServiceEngine::new("svc", Path::new("."), s);
        assert_eq!(engine.split("tafel").unwrap(), SplitResult::unsplit("tafel"));
    }

    #[test]
    fn test_failed_restart_is_call_error() {
        let mut s = spec(unused_port());
        s.retry = RetryPolicy {
            max_attempts: 2,
            delay_ms: 1,
            restart_after: Some(1),
            fallback_unsplit: false,
        };
        let engine = ServiceEngine::new("svc", Path::new("."), s);
        let err = engine.split("tafel").unwrap_err();
        assert!(matches!(err, EngineError::EngineCall { ref method, .. } if method == "svc"));
        assert!(err.to_string().contains("failed to start"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_server_exit_is_start_error() {
        let mut s = spec(unused_port());
        s.warmup_secs = 5;
        s.server = Some(ServerCommand {
            command: "false".to_string(),
            args: vec![],
            env: BTreeMap::new(),
        });
        let engine = ServiceEngine::new("svc", Path::new("."), s);
        let err = engine.start().unwrap_err();
        assert!(err.to_string().contains("server exited"));
    }

    #[cfg(unix)]
    #[test]
    fn test_warmup_expiry_kills_server() {
        let mut s = spec(unused_port());
        s.warmup_secs = 1;
        s.server = Some(ServerCommand {
            command: "sleep".to_string(),
            args: vec!["30".to_string()],
            env: BTreeMap::new(),
        });
        let engine = ServiceEngine::new("svc", Path::new("."), s);
        let err = engine.start().unwrap_err();
        assert!(err.to_string().contains("not accepting connections"));
        assert!(engine.lock_child().is_none());
    }
}
