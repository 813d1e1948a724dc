//! Engine lifecycle management
//!
//! [`EngineManager`] starts each method's engine at most once and hands the
//! same [`EngineHandle`] to every caller afterwards. The check-then-start
//! sequence runs under a per-method lock, so slow engines only hold up
//! callers of that same method.
//!
//! The manager is an ordinary value owned by the entry point. Dropping it
//! (or calling [`EngineManager::shutdown_all`]) stops every running engine.

use crate::adapter::{DefaultEngineFactory, EngineFactory, SplitEngine};
use crate::candidate::SplitResult;
use crate::config::EngineConfig;
use crate::descriptor::{MethodDescriptor, MethodRegistry};
use crate::error::{EngineError, Result};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

/// Lifecycle state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, `start` not yet successful
    NotStarted,
    /// Accepting split requests
    Running,
    /// Torn down
    Stopped,
}

/// A running engine shared by all callers of one method
pub struct EngineHandle {
    method: String,
    engine: Arc<dyn SplitEngine>,
    state: Mutex<EngineState>,
    call_timeout: Option<Duration>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("method", &self.method)
            .field("state", &self.state())
            .finish()
    }
}

impl EngineHandle {
    fn new(method: &str, engine: Arc<dyn SplitEngine>, call_timeout: Option<Duration>) -> Self {
        Self {
            method: method.to_string(),
            engine,
            state: Mutex::new(EngineState::NotStarted),
            call_timeout,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Method this engine serves
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        *self.lock_state()
    }

    /// Start the engine within `timeout`
    ///
    /// `in_flight` stays set until the underlying `start` has returned and,
    /// after a timeout, the late engine has been stopped again.
    fn start(&self, timeout: Option<Duration>, in_flight: &Arc<AtomicBool>) -> Result<()> {
        let engine = Arc::clone(&self.engine);
        let late = Arc::clone(&self.engine);
        let method = self.method.clone();
        let settled = Arc::clone(in_flight);
        in_flight.store(true, Ordering::SeqCst);
        let outcome = bounded(timeout, move || engine.start(), move |result| {
            if let Some(Ok(())) = result {
                tracing::warn!(method = %method, "engine started after timeout, stopping it");
                if let Err(e) = late.stop() {
                    tracing::warn!(method = %method, error = %e, "late engine failed to stop");
                }
            }
            settled.store(false, Ordering::SeqCst);
        });
        if !matches!(outcome, Bounded::TimedOut) {
            in_flight.store(false, Ordering::SeqCst);
        }

        match outcome {
            Bounded::Done(result) => result?,
            Bounded::TimedOut => {
                return Err(EngineError::start(
                    &self.method,
                    format!("timed out after {:?}", timeout.unwrap_or_default()),
                ))
            }
            Bounded::Panicked => return Err(EngineError::start(&self.method, "start panicked")),
        }

        *self.lock_state() = EngineState::Running;
        Ok(())
    }

    /// Split `word` on this engine
    pub fn split(&self, word: &str) -> Result<SplitResult> {
        if self.state() != EngineState::Running {
            return Err(EngineError::call(&self.method, "engine is not running"));
        }

        let engine = Arc::clone(&self.engine);
        let word = word.to_string();
        let timeout = self.call_timeout;
        let task = move || engine.split_with_timeout(&word, timeout);
        match bounded(timeout, task, drop) {
            Bounded::Done(result) => result,
            Bounded::TimedOut => Err(EngineError::call(
                &self.method,
                format!("timed out after {:?}", self.call_timeout.unwrap_or_default()),
            )),
            Bounded::Panicked => Err(EngineError::call(&self.method, "split panicked")),
        }
    }

    /// Stop the engine; repeated calls are no-ops
    pub fn stop(&self) -> Result<()> {
        {
            let mut state = self.lock_state();
            if *state == EngineState::Stopped {
                return Ok(());
            }
            *state = EngineState::Stopped;
        }
        self.engine.stop()
    }
}

enum Bounded<T> {
    Done(T),
    TimedOut,
    Panicked,
}

enum Rendezvous<T> {
    Pending,
    Ready(thread::Result<T>),
    Abandoned,
}

/// Run `task`, giving up on it after `timeout`
///
/// A task that outlives its timeout keeps running on its own thread and
/// hands its value to `orphan` when it finishes (`None` if it panicked).
fn bounded<T, F, G>(timeout: Option<Duration>, task: F, orphan: G) -> Bounded<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
    G: FnOnce(Option<T>) + Send + 'static,
{
    let Some(limit) = timeout else {
        return Bounded::Done(task());
    };

    let shared = Arc::new((Mutex::new(Rendezvous::Pending), Condvar::new()));
    let worker = Arc::clone(&shared);
    thread::spawn(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(task));
        let (lock, ready) = &*worker;
        let mut state = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, Rendezvous::Abandoned) {
            drop(state);
            orphan(outcome.ok());
            return;
        }
        *state = Rendezvous::Ready(outcome);
        ready.notify_one();
    });

    let (lock, ready) = &*shared;
    let state = lock.lock().unwrap_or_else(PoisonError::into_inner);
    let (mut state, _) = ready
        .wait_timeout_while(state, limit, |s| matches!(s, Rendezvous::Pending))
        .unwrap_or_else(PoisonError::into_inner);
    match std::mem::replace(&mut *state, Rendezvous::Abandoned) {
        Rendezvous::Ready(Ok(value)) => Bounded::Done(value),
        Rendezvous::Ready(Err(_)) => Bounded::Panicked,
        Rendezvous::Pending | Rendezvous::Abandoned => Bounded::TimedOut,
    }
}

#[derive(Default)]
struct SlotEntry {
    handle: Option<Arc<EngineHandle>>,
    /// Set while a timed-out start is still running in the background
    abandoned_start: Option<Arc<AtomicBool>>,
}

type Slot = Arc<Mutex<SlotEntry>>;

/// Starts engines at most once and shares them between callers
pub struct EngineManager {
    registry: RwLock<MethodRegistry>,
    factory: Arc<dyn EngineFactory>,
    config: EngineConfig,
    slots: RwLock<HashMap<String, Slot>>,
    closed: AtomicBool,
}

impl EngineManager {
    /// Manager for `registry` using the built-in adapters
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_factory(registry, DefaultEngineFactory)
    }

    /// Manager with a custom adapter factory
    pub fn with_factory(registry: MethodRegistry, factory: impl EngineFactory + 'static) -> Self {
        Self {
            registry: RwLock::new(registry),
            factory: Arc::new(factory),
            config: EngineConfig::default(),
            slots: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::ManagerClosed);
        }
        Ok(())
    }

    /// Descriptor of `name`
    pub fn descriptor(&self, name: &str) -> Result<Arc<MethodDescriptor>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
    }

    /// All registered methods, sorted by name
    pub fn methods(&self) -> Vec<Arc<MethodDescriptor>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list()
    }

    /// Re-read the method registry
    ///
    /// Engines that are already running are unaffected.
    pub fn refresh_methods(&self) -> Result<()> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh()
    }

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(name.to_string()).or_default())
    }

    /// Running engine for `name`, starting it on first use
    pub fn acquire(&self, name: &str) -> Result<Arc<EngineHandle>> {
        self.ensure_open()?;
        let descriptor = self.descriptor(name)?;

        let slot = self.slot(name);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        // shutdown may have drained the slots while we waited
        self.ensure_open()?;
        if let Some(handle) = guard.handle.as_ref() {
            return Ok(Arc::clone(handle));
        }
        if let Some(pending) = &guard.abandoned_start {
            if pending.load(Ordering::SeqCst) {
                return Err(EngineError::start(name, "previous start is still in progress"));
            }
            guard.abandoned_start = None;
        }

        tracing::info!(method = name, "starting engine");
        let engine = self.factory.build(&descriptor)?;
        let handle = Arc::new(EngineHandle::new(name, engine, self.config.call_timeout));
        let in_flight = Arc::new(AtomicBool::new(false));
        if let Err(e) = handle.start(self.config.start_timeout, &in_flight) {
            tracing::warn!(method = name, error = %e, "engine failed to start");
            if in_flight.load(Ordering::SeqCst) {
                guard.abandoned_start = Some(in_flight);
            }
            return Err(e);
        }

        guard.handle = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Split `word` with the engine of `method`
    pub fn split(&self, method: &str, word: &str) -> Result<SplitResult> {
        self.acquire(method)?.split(word)
    }

    /// Run the preparation step of `method` without starting it
    pub fn prepare(&self, method: &str) -> Result<()> {
        let descriptor = self.descriptor(method)?;
        self.factory.build(&descriptor)?.prepare()
    }

    /// Names of the methods whose engines are running
    pub fn running(&self) -> Vec<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .handle
                    .is_some()
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether [`shutdown_all`](Self::shutdown_all) has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop every running engine
    ///
    /// Only the first call does anything. Errors from individual engines are
    /// logged and skipped so that every engine gets its stop request.
    /// Returns the number of engines that were stopped.
    pub fn shutdown_all(&self) -> usize {
        if self.closed.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let slots: Vec<(String, Slot)> = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        let mut stopped = 0;
        for (name, slot) in slots {
            let handle = slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle
                .take();
            let Some(handle) = handle else {
                continue;
            };
            match handle.stop() {
                Ok(()) => tracing::info!(method = %name, "engine stopped"),
                Err(e) => tracing::warn!(method = %name, error = %e, "engine failed to stop"),
            }
            stopped += 1;
        }
        stopped
    }
}

impl Drop for EngineManager {
    fn drop(&mut self) {
        self.shutdown_all();
    }
}
