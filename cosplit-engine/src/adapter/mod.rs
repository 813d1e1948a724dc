//! Split engine adapters
//!
//! Every method is driven through [`SplitEngine`]. The concrete adapter is
//! chosen from the descriptor's protocol; [`EngineKind`] holds one variant
//! per protocol so the lifecycle manager never needs to know which one it
//! is talking to.

use crate::candidate::SplitResult;
use crate::descriptor::{EngineSpec, MethodDescriptor};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

pub mod prepare;
pub mod process;
pub mod retry;
pub mod service;

pub use process::ProcessEngine;
pub use retry::RetryPolicy;
pub use service::ServiceEngine;

/// Capability set of an external splitting engine
pub trait SplitEngine: Send + Sync {
    /// Bring the engine up; may block while it warms up
    fn start(&self) -> Result<()>;

    /// Tear the engine down; calling it twice is not an error
    fn stop(&self) -> Result<()>;

    /// Propose segmentations for `word`
    fn split(&self, word: &str) -> Result<SplitResult>;

    /// Like [`split`](Self::split), but abandon the request after `timeout`
    ///
    /// Adapters that can cancel their work (kill a child process, close a
    /// socket) override this. The default ignores the limit.
    fn split_with_timeout(&self, word: &str, timeout: Option<Duration>) -> Result<SplitResult> {
        let _ = timeout;
        self.split(word)
    }

    /// Fetch or extract engine resources; idempotent
    fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds the adapter for a descriptor
pub trait EngineFactory: Send + Sync {
    /// Construct a (not yet started) engine
    fn build(&self, descriptor: &MethodDescriptor) -> Result<Arc<dyn SplitEngine>>;
}

/// Adapter variants, one per protocol
#[derive(Debug)]
pub enum EngineKind {
    /// Command per word
    Process(ProcessEngine),
    /// TCP service
    Service(ServiceEngine),
}

impl EngineKind {
    /// Select the variant matching the descriptor
    pub fn from_descriptor(descriptor: &MethodDescriptor) -> Self {
        match &descriptor.engine {
            EngineSpec::Process(spec) => EngineKind::Process(ProcessEngine::new(
                &descriptor.name,
                &descriptor.dir,
                spec.clone(),
            )),
            EngineSpec::Service(spec) => EngineKind::Service(ServiceEngine::new(
                &descriptor.name,
                &descriptor.dir,
                spec.clone(),
            )),
        }
    }
}

impl SplitEngine for EngineKind {
    fn start(&self) -> Result<()> {
        match self {
            EngineKind::Process(engine) => engine.start(),
            EngineKind::Service(engine) => engine.start(),
        }
    }

    fn stop(&self) -> Result<()> {
        match self {
            EngineKind::Process(engine) => engine.stop(),
            EngineKind::Service(engine) => engine.stop(),
        }
    }

    fn split(&self, word: &str) -> Result<SplitResult> {
        match self {
            EngineKind::Process(engine) => engine.split(word),
            EngineKind::Service(engine) => engine.split(word),
        }
    }

    fn split_with_timeout(&self, word: &str, timeout: Option<Duration>) -> Result<SplitResult> {
        match self {
            EngineKind::Process(engine) => engine.split_with_timeout(word, timeout),
            EngineKind::Service(engine) => engine.split_with_timeout(word, timeout),
        }
    }

    fn prepare(&self) -> Result<()> {
        match self {
            EngineKind::Process(engine) => engine.prepare(),
            EngineKind::Service(engine) => engine.prepare(),
        }
    }
}

/// Factory for the built-in protocols
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEngineFactory;

impl EngineFactory for DefaultEngineFactory {
    fn build(&self, descriptor: &MethodDescriptor) -> Result<Arc<dyn SplitEngine>> {
        Ok(Arc::new(EngineKind::from_descriptor(descriptor)))
    }
}
