//! Shared in-memory engines for integration tests

#![allow(dead_code)]

use cosplit_engine::descriptor::ProcessSpec;
use cosplit_engine::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Engine answering from a fixed table and counting lifecycle calls
#[derive(Default)]
pub struct ScriptedEngine {
    answers: HashMap<String, Vec<Candidate>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    splits: AtomicUsize,
    start_failures: AtomicUsize,
    entered: AtomicUsize,
    starting: AtomicUsize,
    peak_starting: AtomicUsize,
    start_delay: Duration,
    delay_first_start_only: bool,
    split_delay: Duration,
    failing_words: Vec<String>,
    fail_stop: bool,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `word` with the given candidates
    pub fn answer(mut self, word: &str, candidates: Vec<Candidate>) -> Self {
        self.answers.insert(word.to_string(), candidates);
        self
    }

    /// Answer `word` with a single candidate scoring 1.0
    pub fn split_into(self, word: &str, parts: &[&str]) -> Self {
        self.answer(word, vec![Candidate::new(parts.iter().copied(), 1.0)])
    }

    /// Fail the first `n` starts
    pub fn failing_starts(self, n: usize) -> Self {
        self.start_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Sleep in the first start only
    pub fn first_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self.delay_first_start_only = true;
        self
    }

    pub fn split_delay(mut self, delay: Duration) -> Self {
        self.split_delay = delay;
        self
    }

    /// Fail every split of `word`
    pub fn failing_word(mut self, word: &str) -> Self {
        self.failing_words.push(word.to_string());
        self
    }

    /// Fail every stop
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Most `start` calls that were ever running at the same time
    pub fn peak_starting(&self) -> usize {
        self.peak_starting.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn splits(&self) -> usize {
        self.splits.load(Ordering::SeqCst)
    }
}

impl SplitEngine for ScriptedEngine {
    fn start(&self) -> Result<()> {
        let entered = self.entered.fetch_add(1, Ordering::SeqCst);
        let running = self.starting.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_starting.fetch_max(running, Ordering::SeqCst);
        if !self.delay_first_start_only || entered == 0 {
            thread::sleep(self.start_delay);
        }
        self.starting.fetch_sub(1, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .start_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(EngineError::EngineStart {
                method: "scripted".to_string(),
                reason: "refused".to_string(),
            });
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(EngineError::IoError("stop failed".to_string()));
        }
        Ok(())
    }

    fn split(&self, word: &str) -> Result<SplitResult> {
        thread::sleep(self.split_delay);
        self.splits.fetch_add(1, Ordering::SeqCst);
        if self.failing_words.iter().any(|w| w == word) {
            return Err(EngineError::EngineCall {
                method: "scripted".to_string(),
                reason: "connection dropped".to_string(),
            });
        }
        Ok(match self.answers.get(word) {
            Some(candidates) => SplitResult::new(candidates.clone()),
            None => SplitResult::unsplit(word),
        })
    }
}

/// Factory handing out shared scripted engines
#[derive(Default, Clone)]
pub struct ScriptedFactory {
    engines: Arc<Mutex<HashMap<String, Arc<ScriptedEngine>>>>,
    pub builds: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn with(self, method: &str, engine: ScriptedEngine) -> Self {
        self.engines
            .lock()
            .unwrap()
            .insert(method.to_string(), Arc::new(engine));
        self
    }

    pub fn engine(&self, method: &str) -> Arc<ScriptedEngine> {
        Arc::clone(&self.engines.lock().unwrap()[method])
    }

    /// Registry listing every scripted method
    pub fn registry(&self) -> MethodRegistry {
        let names: Vec<String> = self.engines.lock().unwrap().keys().cloned().collect();
        MethodRegistry::from_descriptors(names.into_iter().map(|name| descriptor(&name)))
    }

    /// Manager over this factory with short timeouts
    pub fn manager(&self) -> EngineManager {
        EngineManager::with_factory(self.registry(), self.clone()).with_config(
            EngineConfig::default()
                .with_start_timeout(Some(Duration::from_secs(5)))
                .with_call_timeout(Some(Duration::from_secs(5))),
        )
    }
}

impl EngineFactory for ScriptedFactory {
    fn build(&self, descriptor: &MethodDescriptor) -> Result<Arc<dyn SplitEngine>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let engine: Arc<dyn SplitEngine> = self
            .engines
            .lock()
            .unwrap()
            .get(&descriptor.name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMethod {
                name: descriptor.name.clone(),
            })?;
        Ok(engine)
    }
}

pub fn descriptor(name: &str) -> MethodDescriptor {
    MethodDescriptor::new(
        name,
        name.to_uppercase(),
        EngineSpec::Process(ProcessSpec {
            command: "true".to_string(),
            args: vec![],
            column: None,
            lowercase: false,
            prepare: None,
        }),
    )
}
