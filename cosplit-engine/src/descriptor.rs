//! Method descriptors and their registry
//!
//! A methods directory holds one subdirectory per splitting method. The
//! subdirectory name is the method name and its `run.json` describes how to
//! drive the engine:
//!
//! ```json
//! {
//!   "display_name": "SECOS",
//!   "protocol": "service",
//!   "server": { "command": "python", "args": ["decompound_server.py"] },
//!   "port": 51337,
//!   "warmup_secs": 60
//! }
//! ```

use crate::adapter::RetryPolicy;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the descriptor file inside a method directory
pub const RUN_FILE: &str = "run.json";

/// How the core talks to an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// A command run once per word
    Process,
    /// A long-lived server reached over TCP
    Service,
}

impl Protocol {
    /// Lowercase protocol name
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Process => "process",
            Protocol::Service => "service",
        }
    }
}

/// One-off resource preparation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareSpec {
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Path (relative to the method directory) whose existence marks the
    /// preparation as done
    pub creates: PathBuf,
}

/// Settings for [`Protocol::Process`] engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Program to run
    pub command: String,
    /// Arguments; `{word}` is replaced by the word, otherwise the word is
    /// appended
    #[serde(default)]
    pub args: Vec<String>,
    /// Tab-separated column holding the parts (whole line when absent)
    #[serde(default)]
    pub column: Option<usize>,
    /// Lowercase the parts
    #[serde(default)]
    pub lowercase: bool,
    /// Optional preparation step
    #[serde(default)]
    pub prepare: Option<PrepareSpec>,
}

/// Server process started alongside a service engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCommand {
    /// Program to run
    pub command: String,
    /// Arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Settings for [`Protocol::Service`] engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Server to launch on start; absent when the service runs elsewhere
    #[serde(default)]
    pub server: Option<ServerCommand>,
    /// Host the service listens on
    #[serde(default = "default_host")]
    pub host: String,
    /// Port the service listens on
    pub port: u16,
    /// Seconds to wait for the service to accept connections
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    /// Retry policy for failed requests
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Optional preparation step
    #[serde(default)]
    pub prepare: Option<PrepareSpec>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_warmup_secs() -> u64 {
    10
}

/// Adapter settings, tagged by protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum EngineSpec {
    /// Command per word
    Process(ProcessSpec),
    /// TCP service
    Service(ServiceSpec),
}

impl EngineSpec {
    /// The protocol of this spec
    pub fn protocol(&self) -> Protocol {
        match self {
            EngineSpec::Process(_) => Protocol::Process,
            EngineSpec::Service(_) => Protocol::Service,
        }
    }
}

/// Static metadata of one splitting method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDescriptor {
    /// Registry key
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Working directory for engine commands
    #[serde(skip)]
    pub dir: PathBuf,
    /// Adapter settings
    #[serde(flatten)]
    pub engine: EngineSpec,
}

#[derive(Deserialize)]
struct RunFile {
    display_name: Option<String>,
    #[serde(flatten)]
    engine: EngineSpec,
}

impl MethodDescriptor {
    /// Create a descriptor
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        engine: EngineSpec,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            dir: PathBuf::from("."),
            engine,
        }
    }

    /// Set the working directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// The protocol used to reach the engine
    pub fn protocol(&self) -> Protocol {
        self.engine.protocol()
    }

    /// Parse a `run.json` body for the method `name` living in `dir`
    pub fn from_json(name: &str, dir: &Path, json: &str) -> Result<Self> {
        let run: RunFile = serde_json::from_str(json).map_err(|e| EngineError::Descriptor {
            path: dir.join(RUN_FILE).display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: name.to_string(),
            display_name: run.display_name.unwrap_or_else(|| name.to_string()),
            dir: dir.to_path_buf(),
            engine: run.engine,
        })
    }

    /// Load the descriptor of the method directory `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| EngineError::Descriptor {
                path: dir.display().to_string(),
                reason: "method directory has no usable name".to_string(),
            })?;
        let json = fs::read_to_string(dir.join(RUN_FILE))?;
        Self::from_json(name, dir, &json)
    }
}

/// Registry of available methods keyed by name
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    root: Option<PathBuf>,
    methods: BTreeMap<String, Arc<MethodDescriptor>>,
}

impl MethodRegistry {
    /// Scan `root` for method directories
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self> {
        let mut registry = Self {
            root: Some(root.into()),
            methods: BTreeMap::new(),
        };
        registry.refresh()?;
        Ok(registry)
    }

    /// Build a registry from in-memory descriptors
    pub fn from_descriptors<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = MethodDescriptor>,
    {
        Self {
            root: None,
            methods: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), Arc::new(d)))
                .collect(),
        }
    }

    /// Re-read the methods directory
    ///
    /// In-memory registries are left untouched.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let mut methods = BTreeMap::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if !path.is_dir() || !path.join(RUN_FILE).is_file() {
                continue;
            }
            let descriptor = MethodDescriptor::load(&path)?;
            tracing::debug!(
                method = %descriptor.name,
                protocol = descriptor.protocol().as_str(),
                "discovered method"
            );
            methods.insert(descriptor.name.clone(), Arc::new(descriptor));
        }

        self.methods = methods;
        Ok(())
    }

    /// Look up a method
    pub fn get(&self, name: &str) -> Result<Arc<MethodDescriptor>> {
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMethod {
                name: name.to_string(),
            })
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// All descriptors sorted by name
    pub fn list(&self) -> Vec<Arc<MethodDescriptor>> {
        self.methods.values().cloned().collect()
    }

    /// All method names, sorted
    pub fn names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no methods are registered
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
