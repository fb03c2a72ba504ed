// config.rs — CLI configuration from pdi.toml.
//
// Every section is optional. Relative paths are resolved against the
// project root, so the default layout lives under `.pdi/`:
//
//   [store]      dir  = ".pdi/store"
//   [directory]  path = ".pdi/people.json"
//   [events]     log  = ".pdi/events.jsonl", enabled = true
//   [logging]    level = "warn", json = false

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE: &str = "pdi.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdiConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where OKR records are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// The people directory file (JSON array of people).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_directory_path")]
    pub path: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: default_directory_path(),
        }
    }
}

/// Change-notification log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_events_log")]
    pub log: PathBuf,

    /// Write OKR events to `log`. Default: true.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            log: default_events_log(),
            enabled: true,
        }
    }
}

/// Diagnostics written to stderr.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

// Serde default functions
fn default_store_dir() -> PathBuf {
    PathBuf::from(".pdi/store")
}

fn default_directory_path() -> PathBuf {
    PathBuf::from(".pdi/people.json")
}

fn default_events_log() -> PathBuf {
    PathBuf::from(".pdi/events.jsonl")
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl PdiConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Parse a config file, falling back to defaults if it does not exist.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Load `pdi.toml` from the project root (if any) and resolve its paths.
    pub fn for_project(project_root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = project_root.as_ref();
        Ok(Self::load_or_default(&root.join(CONFIG_FILE))?.resolve(root))
    }

    /// Make every relative path absolute under `project_root`.
    pub fn resolve(mut self, project_root: &Path) -> Self {
        let anchor = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_root.join(p)
            }
        };
        self.store.dir = anchor(&self.store.dir);
        self.directory.path = anchor(&self.directory.path);
        self.events.log = anchor(&self.events.log);
        self
    }
}
