//! Runtime configuration.

use std::path::PathBuf;

use engine_inject::Injectable;

/// Environment variable naming the prototype root directory.
pub const PROTOTYPE_DIR_ENV: &str = "ENGINE_PROTOTYPE_DIR";

/// Prototype root used when neither the caller nor the environment sets one.
pub const DEFAULT_PROTOTYPE_DIR: &str = "prototypes";

/// Extension of prototype files.
pub const DEFAULT_PROTOTYPE_EXTENSION: &str = "json";

/// Settings shared by the runtime's managers.
///
/// The orchestrator provides the config to the container, so managers reach
/// it through a dependency slot like any other collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Directory scanned recursively for prototype files.
    pub prototype_dir: PathBuf,
    /// Only files with this extension are loaded.
    pub prototype_extension: String,
    /// Log every loaded prototype at `info` instead of `debug`.
    pub verbose: bool,
}

impl RuntimeConfig {
    /// Config reading prototypes from `prototype_dir`.
    #[must_use]
    pub fn new(prototype_dir: impl Into<PathBuf>) -> Self {
        Self {
            prototype_dir: prototype_dir.into(),
            prototype_extension: DEFAULT_PROTOTYPE_EXTENSION.to_string(),
            verbose: false,
        }
    }

    /// Config with the prototype root taken from `ENGINE_PROTOTYPE_DIR`, or
    /// `prototypes` when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var(PROTOTYPE_DIR_ENV).unwrap_or_else(|_| DEFAULT_PROTOTYPE_DIR.into());
        Self::new(dir)
    }

    #[must_use]
    pub fn with_prototype_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prototype_dir = dir.into();
        self
    }

    /// Override the prototype file extension (without the leading dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.prototype_extension = extension.into();
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOTYPE_DIR)
    }
}

impl Injectable for RuntimeConfig {}
