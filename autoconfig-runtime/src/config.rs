//! Registry-wide configuration and per-profile settings.

use crate::binding::SynthesisMode;
use autoconfig_model::ProfileOperationMode;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default profile directory.
pub const PROFILE_DIR_ENV: &str = "AUTOCONFIG_PROFILE_DIR";

const DEFAULT_DIR_NAME: &str = "Profiles";

/// Configuration shared by every profile of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    /// Directory that holds profile files without an explicit path.
    pub default_root: PathBuf,
}

impl ProfileConfig {
    /// Reads `AUTOCONFIG_PROFILE_DIR`, falling back to a `Profiles`
    /// directory next to the executable, then to `./Profiles`.
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(dir) = env::var(PROFILE_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Self::with_default_root(dir);
            }
        }
        let root = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME));
        Self { default_root: root }
    }

    #[must_use]
    pub fn with_default_root(root: impl AsRef<Path>) -> Self {
        Self {
            default_root: root.as_ref().to_path_buf(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Per-type settings, read once when a profile is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSettings {
    /// Persistence format.
    pub mode: ProfileOperationMode,
    /// Backing path without extension; `None` means default root + profile name.
    pub path: Option<PathBuf>,
    /// Whether initialization loads the backing file.
    pub auto_load: bool,
    /// How accessor bindings are synthesized.
    pub synthesis: SynthesisMode,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            mode: ProfileOperationMode::Dictionary,
            path: None,
            auto_load: true,
            synthesis: SynthesisMode::Merged,
        }
    }
}

impl ProfileSettings {
    #[must_use]
    pub fn with_mode(mut self, mode: ProfileOperationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_auto_load(mut self, auto_load: bool) -> Self {
        self.auto_load = auto_load;
        self
    }

    #[must_use]
    pub fn with_synthesis(mut self, synthesis: SynthesisMode) -> Self {
        self.synthesis = synthesis;
        self
    }
}
