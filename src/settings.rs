use crate::error::{Result, ShimmyError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const SETTINGS_FILE: &str = "shimmy.toml";

/// Optional per-root configuration, read from `<root>/shimmy.toml`.
/// A missing file means defaults; a malformed file is an error.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub resolver: ResolverSettings,
    pub runtime: RuntimeSpec,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverSettings {
    pub timeout_secs: u64,
    pub jobs: Option<usize>,
    pub include_unstable: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            jobs: None,
            include_unstable: false,
        }
    }
}

/// The command a shim hands the pinned URL to.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeSpec {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self {
            command: "deno".to_string(),
            args: vec!["run".to_string(), "-A".to_string()],
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let path = root.as_ref().join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ShimmyError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ShimmyError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.resolver.timeout_secs)
    }
}
