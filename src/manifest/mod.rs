use crate::error::{Result, ShimmyError};
use crate::source::SourceRef;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub mod shim;
pub use shim::Shim;

pub const BIN_DIR: &str = "bin";

/// One installed script: the shim's name and the source it is pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledScript {
    pub name: String,
    pub source: SourceRef,
}

/// The record of every managed script under a registry root.
/// Names are unique; entries are kept in name order so listings and update
/// reports are deterministic.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    scripts: Vec<InstalledScript>,
}

impl Manifest {
    pub fn from_scripts(scripts: Vec<InstalledScript>) -> Self {
        Self { scripts }
    }

    pub fn scripts(&self) -> &[InstalledScript] {
        &self.scripts
    }

    pub fn get(&self, name: &str) -> Option<&InstalledScript> {
        self.scripts.iter().find(|script| script.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Read-only view over the on-disk registry layout (`<root>/bin`).
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    /// Scan `<root>/bin` for managed shims.
    ///
    /// Files that do not parse as shims (the runtime binary, stray files)
    /// are skipped. Windows launcher pairs (`udd` + `udd.cmd`) collapse into
    /// a single entry.
    pub fn load(&self) -> Result<Manifest> {
        let bin = self.bin_dir();

        if !bin.is_dir() {
            return Err(ShimmyError::ManifestUnreadable(format!(
                "'{}' is not a script registry (missing {}/ directory)",
                self.root.display(),
                BIN_DIR
            )));
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&bin)
            .map_err(|e| {
                ShimmyError::ManifestUnreadable(format!(
                    "failed to read '{}': {}",
                    bin.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        let mut scripts: BTreeMap<String, InstalledScript> = BTreeMap::new();

        for path in entries {
            let Some(name) = Self::script_name(&path) else {
                continue;
            };

            let Ok(contents) = fs::read_to_string(&path) else {
                // Not UTF-8 text, e.g. the runtime binary itself
                continue;
            };

            let Some(url) = Shim::source_url(&contents) else {
                continue;
            };

            let Ok(source) = SourceRef::parse(&url) else {
                continue;
            };

            scripts
                .entry(name.clone())
                .or_insert(InstalledScript { name, source });
        }

        Ok(Manifest::from_scripts(scripts.into_values().collect()))
    }

    fn script_name(path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;

        let launcher_ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "cmd" | "bat" | "ps1"))
            .unwrap_or(false);

        if launcher_ext {
            path.file_stem()?.to_str().map(|stem| stem.to_string())
        } else {
            Some(file_name.to_string())
        }
    }
}
