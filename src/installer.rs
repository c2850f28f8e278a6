use crate::error::{Result, ShimmyError};
use crate::manifest::{Shim, BIN_DIR};
use crate::settings::RuntimeSpec;
use crate::source::SourceRef;
use std::fs;
use std::path::{Path, PathBuf};

/// Installs or overwrites the executable entry for a script.
///
/// An install is a full replace and must be atomic from the caller's
/// perspective: a crash mid-install may leave a stale entry but never a
/// half-written one.
pub trait Installer: Send + Sync {
    fn install(&self, name: &str, source: &SourceRef) -> Result<()>;
}

/// Writes launcher shims into `<root>/bin` via temp-file-then-rename.
pub struct ShimInstaller {
    bin_dir: PathBuf,
    runtime: RuntimeSpec,
}

impl ShimInstaller {
    pub fn new<P: AsRef<Path>>(root: P, runtime: RuntimeSpec) -> Self {
        Self {
            bin_dir: root.as_ref().join(BIN_DIR),
            runtime,
        }
    }

    pub fn uninstall(&self, name: &str) -> Result<()> {
        Self::ensure_safe_name(name)?;

        let mut removed = false;
        for candidate in [
            self.bin_dir.join(name),
            self.bin_dir.join(format!("{}.cmd", name)),
        ] {
            if candidate.is_file() {
                fs::remove_file(&candidate).map_err(|e| {
                    ShimmyError::Install(format!("failed to remove '{}': {}", candidate.display(), e))
                })?;
                removed = true;
            }
        }

        if removed {
            Ok(())
        } else {
            Err(ShimmyError::Install(format!("'{}' is not installed", name)))
        }
    }

    fn ensure_safe_name(name: &str) -> Result<()> {
        let bad = name.is_empty()
            || name == "."
            || name == ".."
            || name.starts_with('.')
            || name.contains(['/', '\\']);

        if bad {
            return Err(ShimmyError::Install(format!(
                "'{}' is not a valid script name",
                name
            )));
        }
        Ok(())
    }

    fn write_atomic(&self, target: &Path, contents: &str) -> Result<()> {
        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("shim");
        let tmp = self.bin_dir.join(format!(".{}.tmp", file_name));

        fs::write(&tmp, contents).map_err(|e| {
            ShimmyError::Install(format!("failed to write '{}': {}", tmp.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o755)).map_err(|e| {
                ShimmyError::Install(format!("failed to mark '{}' executable: {}", tmp.display(), e))
            })?;
        }

        fs::rename(&tmp, target).map_err(|e| {
            ShimmyError::Install(format!("failed to move shim into '{}': {}", target.display(), e))
        })
    }
}

impl Installer for ShimInstaller {
    fn install(&self, name: &str, source: &SourceRef) -> Result<()> {
        Self::ensure_safe_name(name)?;

        fs::create_dir_all(&self.bin_dir).map_err(|e| {
            ShimmyError::Install(format!(
                "failed to create '{}': {}",
                self.bin_dir.display(),
                e
            ))
        })?;

        self.write_atomic(&self.bin_dir.join(name), &Shim::render(source, &self.runtime))?;

        if cfg!(windows) {
            self.write_atomic(
                &self.bin_dir.join(format!("{}.cmd", name)),
                &Shim::render_cmd(source, &self.runtime),
            )?;
        }

        Ok(())
    }
}
