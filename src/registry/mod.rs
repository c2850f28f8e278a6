use crate::error::Result;
use crate::source::SourceRef;

pub mod factory;
pub mod jsdelivr;
pub mod land;
pub mod version;

pub use factory::{RegistryFactory, RegistryRouter};
pub use jsdelivr::JsDelivrClient;
pub use land::DenoLandClient;
pub use version::VersionSelector;

/// Capability shared by every registry scheme: look up the newest published
/// version for a source reference.
///
/// Implementations must be safe to call concurrently for distinct references
/// and must never touch installed state.
pub trait RegistryClient: Send + Sync {
    /// Returns the newest version available upstream, or `None` when the
    /// registry answers cleanly but has nothing to offer for this reference.
    fn resolve_latest(&self, source: &SourceRef, stable_only: bool) -> Result<Option<String>>;
}
