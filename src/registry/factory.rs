use crate::error::{Result, ShimmyError};
use crate::registry::jsdelivr::{JsDelivrClient, CDN_HOST};
use crate::registry::land::{DenoLandClient, LAND_HOST};
use crate::registry::RegistryClient;
use crate::source::SourceRef;
use std::sync::Arc;
use std::time::Duration;

pub struct RegistryFactory;

impl RegistryFactory {
    pub fn create_router(timeout: Duration) -> Result<Arc<dyn RegistryClient>> {
        Ok(Arc::new(RegistryRouter {
            land: Arc::new(DenoLandClient::new(timeout)?),
            cdn: Arc::new(JsDelivrClient::new(timeout)?),
        }))
    }
}

/// Dispatches each reference to the client for its URL shape.
pub struct RegistryRouter {
    land: Arc<dyn RegistryClient>,
    cdn: Arc<dyn RegistryClient>,
}

impl RegistryClient for RegistryRouter {
    fn resolve_latest(&self, source: &SourceRef, stable_only: bool) -> Result<Option<String>> {
        match source.host() {
            LAND_HOST => self.land.resolve_latest(source, stable_only),
            CDN_HOST => self.cdn.resolve_latest(source, stable_only),
            host => Err(ShimmyError::Resolution(format!(
                "no registry client for host '{}'",
                host
            ))),
        }
    }
}
