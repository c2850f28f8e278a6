use crate::error::{Result, ShimmyError};
use crate::registry::RegistryClient;
use crate::source::SourceRef;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::time::Duration;

pub const LAND_HOST: &str = "deno.land";

/// deno.land module registry client.
///
/// The registry redirects an unversioned module URL to its latest release
/// (`/x/udd/main.ts` -> `/x/udd@0.8.2/main.ts`), so the latest version is
/// recovered by probing with redirects disabled and reading `Location`.
/// The redirect always points at the current release, so the stability
/// channel has no effect for this scheme.
pub struct DenoLandClient {
    client: Client,
}

impl DenoLandClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("shimmy/0.1.0")
            .redirect(Policy::none())
            .build()
            .map_err(|e| ShimmyError::Io(std::io::Error::other(e)))?;

        Ok(Self { client })
    }

    fn probe(&self, source: &SourceRef) -> Result<Option<String>> {
        let probe_url = source.unpinned();

        if std::env::var("SHIMMY_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Probing: {}", probe_url);
        }

        let response = self
            .client
            .get(probe_url.clone())
            .send()
            .map_err(|e| ShimmyError::Resolution(format!("request to {} failed: {}", probe_url, e)))?;

        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            if std::env::var("SHIMMY_VERBOSE").is_ok() {
                eprintln!("[VERBOSE] Redirected to: {}", location);
            }

            return Ok(version_from_location(location));
        }

        if status.is_server_error() {
            return Err(ShimmyError::Resolution(format!(
                "registry answered HTTP {} for {}",
                status, probe_url
            )));
        }

        if std::env::var("SHIMMY_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] HTTP {}: no release redirect", status);
        }

        // Direct hit or not found: the registry has no newer pin to offer
        Ok(None)
    }
}

impl RegistryClient for DenoLandClient {
    fn resolve_latest(&self, source: &SourceRef, _stable_only: bool) -> Result<Option<String>> {
        self.probe(source)
    }
}

/// Extract the release version out of a redirect target path such as
/// `/x/udd@0.8.2/main.ts` or a fully-qualified URL.
fn version_from_location(location: &str) -> Option<String> {
    let path = location
        .strip_prefix("https://")
        .or_else(|| location.strip_prefix("http://"))
        .map(|rest| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(location);

    path.split('/').find_map(|segment| {
        let (stem, version) = segment.split_once('@')?;
        if stem.is_empty() || version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    })
}
