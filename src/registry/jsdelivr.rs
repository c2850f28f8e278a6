use crate::error::{Result, ShimmyError};
use crate::registry::version::VersionSelector;
use crate::registry::RegistryClient;
use crate::source::SourceRef;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

pub const CDN_HOST: &str = "cdn.jsdelivr.net";
const DATA_API: &str = "https://data.jsdelivr.com/v1/packages/gh";

/// jsDelivr GitHub CDN client.
///
/// Sources shaped like `https://cdn.jsdelivr.net/gh/<owner>/<repo>@<version>/<path>`
/// are resolved through the jsDelivr data API, which lists every published
/// version for the backing repository.
pub struct JsDelivrClient {
    client: Client,
}

impl JsDelivrClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("shimmy/0.1.0")
            .build()
            .map_err(|e| ShimmyError::Io(std::io::Error::other(e)))?;

        Ok(Self { client })
    }

    fn package_url(source: &SourceRef) -> Result<String> {
        let segments = source.path_segments();

        let owner = match segments.as_slice() {
            ["gh", owner, ..] if !owner.is_empty() => *owner,
            _ => {
                return Err(ShimmyError::Resolution(format!(
                    "'{}' is not a gh/<owner>/<repo> reference",
                    source
                )));
            }
        };

        let repo = source.module().ok_or_else(|| {
            ShimmyError::Resolution(format!("'{}' has no pinned repository segment", source))
        })?;

        Ok(format!("{}/{}/{}", DATA_API, owner, repo))
    }

    fn fetch_versions(&self, source: &SourceRef) -> Result<Option<Vec<String>>> {
        let url = Self::package_url(source)?;

        if std::env::var("SHIMMY_VERBOSE").is_ok() {
            eprintln!("[VERBOSE] Fetching: {}", url);
        }

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ShimmyError::Resolution(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(ShimmyError::Resolution(format!(
                "registry answered HTTP {} for {}",
                status, url
            )));
        }

        let metadata: PackageMetadata = response
            .json()
            .map_err(|e| ShimmyError::Resolution(format!("malformed package listing: {}", e)))?;

        let versions = metadata
            .versions
            .into_iter()
            .map(|entry| entry.version)
            .collect();

        Ok(Some(versions))
    }
}

impl RegistryClient for JsDelivrClient {
    fn resolve_latest(&self, source: &SourceRef, stable_only: bool) -> Result<Option<String>> {
        match self.fetch_versions(source)? {
            Some(versions) => Ok(VersionSelector::latest(&versions, stable_only)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    versions: Vec<PackageVersion>,
}

#[derive(Debug, Deserialize)]
struct PackageVersion {
    version: String,
}
