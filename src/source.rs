use crate::error::{Result, ShimmyError};
use std::fmt;
use url::Url;

/// A remote source reference, e.g. `https://deno.land/x/udd@0.5.0/main.ts`.
///
/// The version pin is an `@<version>` suffix on exactly one path segment.
/// A reference without a pinned segment tracks the latest upstream version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    url: Url,
    pin: Option<Pin>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pin {
    segment: usize,
    stem: String,
    version: String,
}

impl SourceRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ShimmyError::SourceRef(format!("'{}': {}", raw.trim(), e)))?;

        match url.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(ShimmyError::SourceRef(format!(
                    "unsupported scheme '{}' in '{}'",
                    scheme, raw
                )));
            }
        }

        if url.host_str().is_none() {
            return Err(ShimmyError::SourceRef(format!("'{}' has no host", raw)));
        }

        let pin = url.path_segments().and_then(|segments| {
            segments.enumerate().find_map(|(idx, segment)| {
                let (stem, version) = segment.split_once('@')?;
                if stem.is_empty() || version.is_empty() {
                    return None;
                }
                Some(Pin {
                    segment: idx,
                    stem: stem.to_string(),
                    version: version.to_string(),
                })
            })
        });

        Ok(Self { url, pin })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path_segments(&self) -> Vec<&str> {
        self.url
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default()
    }

    /// The version pinned into the reference, if any.
    pub fn pinned_version(&self) -> Option<&str> {
        self.pin.as_ref().map(|pin| pin.version.as_str())
    }

    /// Name of the pinned path segment with the version stripped.
    pub fn module(&self) -> Option<&str> {
        self.pin.as_ref().map(|pin| pin.stem.as_str())
    }

    /// A reasonable default script name: the pinned segment's stem, falling
    /// back to the last path segment without its extension.
    pub fn script_name(&self) -> Option<String> {
        if let Some(pin) = &self.pin {
            return Some(pin.stem.clone());
        }

        let segments = self.path_segments();
        let last = *segments.iter().rev().find(|s| !s.is_empty())?;
        let name = last.split('.').next().unwrap_or(last);
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    /// The same URL with the version pin removed (`udd@0.5.0` -> `udd`).
    pub fn unpinned(&self) -> Url {
        match &self.pin {
            Some(pin) => self.replace_segment(pin.segment, &pin.stem),
            None => self.url.clone(),
        }
    }

    /// Re-pin the reference to a different version.
    pub fn with_version(&self, version: &str) -> Result<Self> {
        let pin = self.pin.as_ref().ok_or_else(|| {
            ShimmyError::SourceRef(format!("'{}' has no version segment to replace", self.url))
        })?;

        let url = self.replace_segment(pin.segment, &format!("{}@{}", pin.stem, version));
        Ok(Self {
            url,
            pin: Some(Pin {
                segment: pin.segment,
                stem: pin.stem.clone(),
                version: version.to_string(),
            }),
        })
    }

    fn replace_segment(&self, index: usize, replacement: &str) -> Url {
        let segments: Vec<String> = self
            .path_segments()
            .into_iter()
            .enumerate()
            .map(|(idx, segment)| {
                if idx == index {
                    replacement.to_string()
                } else {
                    segment.to_string()
                }
            })
            .collect();

        let mut url = self.url.clone();
        url.set_path(&segments.join("/"));
        url
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
