use std::cmp::Ordering;

/// Version representation tolerant of registry tag formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub original: String,
    pub parsed: VersionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionKind {
    Semantic(semver::Version),
    Numeric(Vec<u32>),
    Unknown(String),
}

impl Version {
    pub fn parse(version: &str) -> Self {
        // Registries commonly tag releases with a leading `v`
        let bare = version.strip_prefix('v').unwrap_or(version);

        let parsed = if let Ok(v) = semver::Version::parse(bare) {
            VersionKind::Semantic(v)
        } else if let Some(numeric) = Self::parse_numeric(bare) {
            VersionKind::Numeric(numeric)
        } else {
            VersionKind::Unknown(version.to_string())
        };

        Version {
            original: version.to_string(),
            parsed,
        }
    }

    fn parse_numeric(version: &str) -> Option<Vec<u32>> {
        let mut numbers = Vec::new();
        for part in version.split('.') {
            numbers.push(part.parse::<u32>().ok()?);
        }

        if numbers.is_empty() {
            None
        } else {
            Some(numbers)
        }
    }

    pub fn is_stable(&self) -> bool {
        let lower = self.original.to_lowercase();

        let unstable_markers = [
            "alpha", "beta", "rc", "dev", "pre", "canary", "nightly", "preview",
        ];

        for marker in &unstable_markers {
            if lower.contains(marker) {
                return false;
            }
        }

        match &self.parsed {
            VersionKind::Semantic(v) => v.pre.is_empty(),
            _ => true,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (VersionKind::Semantic(a), VersionKind::Semantic(b)) => a.cmp(b),
            (VersionKind::Numeric(a), VersionKind::Numeric(b)) => {
                for (av, bv) in a.iter().zip(b.iter()) {
                    match av.cmp(bv) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.original.cmp(&other.original),
        }
    }
}

pub struct VersionSelector;

impl VersionSelector {
    /// Pick the newest version from a registry listing
    pub fn latest(versions: &[String], stable_only: bool) -> Option<String> {
        let mut parsed: Vec<Version> = versions.iter().map(|v| Version::parse(v)).collect();

        if stable_only {
            parsed.retain(|v| v.is_stable());
        }

        parsed.sort();
        parsed.pop().map(|v| v.original)
    }
}
