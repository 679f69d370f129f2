use crate::domain::metadata::BuildMetaData;
use crate::domain::prerelease::PreReleaseTag;
use crate::error::{CalcVerError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic version per SemVer 2.0.0
///
/// Equality and ordering follow SemVer precedence: the numeric triple, then
/// pre-release identifiers. Build metadata never participates in either.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: Option<PreReleaseTag>,
    pub build_metadata: Option<BuildMetaData>,
}

impl SemanticVersion {
    /// Create a bare version with no pre-release or metadata
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Attach a pre-release tag; an empty tag clears it
    pub fn with_pre_release(mut self, tag: PreReleaseTag) -> Self {
        self.pre_release = if tag.has_tag() { Some(tag) } else { None };
        self
    }

    /// Attach build metadata
    pub fn with_metadata(mut self, meta: BuildMetaData) -> Self {
        self.build_metadata = Some(meta);
        self
    }

    /// Parse a version string, accepting an optional leading `v` or `V`
    ///
    /// Recognizes `M.m.p`, an optional `-pre.N` section and an optional
    /// `+build` section. The build section is kept only when its first
    /// identifier is a plain commit count.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix('v').or_else(|| s.strip_prefix('V')).unwrap_or(s);

        if s.is_empty() {
            return Err(CalcVerError::version("Empty version string"));
        }

        let (s, build) = match s.split_once('+') {
            Some((head, build)) => (head, Some(build)),
            None => (s, None),
        };

        let (triple, pre) = match s.split_once('-') {
            Some((head, pre)) => (head, Some(pre)),
            None => (s, None),
        };

        let parts: Vec<&str> = triple.split('.').collect();
        if parts.len() != 3 {
            return Err(CalcVerError::version(format!(
                "Invalid version format: '{}' - expected M.m.p",
                s
            )));
        }

        let component = |text: &str, which: &str| -> Result<u32> {
            if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
                return Err(CalcVerError::version(format!(
                    "Invalid {} version component: '{}'",
                    which, text
                )));
            }
            text.parse::<u32>().map_err(|_| {
                CalcVerError::version(format!("Invalid {} version component: '{}'", which, text))
            })
        };

        let major = component(parts[0], "major")?;
        let minor = component(parts[1], "minor")?;
        let patch = component(parts[2], "patch")?;

        let pre_release = match pre {
            Some(text) => Some(PreReleaseTag::parse(text)?),
            None => None,
        };

        // Only a leading commit count survives a round-trip; anything else
        // in the build section is opaque and dropped.
        let build_metadata = build.and_then(|text| {
            let first = text.split('.').next().unwrap_or("");
            first
                .parse::<u32>()
                .ok()
                .map(|count| BuildMetaData::new(count, "", "", 0))
        });

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            pre_release,
            build_metadata,
        })
    }

    /// Increment the major component, resetting minor and patch
    pub fn increment_major(&self) -> Self {
        SemanticVersion::new(self.major + 1, 0, 0)
    }

    /// Increment the minor component, resetting patch
    pub fn increment_minor(&self) -> Self {
        SemanticVersion::new(self.major, self.minor + 1, 0)
    }

    /// Increment the patch component
    pub fn increment_patch(&self) -> Self {
        SemanticVersion::new(self.major, self.minor, self.patch + 1)
    }

    /// Increment only the pre-release counter, keeping the triple
    pub fn increment_pre_release_number(&self) -> Self {
        let pre = self
            .pre_release
            .as_ref()
            .map(|p| p.increment())
            .unwrap_or_else(|| PreReleaseTag::new("", Some(1)));
        SemanticVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre_release: Some(pre),
            build_metadata: None,
        }
    }

    /// The bare numeric triple, pre-release and metadata stripped
    pub fn triple(&self) -> Self {
        SemanticVersion::new(self.major, self.minor, self.patch)
    }

    /// Render in a named format: `"s"` short, `"f"` full, anything else canonical
    ///
    /// Short is `M.m.p[-pre.N]`; canonical appends `+commits` when metadata
    /// is present; full appends `+commits.branch.sha`.
    pub fn format(&self, format: &str) -> String {
        let mut out = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if let Some(pre) = &self.pre_release {
            if pre.has_tag() {
                out.push('-');
                out.push_str(&pre.to_string());
            }
        }
        match format {
            "s" => out,
            "f" => {
                if let Some(meta) = &self.build_metadata {
                    out.push('+');
                    out.push_str(&meta.full());
                }
                out
            }
            _ => {
                if let Some(meta) = &self.build_metadata {
                    out.push('+');
                    out.push_str(&meta.to_string());
                }
                out
            }
        }
    }
}

impl FromStr for SemanticVersion {
    type Err = CalcVerError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(""))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                // A release sorts after any pre-release of the same triple
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}
