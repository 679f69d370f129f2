//! Pre-release tag handling for semantic versioning
//!
//! Supports pre-release labels with an optional counter, ordered according
//! to semver.org precedence rules: https://semver.org/#spec-item-11

use crate::error::{CalcVerError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Pre-release component of a semantic version
///
/// An empty `name` means "no pre-release". A populated tag renders as
/// `name` or `name.number`, e.g. `alpha` or `alpha.5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreReleaseTag {
    /// Pre-release label, possibly dotted (e.g. "alpha" or "alpha.foo")
    pub name: String,
    /// Optional counter appended as the final identifier
    pub number: Option<u32>,
}

impl PreReleaseTag {
    /// Create a new pre-release tag
    pub fn new(name: impl Into<String>, number: Option<u32>) -> Self {
        PreReleaseTag {
            name: name.into(),
            number,
        }
    }

    /// An empty tag, meaning the version has no pre-release component
    pub fn none() -> Self {
        PreReleaseTag {
            name: String::new(),
            number: None,
        }
    }

    /// Whether this tag actually carries a pre-release label
    pub fn has_tag(&self) -> bool {
        !self.name.is_empty()
    }

    /// Parse the pre-release section of a version string (text after `-`)
    ///
    /// If the final dot-separated identifier is numeric it becomes the
    /// counter; everything before it is the label. `alpha.foo.1` parses as
    /// name `alpha.foo`, number `1`.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CalcVerError::version("Empty pre-release identifier"));
        }

        for identifier in s.split('.') {
            if identifier.is_empty() {
                return Err(CalcVerError::version(format!(
                    "Empty identifier in pre-release '{}'",
                    s
                )));
            }
            if !identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(CalcVerError::version(format!(
                    "Invalid character in pre-release '{}'",
                    s
                )));
            }
        }

        let parts: Vec<&str> = s.split('.').collect();
        let last = parts[parts.len() - 1];

        if parts.len() > 1 && last.chars().all(|c| c.is_ascii_digit()) {
            let number = last.parse::<u32>().map_err(|_| {
                CalcVerError::version(format!("Invalid pre-release number: '{}'", last))
            })?;
            Ok(PreReleaseTag {
                name: parts[..parts.len() - 1].join("."),
                number: Some(number),
            })
        } else {
            Ok(PreReleaseTag {
                name: s.to_string(),
                number: None,
            })
        }
    }

    /// Increment the counter; a tag without one becomes `.1`
    pub fn increment(&self) -> Self {
        PreReleaseTag {
            name: self.name.clone(),
            number: Some(self.number.map_or(1, |n| n + 1)),
        }
    }
}

impl FromStr for PreReleaseTag {
    type Err = CalcVerError;

    fn from_str(s: &str) -> Result<Self> {
        PreReleaseTag::parse(s)
    }
}

impl fmt::Display for PreReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(n) = self.number {
            write!(f, ".{}", n)?;
        }
        Ok(())
    }
}

impl PartialOrd for PreReleaseTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreReleaseTag {
    fn cmp(&self, other: &Self) -> Ordering {
        match compare_identifiers(&self.name, &other.name) {
            Ordering::Equal => match (self.number, other.number) {
                (None, None) => Ordering::Equal,
                // A tag without a number precedes the same tag with one
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(&b),
            },
            ord => ord,
        }
    }
}

/// Compare dotted identifier lists per SemVer 2.0.0 §11: numeric identifiers
/// compare numerically and sort below alphanumeric ones; a shorter list
/// precedes a longer one when all shared identifiers are equal.
fn compare_identifiers(a: &str, b: &str) -> Ordering {
    let mut lhs = a.split('.');
    let mut rhs = b.split('.');

    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let nx = x.parse::<u64>();
                let ny = y.parse::<u64>();
                let ord = match (nx, ny) {
                    (Ok(n), Ok(m)) => n.cmp(&m),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sanitize arbitrary text into a SemVer pre-release identifier
///
/// Each run of characters outside `[0-9A-Za-z-]` becomes a single `-`;
/// dash runs are collapsed and leading/trailing `-` trimmed.
pub fn sanitize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    out.trim_matches('-').to_string()
}
