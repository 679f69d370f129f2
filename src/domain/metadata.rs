//! Build metadata attached to a calculated version

use crate::domain::prerelease::sanitize_label;
use std::fmt;

/// Build metadata for a calculated version
///
/// Carries the commit count since the chosen base-version source plus the
/// branch, sha and commit date of the commit being versioned. Ignored for
/// precedence comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetaData {
    /// Commits reachable from the versioned commit but not from the base source
    pub commits_since_tag: u32,
    /// Name of the branch the version was calculated on
    pub branch: String,
    /// Sha of the versioned commit
    pub sha: String,
    /// Committer date of the versioned commit, unix seconds
    pub commit_date: i64,
}

impl BuildMetaData {
    pub fn new(
        commits_since_tag: u32,
        branch: impl Into<String>,
        sha: impl Into<String>,
        commit_date: i64,
    ) -> Self {
        BuildMetaData {
            commits_since_tag,
            branch: branch.into(),
            sha: sha.into(),
            commit_date,
        }
    }

    /// Render the full metadata section: `commits.branch.sha`
    ///
    /// The branch name is sanitized so the result stays within the SemVer
    /// build-metadata alphabet.
    pub fn full(&self) -> String {
        format!(
            "{}.{}.{}",
            self.commits_since_tag,
            sanitize_label(&self.branch),
            self.sha
        )
    }
}

impl fmt::Display for BuildMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.commits_since_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_commit_count() {
        let meta = BuildMetaData::new(17, "master", "abc1234", 1_700_000_000);
        assert_eq!(meta.to_string(), "17");
    }

    #[test]
    fn test_full_rendering() {
        let meta = BuildMetaData::new(2, "feature/test", "abc1234", 1_700_000_000);
        assert_eq!(meta.full(), "2.feature-test.abc1234");
    }
}
