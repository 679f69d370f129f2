//! Git access abstraction
//!
//! The calculation consumes history through the [Repository] trait and never
//! touches the backing library directly. Two implementations ship with the
//! crate: [repository::Git2Repository] over libgit2, and [mock::MockRepository],
//! an in-memory DAG used by the test suite.
//!
//! Adapters must be deterministic within a single calculation: repeated calls
//! with the same arguments return the same answers, and listing methods
//! return sorted results.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use std::collections::HashSet;

/// One commit as the calculation sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    /// Parent shas, first parent first
    pub parents: Vec<String>,
    /// Committer date, unix seconds
    pub committer_date: i64,
}

impl CommitInfo {
    /// Merge commits have two or more parents
    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }
}

/// A tag peeled to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub target: String,
}

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    /// Current branch name; `None` when HEAD is detached
    pub branch: Option<String>,
    /// Sha of the current commit
    pub sha: String,
}

/// Read-only queries the version calculation needs from a working copy
pub trait Repository {
    /// Current branch and commit. Fails with `NoCommits` on an unborn HEAD.
    fn head(&self) -> Result<HeadInfo>;

    /// Names of all local branches, sorted
    fn local_branches(&self) -> Result<Vec<String>>;

    /// Tip sha of a branch found by exact name
    fn branch_tip(&self, name: &str) -> Result<Option<String>>;

    /// Every commit reachable from `sha`, newest first
    fn commits_from(&self, sha: &str) -> Result<Vec<CommitInfo>>;

    /// All tags (annotated and lightweight), peeled to commits, sorted by name
    fn tags(&self) -> Result<Vec<TagInfo>>;

    /// Newest common ancestor of two commits, if any
    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>>;

    /// Tags attached to one commit
    fn tags_on(&self, sha: &str) -> Result<Vec<String>> {
        Ok(self
            .tags()?
            .into_iter()
            .filter(|t| t.target == sha)
            .map(|t| t.name)
            .collect())
    }

    /// Commits reachable from `from` but not from `ancestor`
    ///
    /// With no ancestor the count is anchored at the root commit: all
    /// reachable commits except the root itself.
    fn commits_since(&self, from: &str, ancestor: Option<&str>) -> Result<u32> {
        let reachable = self.commits_from(from)?;
        match ancestor {
            Some(a) => {
                let hidden: HashSet<String> = self
                    .commits_from(a)?
                    .into_iter()
                    .map(|c| c.sha)
                    .collect();
                Ok(reachable
                    .iter()
                    .filter(|c| !hidden.contains(&c.sha))
                    .count() as u32)
            }
            None => Ok(reachable.len().saturating_sub(1) as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_merge() {
        let commit = CommitInfo {
            sha: "c3".to_string(),
            message: "Merge branch 'feature/x'".to_string(),
            parents: vec!["c1".to_string(), "c2".to_string()],
            committer_date: 3,
        };
        assert!(commit.is_merge());

        let plain = CommitInfo {
            sha: "c1".to_string(),
            message: "one".to_string(),
            parents: vec![],
            committer_date: 1,
        };
        assert!(!plain.is_merge());
    }
}
