use crate::error::{CalcVerError, Result};
use crate::git::{CommitInfo, HeadInfo, Repository, TagInfo};
use std::collections::{BTreeMap, HashMap, HashSet};

/// In-memory implementation of the [Repository] trait for tests
///
/// Stores a real commit DAG (parent links included) so reachability walks,
/// merge-base queries and commit counting behave like the git-backed
/// adapter. Tests build history through the fluent helpers:
///
/// ```rust
/// # use git_calcver::git::{MockRepository, Repository};
/// let mut repo = MockRepository::new();
/// repo.commit("master", "one");
/// repo.branch("feature/x", "master");
/// repo.commit("feature/x", "two");
/// repo.tag("v0.1.0");
/// repo.checkout("master");
///
/// assert_eq!(repo.local_branches().unwrap().len(), 2);
/// ```
pub struct MockRepository {
    commits: HashMap<String, CommitInfo>,
    branches: BTreeMap<String, String>,
    tags: Vec<TagInfo>,
    head: Option<(Option<String>, String)>,
    clock: i64,
    next_id: u32,
}

impl MockRepository {
    /// Create an empty repository with no commits or branches
    pub fn new() -> Self {
        MockRepository {
            commits: HashMap::new(),
            branches: BTreeMap::new(),
            tags: Vec::new(),
            head: None,
            clock: 1_000,
            next_id: 1,
        }
    }

    /// Commit onto a branch, creating the branch at the root if it is new.
    /// Checks the branch out and returns the new sha.
    pub fn commit(&mut self, branch: impl Into<String>, message: impl Into<String>) -> String {
        let branch = branch.into();
        let parents = match self.branches.get(&branch) {
            Some(tip) => vec![tip.clone()],
            None => Vec::new(),
        };
        self.add_commit(branch, message.into(), parents)
    }

    /// Create a branch pointing at another branch's tip and check it out
    pub fn branch(&mut self, name: impl Into<String>, from: &str) {
        let name = name.into();
        let tip = self
            .branches
            .get(from)
            .unwrap_or_else(|| panic!("branch '{}' does not exist", from))
            .clone();
        self.branches.insert(name.clone(), tip.clone());
        self.head = Some((Some(name), tip));
    }

    /// Point HEAD at an existing branch
    pub fn checkout(&mut self, name: &str) {
        let tip = self
            .branches
            .get(name)
            .unwrap_or_else(|| panic!("branch '{}' does not exist", name))
            .clone();
        self.head = Some((Some(name.to_string()), tip));
    }

    /// Detach HEAD at the current commit
    pub fn detach(&mut self) {
        if let Some((_, sha)) = self.head.clone() {
            self.head = Some((None, sha));
        }
    }

    /// Tag the current HEAD commit
    pub fn tag(&mut self, name: impl Into<String>) {
        let (_, sha) = self
            .head
            .clone()
            .expect("cannot tag an empty repository");
        self.tags.push(TagInfo {
            name: name.into(),
            target: sha,
        });
        self.tags.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Merge `from` into `into` with a merge commit (no fast-forward).
    /// Checks `into` out and returns the merge commit sha.
    pub fn merge(&mut self, from: &str, into: &str) -> String {
        let from_tip = self
            .branches
            .get(from)
            .unwrap_or_else(|| panic!("branch '{}' does not exist", from))
            .clone();
        let into_tip = self
            .branches
            .get(into)
            .unwrap_or_else(|| panic!("branch '{}' does not exist", into))
            .clone();
        let message = format!("Merge branch '{}' into {}", from, into);
        self.add_commit(into.to_string(), message, vec![into_tip, from_tip])
    }

    /// Merge with an explicit message (e.g. a pull-request merge)
    pub fn merge_with_message(
        &mut self,
        from: &str,
        into: &str,
        message: impl Into<String>,
    ) -> String {
        let from_tip = self.branches[from].clone();
        let into_tip = self.branches[into].clone();
        self.add_commit(into.to_string(), message.into(), vec![into_tip, from_tip])
    }

    fn add_commit(&mut self, branch: String, message: String, parents: Vec<String>) -> String {
        let sha = format!("c{:04}", self.next_id);
        self.next_id += 1;
        self.clock += 60;
        self.commits.insert(
            sha.clone(),
            CommitInfo {
                sha: sha.clone(),
                message,
                parents,
                committer_date: self.clock,
            },
        );
        self.branches.insert(branch.clone(), sha.clone());
        self.head = Some((Some(branch), sha.clone()));
        sha
    }

    fn ancestors(&self, sha: &str) -> Result<HashSet<String>> {
        let mut seen = HashSet::new();
        let mut stack = vec![sha.to_string()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let commit = self.commits.get(&current).ok_or_else(|| {
                CalcVerError::repository(format!("Unknown commit: {}", current))
            })?;
            stack.extend(commit.parents.iter().cloned());
        }
        Ok(seen)
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn head(&self) -> Result<HeadInfo> {
        match &self.head {
            Some((branch, sha)) => Ok(HeadInfo {
                branch: branch.clone(),
                sha: sha.clone(),
            }),
            None => Err(CalcVerError::NoCommits),
        }
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        Ok(self.branches.keys().cloned().collect())
    }

    fn branch_tip(&self, name: &str) -> Result<Option<String>> {
        Ok(self.branches.get(name).cloned())
    }

    fn commits_from(&self, sha: &str) -> Result<Vec<CommitInfo>> {
        let reachable = self.ancestors(sha)?;
        let mut commits: Vec<CommitInfo> = reachable
            .into_iter()
            .map(|s| self.commits[&s].clone())
            .collect();
        // newest first; the mock clock is strictly increasing
        commits.sort_by(|a, b| {
            b.committer_date
                .cmp(&a.committer_date)
                .then_with(|| b.sha.cmp(&a.sha))
        });
        Ok(commits)
    }

    fn tags(&self) -> Result<Vec<TagInfo>> {
        Ok(self.tags.clone())
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        let from_a = self.ancestors(a)?;
        let from_b = self.ancestors(b)?;
        Ok(from_a
            .intersection(&from_b)
            .max_by_key(|sha| self.commits[*sha].committer_date)
            .cloned())
    }
}
