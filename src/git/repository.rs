use crate::error::{CalcVerError, Result};
use crate::git::{CommitInfo, HeadInfo, Repository, TagInfo};
use git2::{ErrorCode, Oid, Repository as Git2Repo, Sort};
use std::path::Path;

/// [Repository] implementation backed by libgit2
///
/// Opens a working copy by discovery (walking up from the given path until a
/// `.git` directory is found) and answers every query read-only; nothing
/// here mutates the repository.
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path).map_err(CalcVerError::Git)?;
        Ok(Git2Repository { repo })
    }

    /// Wrap an existing git2 repository handle
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn parse_oid(sha: &str) -> Result<Oid> {
        Oid::from_str(sha)
            .map_err(|e| CalcVerError::repository(format!("Invalid sha '{}': {}", sha, e)))
    }

    fn commit_info(&self, oid: Oid) -> Result<CommitInfo> {
        let commit = self.repo.find_commit(oid).map_err(CalcVerError::Git)?;
        Ok(CommitInfo {
            sha: oid.to_string(),
            message: commit.message().unwrap_or("").to_string(),
            parents: commit.parent_ids().map(|p| p.to_string()).collect(),
            committer_date: commit.time().seconds(),
        })
    }
}

impl Repository for Git2Repository {
    fn head(&self) -> Result<HeadInfo> {
        let head = match self.repo.head() {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Err(CalcVerError::NoCommits);
            }
            Err(e) => return Err(CalcVerError::Git(e)),
        };

        let sha = head
            .target()
            .ok_or_else(|| CalcVerError::repository("HEAD has no target"))?
            .to_string();

        let branch = if head.is_branch() {
            head.shorthand().map(|s| s.to_string())
        } else {
            None
        };

        Ok(HeadInfo { branch, sha })
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(CalcVerError::Git)?
        {
            let (branch, _) = entry.map_err(CalcVerError::Git)?;
            if let Some(name) = branch.name().map_err(CalcVerError::Git)? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn branch_tip(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_branch(name, git2::BranchType::Local) {
            Ok(branch) => Ok(branch.get().target().map(|oid| oid.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(CalcVerError::Git(e)),
        }
    }

    fn commits_from(&self, sha: &str) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk().map_err(CalcVerError::Git)?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .map_err(CalcVerError::Git)?;
        revwalk
            .push(Self::parse_oid(sha)?)
            .map_err(CalcVerError::Git)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(CalcVerError::Git)?;
            commits.push(self.commit_info(oid)?);
        }
        Ok(commits)
    }

    fn tags(&self) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();
        let names = self.repo.tag_names(None).map_err(CalcVerError::Git)?;
        for name in names.iter().flatten() {
            let reference = match self.repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(r) => r,
                Err(e) if e.code() == ErrorCode::NotFound => continue,
                Err(e) => return Err(CalcVerError::Git(e)),
            };
            // peel through annotated tag objects to the commit
            let target = reference
                .peel_to_commit()
                .map_err(CalcVerError::Git)?
                .id()
                .to_string();
            tags.push(TagInfo {
                name: name.to_string(),
                target,
            });
        }
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Option<String>> {
        match self
            .repo
            .merge_base(Self::parse_oid(a)?, Self::parse_oid(b)?)
        {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(CalcVerError::Git(e)),
        }
    }
}
