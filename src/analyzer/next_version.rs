use crate::branches;
use crate::config::{IncrementStrategy, VersioningMode, TAG_BRANCH_NAME_PLACEHOLDER, TAG_USE_BRANCH_NAME};
use crate::context::GitContext;
use crate::directives::{self, Directive};
use crate::domain::{sanitize_label, BuildMetaData, PreReleaseTag, SemanticVersion};
use crate::error::Result;
use crate::git::{CommitInfo, Repository};
use crate::strategy::{self, BaseVersionCandidate};
use std::collections::{HashMap, HashSet};

/// The calculated version together with the base it was derived from
#[derive(Debug, Clone)]
pub struct VersionCalculation {
    pub version: SemanticVersion,
    pub base: BaseVersionCandidate,
}

/// Computes the next version for a context
///
/// Collects candidates from every provider, arbitrates, applies the
/// increment the branch configuration and commit directives call for, and
/// assembles the pre-release tag and build metadata.
pub struct NextVersionCalculator<'a> {
    repo: &'a dyn Repository,
    ctx: &'a GitContext,
}

impl<'a> NextVersionCalculator<'a> {
    pub fn new(repo: &'a dyn Repository, ctx: &'a GitContext) -> Self {
        NextVersionCalculator { repo, ctx }
    }

    pub fn calculate(&self) -> Result<VersionCalculation> {
        let candidates = strategy::collect_candidates(self.ctx, self.repo)?;
        let base = strategy::select_base_version(&candidates)?;

        let reachable = self.repo.commits_from(&self.ctx.current_commit)?;
        let metadata = self.build_metadata(&base, &reachable)?;

        // a pinning source on the commit being versioned is returned verbatim
        if !base.should_increment
            && base.base_version_source.as_deref() == Some(self.ctx.current_commit.as_str())
        {
            let version = base.sem_ver.clone().with_metadata(metadata);
            return Ok(VersionCalculation { version, base });
        }

        let since_base = commits_after(&reachable, base.base_version_source.as_deref());

        let version = match self.ctx.branch_config.versioning_mode {
            VersioningMode::Mainline => self.mainline_version(&base, &reachable, &since_base)?,
            mode => self.standard_version(&base, &reachable, &since_base, mode)?,
        };

        Ok(VersionCalculation {
            version: version.with_metadata(metadata),
            base,
        })
    }

    /// ContinuousDelivery / ContinuousDeployment assembly
    fn standard_version(
        &self,
        base: &BaseVersionCandidate,
        reachable: &[CommitInfo],
        since_base: &[CommitInfo],
        mode: VersioningMode,
    ) -> Result<SemanticVersion> {
        // a pre-release base is still on its way to that triple; the
        // counter advances instead of the numbers
        let continuing = base.sem_ver.pre_release.is_some();

        let mut next = base.sem_ver.triple();
        if base.should_increment && !continuing {
            if let Some(increment) = self.standard_severity(since_base) {
                next = apply_increment(&next, increment);
            }
        }

        let Some(label) = self.pre_release_label() else {
            return Ok(next);
        };

        let number = match mode {
            VersioningMode::ContinuousDelivery => {
                Some(self.delivery_number(&label, &next, reachable)?)
            }
            _ => None,
        };

        Ok(next.with_pre_release(PreReleaseTag::new(label, number)))
    }

    /// Mainline assembly: increments are finalized on the mainline branch,
    /// one bump per first-parent commit since the base source
    fn mainline_version(
        &self,
        base: &BaseVersionCandidate,
        reachable: &[CommitInfo],
        since_base: &[CommitInfo],
    ) -> Result<SemanticVersion> {
        let config = &self.ctx.branch_config;
        let mut next = base.sem_ver.triple();
        let bumpable = base.should_increment && base.sem_ver.pre_release.is_none();

        if config.is_mainline {
            if bumpable {
                for commit in self.first_parent_since(reachable, base.base_version_source.as_deref())
                {
                    self.ctx.token.check()?;
                    if self
                        .ctx
                        .config
                        .ignore
                        .is_ignored(&commit.sha, commit.committer_date)
                    {
                        continue;
                    }
                    let severity = match directives::scan_message(&commit.message) {
                        Some(Directive::None) => None,
                        Some(directive) => Some(directive_increment(directive)),
                        None => self.mainline_default_severity(),
                    };
                    if let Some(increment) = severity {
                        next = apply_increment(&next, increment);
                    }
                }
            }
            return Ok(next);
        }

        // off the mainline: a single bump, patch unless a directive says more
        if bumpable {
            let increment = match directives::scan_commits(since_base.iter(), &self.ctx.config.ignore)
            {
                Some(Directive::None) => None,
                Some(directive) => Some(directive_increment(directive)),
                None => Some(IncrementStrategy::Patch),
            };
            if let Some(increment) = increment {
                next = apply_increment(&next, increment);
            }
        }

        let Some(label) = self.pre_release_label() else {
            return Ok(next);
        };
        let number = self.commits_unique_to_branch(reachable)?.max(1);
        Ok(next.with_pre_release(PreReleaseTag::new(label, Some(number))))
    }

    /// Directive severity over the commits since the base, falling back to
    /// the branch's configured increment
    fn standard_severity(&self, since_base: &[CommitInfo]) -> Option<IncrementStrategy> {
        match directives::scan_commits(since_base.iter(), &self.ctx.config.ignore) {
            Some(Directive::None) => None,
            Some(directive) => Some(directive_increment(directive)),
            None => match self.ctx.branch_config.increment {
                IncrementStrategy::None => None,
                IncrementStrategy::Inherit => Some(IncrementStrategy::Minor),
                concrete => Some(concrete),
            },
        }
    }

    /// Default severity for a mainline commit without a directive: the
    /// globally configured increment, then the branch's, then Minor
    fn mainline_default_severity(&self) -> Option<IncrementStrategy> {
        match self.ctx.config.increment {
            IncrementStrategy::Major | IncrementStrategy::Minor | IncrementStrategy::Patch => {
                return Some(self.ctx.config.increment)
            }
            _ => {}
        }
        match self.ctx.branch_config.increment {
            IncrementStrategy::None => None,
            IncrementStrategy::Inherit => Some(IncrementStrategy::Minor),
            concrete => Some(concrete),
        }
    }

    /// The pre-release label for the current branch, `None` when the branch
    /// releases without one
    fn pre_release_label(&self) -> Option<String> {
        let config = &self.ctx.branch_config;
        if config.versioning_mode == VersioningMode::Mainline && config.is_mainline {
            return None;
        }
        if config.tag.is_empty() {
            return None;
        }

        let branch_label = || {
            sanitize_label(&branches::branch_name_for_label(
                &self.ctx.current_branch,
                config,
            ))
        };

        if config.tag == TAG_USE_BRANCH_NAME {
            Some(branch_label())
        } else if config.tag.contains(TAG_BRANCH_NAME_PLACEHOLDER) {
            Some(config.tag.replace(TAG_BRANCH_NAME_PLACEHOLDER, &branch_label()))
        } else {
            Some(config.tag.clone())
        }
    }

    /// ContinuousDelivery counter for a label: commits unique to the branch,
    /// floored at 1, and seeded by reachable tags carrying the same triple
    /// and label so the sequence continues instead of restarting
    fn delivery_number(
        &self,
        label: &str,
        next: &SemanticVersion,
        reachable: &[CommitInfo],
    ) -> Result<u32> {
        let mut number = self.commits_unique_to_branch(reachable)?.max(1);

        let reachable_shas: HashSet<&str> =
            reachable.iter().map(|c| c.sha.as_str()).collect();
        for tag in self.repo.tags()? {
            self.ctx.token.check()?;
            if !reachable_shas.contains(tag.target.as_str()) {
                continue;
            }
            let Some(version) =
                strategy::providers::parse_tag_name(&tag.name, self.ctx.config.tag_prefix.as_deref())
            else {
                continue;
            };
            let Some(pre) = &version.pre_release else {
                continue;
            };
            if pre.name != label || version.triple() != next.triple() {
                continue;
            }
            let since = self
                .repo
                .commits_since(&self.ctx.current_commit, Some(&tag.target))?;
            number = number.max(pre.number.unwrap_or(0) + since);
        }

        Ok(number)
    }

    /// Commits reachable from HEAD but from no other local branch tip
    fn commits_unique_to_branch(&self, reachable: &[CommitInfo]) -> Result<u32> {
        let mut hidden: HashSet<String> = HashSet::new();
        for branch in self.repo.local_branches()? {
            self.ctx.token.check()?;
            if branch == self.ctx.current_branch {
                continue;
            }
            let Some(tip) = self.repo.branch_tip(&branch)? else {
                continue;
            };
            for commit in self.repo.commits_from(&tip)? {
                hidden.insert(commit.sha);
            }
        }
        Ok(reachable
            .iter()
            .filter(|c| !hidden.contains(&c.sha))
            .count() as u32)
    }

    /// First-parent commits strictly after the anchor, oldest first. With no
    /// anchor the walk is anchored at the root commit.
    fn first_parent_since<'c>(
        &self,
        reachable: &'c [CommitInfo],
        anchor: Option<&str>,
    ) -> Vec<&'c CommitInfo> {
        let by_sha: HashMap<&str, &CommitInfo> =
            reachable.iter().map(|c| (c.sha.as_str(), c)).collect();

        let mut walk = Vec::new();
        let mut current = Some(self.ctx.current_commit.as_str());
        let mut found_anchor = false;

        while let Some(sha) = current {
            if Some(sha) == anchor {
                found_anchor = true;
                break;
            }
            let Some(commit) = by_sha.get(sha) else {
                break;
            };
            walk.push(*commit);
            current = commit.parents.first().map(|s| s.as_str());
        }

        if !found_anchor {
            // the root commit anchors the walk, it is not itself walked
            walk.pop();
        }
        walk.reverse();
        walk
    }

    fn build_metadata(
        &self,
        base: &BaseVersionCandidate,
        reachable: &[CommitInfo],
    ) -> Result<BuildMetaData> {
        let commits_since_tag = self
            .repo
            .commits_since(&self.ctx.current_commit, base.base_version_source.as_deref())?;
        let commit_date = reachable
            .iter()
            .find(|c| c.sha == self.ctx.current_commit)
            .map(|c| c.committer_date)
            .unwrap_or(0);

        Ok(BuildMetaData::new(
            commits_since_tag,
            self.ctx.current_branch.as_str(),
            self.ctx.current_commit.as_str(),
            commit_date,
        ))
    }
}

fn apply_increment(version: &SemanticVersion, increment: IncrementStrategy) -> SemanticVersion {
    match increment {
        IncrementStrategy::Major => version.increment_major(),
        IncrementStrategy::Minor => version.increment_minor(),
        IncrementStrategy::Patch => version.increment_patch(),
        _ => version.triple(),
    }
}

fn directive_increment(directive: Directive) -> IncrementStrategy {
    match directive {
        Directive::Major => IncrementStrategy::Major,
        Directive::Minor => IncrementStrategy::Minor,
        Directive::Patch => IncrementStrategy::Patch,
        Directive::None => IncrementStrategy::None,
    }
}

/// Commits reachable from HEAD but not from the anchor; all of them (minus
/// the root) when no anchor exists
fn commits_after(reachable: &[CommitInfo], anchor: Option<&str>) -> Vec<CommitInfo> {
    match anchor {
        Some(anchor) => {
            let hidden: HashSet<&str> = ancestors_of(reachable, anchor);
            reachable
                .iter()
                .filter(|c| !hidden.contains(c.sha.as_str()))
                .cloned()
                .collect()
        }
        None => {
            let mut commits: Vec<CommitInfo> = reachable.to_vec();
            // reachable is newest-first; the root is last
            commits.pop();
            commits
        }
    }
}

fn ancestors_of<'c>(reachable: &'c [CommitInfo], sha: &str) -> HashSet<&'c str> {
    let by_sha: HashMap<&str, &CommitInfo> =
        reachable.iter().map(|c| (c.sha.as_str(), c)).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![];
    if let Some(commit) = by_sha.get(sha) {
        stack.push(commit.sha.as_str());
    }
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(commit) = by_sha.get(current) {
            for parent in &commit.parents {
                stack.push(parent.as_str());
            }
        }
    }
    seen
}
