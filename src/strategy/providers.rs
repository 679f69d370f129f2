//! The base-version source providers
//!
//! Five independent strategies, each proposing zero or more candidates from
//! one signal in the repository: configured next-version, reachable tags,
//! merge-commit messages, the branch name, and the guaranteed fallback.

use crate::branches;
use crate::context::GitContext;
use crate::domain::SemanticVersion;
use crate::error::Result;
use crate::git::Repository;
use crate::strategy::BaseVersionCandidate;
use regex::Regex;
use std::sync::OnceLock;

/// The provider set, dispatched through a single `propose` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseVersionStrategy {
    /// `next-version` from configuration; never increments
    ConfigNextVersion,
    /// SemVer tags reachable from the current commit
    TaggedCommit,
    /// Versions referenced by merge-commit messages
    MergeMessage,
    /// A SemVer-shaped substring in the current branch name
    BranchName,
    /// `0.0.0`, so at least one candidate always exists
    Fallback,
}

impl BaseVersionStrategy {
    pub const ALL: [BaseVersionStrategy; 5] = [
        BaseVersionStrategy::ConfigNextVersion,
        BaseVersionStrategy::TaggedCommit,
        BaseVersionStrategy::MergeMessage,
        BaseVersionStrategy::BranchName,
        BaseVersionStrategy::Fallback,
    ];

    /// Propose candidates from this strategy's signal
    pub fn propose(
        &self,
        ctx: &GitContext,
        repo: &dyn Repository,
    ) -> Result<Vec<BaseVersionCandidate>> {
        match self {
            BaseVersionStrategy::ConfigNextVersion => config_next_version(ctx),
            BaseVersionStrategy::TaggedCommit => tagged_commits(ctx, repo),
            BaseVersionStrategy::MergeMessage => merge_messages(ctx, repo),
            BaseVersionStrategy::BranchName => branch_name(ctx),
            BaseVersionStrategy::Fallback => Ok(vec![BaseVersionCandidate {
                source: "Fallback base version".to_string(),
                should_increment: true,
                sem_ver: SemanticVersion::new(0, 0, 0),
                base_version_source: None,
            }]),
        }
    }
}

fn config_next_version(ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
    Ok(match ctx.config.parsed_next_version()? {
        Some(version) => vec![BaseVersionCandidate {
            source: "NextVersion in configuration".to_string(),
            should_increment: false,
            sem_ver: version,
            base_version_source: None,
        }],
        None => Vec::new(),
    })
}

/// Parse a tag name as a version, honoring the configured tag prefix and
/// the conventional `v`
pub fn parse_tag_name(name: &str, tag_prefix: Option<&str>) -> Option<SemanticVersion> {
    let text = match tag_prefix {
        Some(prefix) => name.strip_prefix(prefix).unwrap_or(name),
        None => name,
    };
    SemanticVersion::parse(text).ok()
}

fn tagged_commits(ctx: &GitContext, repo: &dyn Repository) -> Result<Vec<BaseVersionCandidate>> {
    let mut candidates = Vec::new();
    let reachable = repo.commits_from(&ctx.current_commit)?;

    for tag in repo.tags()? {
        ctx.token.check()?;
        let Some(commit) = reachable.iter().find(|c| c.sha == tag.target) else {
            continue;
        };
        if ctx
            .config
            .ignore
            .is_ignored(&commit.sha, commit.committer_date)
        {
            continue;
        }
        let Some(version) = parse_tag_name(&tag.name, ctx.config.tag_prefix.as_deref()) else {
            continue;
        };

        candidates.push(BaseVersionCandidate {
            source: format!("Git tag '{}'", tag.name),
            // a tag on the commit being versioned names its exact version
            should_increment: tag.target != ctx.current_commit,
            sem_ver: version,
            base_version_source: Some(tag.target.clone()),
        });
    }

    Ok(candidates)
}

fn builtin_merge_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^Merge branch '(?P<branch>[^']+)'",
            r"^Merge remote-tracking branch '(?P<branch>[^']+)'",
            r"^Merge tag '(?P<branch>[^']+)'",
            r"^Merge pull request #\d+ (?:from|in) (?P<branch>\S+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("built-in merge pattern is valid"))
        .collect()
    })
}

fn semver_shaped() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z\-.]+)?").expect("semver pattern is valid")
    })
}

/// The version referenced by a merge message, with the merged ref name when
/// the message exposes one
fn version_in_merge_message(
    message: &str,
    extra_formats: &[String],
) -> Option<(SemanticVersion, Option<String>)> {
    let first_line = message.lines().next().unwrap_or("");

    for pattern in builtin_merge_patterns() {
        if let Some(captures) = pattern.captures(first_line) {
            let merged_ref = captures.name("branch")?.as_str().to_string();
            let version_text = semver_shaped().find(&merged_ref)?.as_str();
            let version = SemanticVersion::parse(version_text).ok()?;
            return Some((version, Some(merged_ref)));
        }
    }

    for pattern in extra_formats {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        let Some(captures) = re.captures(first_line) else {
            continue;
        };
        if let Some(version_text) = captures.name("version") {
            if let Ok(version) = SemanticVersion::parse(version_text.as_str()) {
                return Some((version, None));
            }
        }
        if let Some(merged_ref) = captures.name("branch") {
            let merged_ref = merged_ref.as_str().to_string();
            if let Some(found) = semver_shaped().find(&merged_ref) {
                if let Ok(version) = SemanticVersion::parse(found.as_str()) {
                    return Some((version, Some(merged_ref)));
                }
            }
        }
    }

    None
}

fn merge_messages(ctx: &GitContext, repo: &dyn Repository) -> Result<Vec<BaseVersionCandidate>> {
    let mut candidates = Vec::new();

    for commit in repo.commits_from(&ctx.current_commit)? {
        ctx.token.check()?;
        if !commit.is_merge()
            || ctx
                .config
                .ignore
                .is_ignored(&commit.sha, commit.committer_date)
        {
            continue;
        }
        let Some((version, merged_ref)) =
            version_in_merge_message(&commit.message, &ctx.config.merge_message_formats)
        else {
            continue;
        };

        // merging a release branch can pin its version instead of bumping it
        let merged_release = merged_ref
            .as_deref()
            .and_then(|name| branches::matching_entry_name(name, &ctx.config))
            .and_then(|entry| ctx.config.effective_branch(&entry))
            .map(|cfg| cfg.is_release_branch)
            .unwrap_or(false);
        let should_increment = !(merged_release
            && ctx
                .branch_config
                .prevent_increment_of_merged_branch_version);

        candidates.push(BaseVersionCandidate {
            source: format!(
                "Merge commit '{}'",
                commit.message.lines().next().unwrap_or("")
            ),
            should_increment,
            sem_ver: version,
            base_version_source: Some(commit.sha.clone()),
        });
    }

    Ok(candidates)
}

fn branch_name(ctx: &GitContext) -> Result<Vec<BaseVersionCandidate>> {
    let Some(found) = semver_shaped().find(&ctx.current_branch) else {
        return Ok(Vec::new());
    };
    let Ok(version) = SemanticVersion::parse(found.as_str()) else {
        return Ok(Vec::new());
    };

    Ok(vec![BaseVersionCandidate {
        source: format!("Version in branch name '{}'", ctx.current_branch),
        should_increment: false,
        sem_ver: version,
        base_version_source: None,
    }])
}
