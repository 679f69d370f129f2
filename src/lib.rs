//! Compute a SemVer 2.0.0 version for a working copy from its commit graph,
//! tags, branch topology and per-branch configuration.
//!
//! The calculation runs once per invocation over an immutable snapshot:
//! base-version providers propose candidates, the arbiter picks one, the
//! increment engine applies the branch- or directive-driven bump, and the
//! assembler attaches the pre-release tag and build metadata.

pub mod analyzer;
pub mod branches;
pub mod config;
pub mod context;
pub mod directives;
pub mod domain;
pub mod error;
pub mod git;
pub mod strategy;

pub use analyzer::{NextVersionCalculator, VersionCalculation};
pub use config::{Config, IncrementStrategy, VersioningMode};
pub use context::{CancellationToken, GitContext};
pub use domain::{BuildMetaData, PreReleaseTag, SemanticVersion};
pub use error::{CalcVerError, Result};

use git::Repository;

/// Calculate the version for a repository with a fresh cancellation token
pub fn calculate_version(
    repo: &dyn Repository,
    config: Config,
    branch_override: Option<&str>,
) -> Result<VersionCalculation> {
    calculate_version_with(repo, config, branch_override, CancellationToken::new())
}

/// Calculate the version for a repository, observing the given token
pub fn calculate_version_with(
    repo: &dyn Repository,
    config: Config,
    branch_override: Option<&str>,
    token: CancellationToken,
) -> Result<VersionCalculation> {
    let ctx = GitContext::build(repo, config, branch_override, token)?;
    NextVersionCalculator::new(repo, &ctx).calculate()
}
