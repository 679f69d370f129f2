//! Base-version candidates and their arbitration
//!
//! Each provider in [providers] proposes candidate base versions with
//! provenance; the arbiter reduces them to the single version the increment
//! engine starts from.

pub mod providers;

pub use providers::BaseVersionStrategy;

use crate::context::GitContext;
use crate::domain::SemanticVersion;
use crate::error::{CalcVerError, Result};
use crate::git::Repository;

/// One proposed base version with provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseVersionCandidate {
    /// Human-readable provenance, e.g. "Git tag 'v1.2.3'"
    pub source: String,
    /// Whether the increment engine may bump this version
    pub should_increment: bool,
    pub sem_ver: SemanticVersion,
    /// Anchor commit for counting; `None` means count from the repo root
    pub base_version_source: Option<String>,
}

/// Run every provider and collect all candidates
pub fn collect_candidates(
    ctx: &GitContext,
    repo: &dyn Repository,
) -> Result<Vec<BaseVersionCandidate>> {
    let mut candidates = Vec::new();
    for strategy in BaseVersionStrategy::ALL {
        ctx.token.check()?;
        candidates.extend(strategy.propose(ctx, repo)?);
    }
    Ok(candidates)
}

/// Reduce candidates to a single winner
///
/// The highest version by SemVer precedence wins. Within the winning group
/// a single `should_increment: false` vote suppresses incrementing - an
/// explicit "this is the version" assertion beats inferred bumping. The
/// anchor commit is the first non-null source in the group.
pub fn select_base_version(
    candidates: &[BaseVersionCandidate],
) -> Result<BaseVersionCandidate> {
    let highest = candidates
        .iter()
        .map(|c| &c.sem_ver)
        .max()
        .ok_or_else(|| {
            // providers always include the fallback; an empty set is a bug
            CalcVerError::ambiguous("no base version candidates were produced")
        })?
        .clone();

    let group: Vec<&BaseVersionCandidate> = candidates
        .iter()
        .filter(|c| c.sem_ver == highest)
        .collect();

    let should_increment = group.iter().all(|c| c.should_increment);
    let base_version_source = group
        .iter()
        .find_map(|c| c.base_version_source.clone());
    let provenance = group
        .iter()
        .find(|c| c.should_increment == should_increment)
        .unwrap_or(&group[0]);

    Ok(BaseVersionCandidate {
        source: provenance.source.clone(),
        should_increment,
        sem_ver: highest,
        base_version_source,
    })
}
