use crate::branches;
use crate::config::{BranchConfig, Config};
use crate::error::{CalcVerError, Result};
use crate::git::Repository;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag threaded through the calculation
///
/// Providers and history walks call [CancellationToken::check] at loop
/// heads; once cancelled, the calculation surfaces `Cancelled` and produces
/// no partial result.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation; observable from every clone of the token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Error out if cancellation has been requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(CalcVerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Immutable per-invocation snapshot
///
/// Built once, read-only afterwards; everything the pipeline needs to know
/// about the working copy short of the history itself.
#[derive(Debug, Clone)]
pub struct GitContext {
    /// Branch the version is calculated for
    pub current_branch: String,
    /// Sha of the commit being versioned
    pub current_commit: String,
    pub config: Config,
    /// Effective configuration for the current branch, `Inherit` folded away
    pub branch_config: BranchConfig,
    pub token: CancellationToken,
}

impl GitContext {
    /// Build the context: validate configuration, resolve HEAD (honoring the
    /// detached-HEAD branch override) and the effective branch config.
    pub fn build(
        repo: &dyn Repository,
        config: Config,
        branch_override: Option<&str>,
        token: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        let head = repo.head()?;
        let current_branch = match branch_override {
            Some(name) => name.to_string(),
            None => head.branch.clone().ok_or_else(|| {
                CalcVerError::branch(
                    "HEAD is detached; pass a branch name to calculate against",
                )
            })?,
        };

        let branch_config =
            branches::resolve_branch_config(&current_branch, &config, repo, &token)?;

        Ok(GitContext {
            current_branch,
            current_commit: head.sha,
            config,
            branch_config,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(CalcVerError::Cancelled)));
    }

    #[test]
    fn test_build_resolves_branch_config() {
        let mut repo = MockRepository::new();
        repo.commit("master", "one");

        let ctx = GitContext::build(
            &repo,
            Config::default(),
            None,
            CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(ctx.current_branch, "master");
        assert_eq!(ctx.branch_config.name, "main");
        assert!(ctx.branch_config.is_mainline);
    }

    #[test]
    fn test_detached_head_needs_override() {
        let mut repo = MockRepository::new();
        repo.commit("master", "one");
        repo.detach();

        let err = GitContext::build(
            &repo,
            Config::default(),
            None,
            CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CalcVerError::Branch(_)));

        let ctx = GitContext::build(
            &repo,
            Config::default(),
            Some("master"),
            CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(ctx.current_branch, "master");
    }

    #[test]
    fn test_empty_repository_is_no_commits() {
        let repo = MockRepository::new();
        let err = GitContext::build(
            &repo,
            Config::default(),
            None,
            CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CalcVerError::NoCommits));
    }
}
