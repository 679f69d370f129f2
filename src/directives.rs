//! Commit-message version directives
//!
//! Commits can steer the increment with `+semver:` tokens anywhere in the
//! message: `+semver: major`, `+semver: minor`, `+semver: patch`,
//! `+semver: none`, plus the aliases `breaking`, `feature` and `fix`.

use crate::config::IgnoreConfig;
use crate::git::CommitInfo;
use regex::Regex;
use std::sync::OnceLock;

/// An explicit instruction parsed from a commit message
///
/// Ordered by severity so the highest directive across a set of commits can
/// be taken with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Directive {
    /// `+semver: none` - suppress the increment entirely
    None,
    Patch,
    Minor,
    Major,
}

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\+semver:\s*(major|minor|patch|none|breaking|feature|fix)")
            .expect("directive pattern is valid")
    })
}

/// Scan one message; the highest-severity token wins
pub fn scan_message(message: &str) -> Option<Directive> {
    directive_pattern()
        .captures_iter(message)
        .map(|c| match c[1].to_ascii_lowercase().as_str() {
            "major" | "breaking" => Directive::Major,
            "minor" | "feature" => Directive::Minor,
            "patch" | "fix" => Directive::Patch,
            _ => Directive::None,
        })
        .max()
}

/// Scan a set of commits, skipping ignored ones; the highest directive wins
pub fn scan_commits<'a>(
    commits: impl IntoIterator<Item = &'a CommitInfo>,
    ignore: &IgnoreConfig,
) -> Option<Directive> {
    commits
        .into_iter()
        .filter(|c| !ignore.is_ignored(&c.sha, c.committer_date))
        .filter_map(|c| scan_message(&c.message))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, message: &str) -> CommitInfo {
        CommitInfo {
            sha: sha.to_string(),
            message: message.to_string(),
            parents: vec![],
            committer_date: 1_000,
        }
    }

    #[test]
    fn test_scan_basic_tokens() {
        assert_eq!(scan_message("fix stuff +semver: major"), Some(Directive::Major));
        assert_eq!(scan_message("+semver:minor"), Some(Directive::Minor));
        assert_eq!(scan_message("+semver: patch done"), Some(Directive::Patch));
        assert_eq!(scan_message("docs +semver:none"), Some(Directive::None));
    }

    #[test]
    fn test_scan_is_case_insensitive() {
        assert_eq!(scan_message("+SemVer: MAJOR"), Some(Directive::Major));
    }

    #[test]
    fn test_scan_aliases() {
        assert_eq!(scan_message("+semver: breaking"), Some(Directive::Major));
        assert_eq!(scan_message("+semver: feature"), Some(Directive::Minor));
        assert_eq!(scan_message("+semver: fix"), Some(Directive::Patch));
    }

    #[test]
    fn test_scan_no_directive() {
        assert_eq!(scan_message("just a commit"), None);
        assert_eq!(scan_message("semver: major"), None);
    }

    #[test]
    fn test_highest_severity_wins_in_one_message() {
        assert_eq!(
            scan_message("+semver: patch then +semver: major"),
            Some(Directive::Major)
        );
        assert_eq!(
            scan_message("+semver: none and +semver: minor"),
            Some(Directive::Minor)
        );
    }

    #[test]
    fn test_token_in_message_body() {
        let message = "fix: align button\n\nLong description.\n+semver: minor";
        assert_eq!(scan_message(message), Some(Directive::Minor));
    }

    #[test]
    fn test_scan_commits_takes_highest() {
        let commits = vec![
            commit("c1", "one +semver: patch"),
            commit("c2", "two"),
            commit("c3", "three +semver: minor"),
        ];
        let found = scan_commits(commits.iter(), &IgnoreConfig::default());
        assert_eq!(found, Some(Directive::Minor));
    }

    #[test]
    fn test_scan_commits_skips_ignored() {
        let commits = vec![
            commit("c1", "one +semver: major"),
            commit("c2", "two +semver: patch"),
        ];
        let ignore = IgnoreConfig {
            shas: vec!["c1".to_string()],
            commits_before: None,
        };
        assert_eq!(scan_commits(commits.iter(), &ignore), Some(Directive::Patch));
    }

    #[test]
    fn test_none_directive_beats_no_directive() {
        let commits = vec![commit("c1", "chore +semver: none"), commit("c2", "docs")];
        assert_eq!(
            scan_commits(commits.iter(), &IgnoreConfig::default()),
            Some(Directive::None)
        );
    }
}
