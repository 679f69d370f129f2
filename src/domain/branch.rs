use crate::config::Config;

/// Lifecycle class of a branch
///
/// A pure function of the branch name and the configured patterns; nothing
/// here looks at history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Mainline,
    Development,
    Feature,
    Release,
    Hotfix,
    PullRequest,
    Support,
    Unknown,
}

impl BranchKind {
    /// Classify a branch name against the configured branch patterns
    pub fn classify(name: &str, config: &Config) -> BranchKind {
        match crate::branches::matching_entry_name(name, config).as_deref() {
            Some("main") => BranchKind::Mainline,
            Some("develop") => BranchKind::Development,
            Some("feature") => BranchKind::Feature,
            Some("release") => BranchKind::Release,
            Some("hotfix") => BranchKind::Hotfix,
            Some("pull-request") => BranchKind::PullRequest,
            Some("support") => BranchKind::Support,
            Some(other) => {
                // User-defined entries classify by their flags
                match config.effective_branch(other) {
                    Some(b) if b.is_mainline => BranchKind::Mainline,
                    Some(b) if b.is_release_branch => BranchKind::Release,
                    _ => BranchKind::Unknown,
                }
            }
            None => BranchKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BranchConfigEntry, Config};

    #[test]
    fn test_classify_mainline() {
        let config = Config::default();
        assert_eq!(BranchKind::classify("master", &config), BranchKind::Mainline);
        assert_eq!(BranchKind::classify("main", &config), BranchKind::Mainline);
    }

    #[test]
    fn test_classify_develop() {
        let config = Config::default();
        assert_eq!(
            BranchKind::classify("develop", &config),
            BranchKind::Development
        );
        assert_eq!(BranchKind::classify("dev", &config), BranchKind::Development);
    }

    #[test]
    fn test_classify_feature_and_release() {
        let config = Config::default();
        assert_eq!(
            BranchKind::classify("feature/login", &config),
            BranchKind::Feature
        );
        assert_eq!(
            BranchKind::classify("release/1.2.0", &config),
            BranchKind::Release
        );
        assert_eq!(
            BranchKind::classify("hotfix/1.2.1", &config),
            BranchKind::Hotfix
        );
    }

    #[test]
    fn test_classify_unknown() {
        let config = Config::default();
        assert_eq!(
            BranchKind::classify("experiment", &config),
            BranchKind::Unknown
        );
    }

    #[test]
    fn test_classify_user_mainline_flag() {
        let mut config = Config::default();
        config.branches.insert(
            "trunk".to_string(),
            BranchConfigEntry {
                regex: Some("^trunk$".to_string()),
                is_mainline: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(BranchKind::classify("trunk", &config), BranchKind::Mainline);
    }
}
