use crate::domain::SemanticVersion;
use crate::error::{CalcVerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Which numeric component a branch bumps by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum IncrementStrategy {
    None,
    Patch,
    Minor,
    Major,
    /// Resolve through the branch this one was cut from
    Inherit,
}

/// How pre-release numbering and increments behave on a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum VersioningMode {
    /// Unique pre-release number per build; counters increase per label
    ContinuousDelivery,
    /// No pre-release number; the commit count lives in build metadata only
    ContinuousDeployment,
    /// Increments are finalized on the mainline branch
    Mainline,
}

/// Special `tag` value: use the branch name itself as the pre-release label
pub const TAG_USE_BRANCH_NAME: &str = "useBranchName";
/// Placeholder substituted with the sanitized branch name in `tag` templates
pub const TAG_BRANCH_NAME_PLACEHOLDER: &str = "{BranchName}";

/// A single `[branches.X]` entry as written in configuration
///
/// Every field is optional so user entries overlay the built-in entry of the
/// same name; anything still unset falls back at resolution time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BranchConfigEntry {
    pub regex: Option<String>,
    pub tag: Option<String>,
    pub increment: Option<IncrementStrategy>,
    pub versioning_mode: Option<VersioningMode>,
    pub prevent_increment_of_merged_branch_version: Option<bool>,
    pub track_merge_target: Option<bool>,
    pub source_branches: Option<Vec<String>>,
    pub is_release_branch: Option<bool>,
    pub is_mainline: Option<bool>,
}

/// Effective configuration for one branch after overlay and defaulting
///
/// `increment` may still be `Inherit` here; the resolver folds it against
/// the source branch before the calculation uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchConfig {
    pub name: String,
    pub regex: String,
    pub tag: String,
    pub increment: IncrementStrategy,
    pub versioning_mode: VersioningMode,
    pub prevent_increment_of_merged_branch_version: bool,
    pub track_merge_target: bool,
    pub source_branches: Vec<String>,
    pub is_release_branch: bool,
    pub is_mainline: bool,
}

/// Commits excluded from scanning and tag collection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IgnoreConfig {
    #[serde(default)]
    pub shas: Vec<String>,
    /// Unix seconds; commits dated strictly before this are ignored
    pub commits_before: Option<i64>,
}

impl IgnoreConfig {
    /// Whether a commit should be skipped by scanners and providers
    pub fn is_ignored(&self, sha: &str, committer_date: i64) -> bool {
        if self.shas.iter().any(|s| sha.starts_with(s.as_str())) {
            return true;
        }
        matches!(self.commits_before, Some(cutoff) if committer_date < cutoff)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Intended next version; proposed as a non-incrementing base
    pub next_version: Option<String>,
    /// Literal prefix stripped from tag names before SemVer parsing
    pub tag_prefix: Option<String>,
    /// Global default versioning mode
    pub versioning_mode: VersioningMode,
    /// Global default increment for branches that do not set one
    pub increment: IncrementStrategy,
    pub branches: BTreeMap<String, BranchConfigEntry>,
    pub ignore: IgnoreConfig,
    /// Extra merge-message regexes; each needs a `version` or `branch` group
    pub merge_message_formats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            next_version: None,
            tag_prefix: None,
            versioning_mode: VersioningMode::ContinuousDelivery,
            increment: IncrementStrategy::Inherit,
            branches: BTreeMap::new(),
            ignore: IgnoreConfig::default(),
            merge_message_formats: Vec::new(),
        }
    }
}

/// The built-in branch set: name, regex, tag, increment, mode overrides,
/// source branches, release/mainline flags.
fn builtin_branches() -> Vec<(&'static str, BranchConfigEntry)> {
    let entry = |regex: &str,
                 tag: &str,
                 increment: IncrementStrategy,
                 source_branches: &[&str],
                 is_release_branch: bool,
                 is_mainline: bool| {
        BranchConfigEntry {
            regex: Some(regex.to_string()),
            tag: Some(tag.to_string()),
            increment: Some(increment),
            versioning_mode: None,
            prevent_increment_of_merged_branch_version: Some(is_release_branch),
            track_merge_target: Some(false),
            source_branches: Some(source_branches.iter().map(|s| s.to_string()).collect()),
            is_release_branch: Some(is_release_branch),
            is_mainline: Some(is_mainline),
        }
    };

    vec![
        (
            "main",
            entry(
                "^master$|^main$",
                "",
                IncrementStrategy::Minor,
                &["develop", "release"],
                false,
                true,
            ),
        ),
        (
            "develop",
            BranchConfigEntry {
                versioning_mode: Some(VersioningMode::ContinuousDeployment),
                track_merge_target: Some(true),
                ..entry(
                    "^dev(elop)?(ment)?$",
                    "alpha",
                    IncrementStrategy::Minor,
                    &["main"],
                    false,
                    false,
                )
            },
        ),
        (
            "release",
            entry(
                "^releases?[/-]",
                "beta",
                IncrementStrategy::None,
                &["develop", "main", "support", "release"],
                true,
                false,
            ),
        ),
        (
            "feature",
            entry(
                "^features?[/-]",
                TAG_USE_BRANCH_NAME,
                IncrementStrategy::Inherit,
                &["develop", "main", "release", "feature", "support", "hotfix"],
                false,
                false,
            ),
        ),
        (
            "hotfix",
            entry(
                "^hotfix(es)?[/-]",
                "beta",
                IncrementStrategy::Patch,
                &["develop", "main", "support"],
                false,
                false,
            ),
        ),
        (
            "pull-request",
            entry(
                r"^(pull|pull\-requests|pr)[/-]",
                "PullRequest",
                IncrementStrategy::Inherit,
                &["develop", "main", "release", "feature", "support", "hotfix"],
                false,
                false,
            ),
        ),
        (
            "support",
            entry(
                "^support[/-]",
                "",
                IncrementStrategy::Patch,
                &["main"],
                false,
                true,
            ),
        ),
        (
            "unknown",
            entry(
                "",
                TAG_USE_BRANCH_NAME,
                IncrementStrategy::Inherit,
                &["main", "develop", "release", "feature", "support", "hotfix"],
                false,
                false,
            ),
        ),
    ]
}

impl Config {
    /// Every branch name known to this configuration: built-ins plus any
    /// user-defined entries.
    pub fn branch_names(&self) -> Vec<String> {
        let mut names: Vec<String> = builtin_branches()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        for name in self.branches.keys() {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// The effective config for a named branch entry: the user entry overlaid
    /// on the built-in entry of the same name, with global defaults filling
    /// whatever remains.
    pub fn effective_branch(&self, name: &str) -> Option<BranchConfig> {
        let builtin = builtin_branches()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, e)| e);
        let user = self.branches.get(name).cloned();

        if builtin.is_none() && user.is_none() {
            return None;
        }

        let base = builtin.unwrap_or_default();
        let over = user.unwrap_or_default();

        Some(BranchConfig {
            name: name.to_string(),
            regex: over.regex.or(base.regex).unwrap_or_default(),
            tag: over.tag.or(base.tag).unwrap_or_default(),
            increment: over
                .increment
                .or(base.increment)
                .unwrap_or(self.increment),
            versioning_mode: over
                .versioning_mode
                .or(base.versioning_mode)
                .unwrap_or(self.versioning_mode),
            prevent_increment_of_merged_branch_version: over
                .prevent_increment_of_merged_branch_version
                .or(base.prevent_increment_of_merged_branch_version)
                .unwrap_or(false),
            track_merge_target: over
                .track_merge_target
                .or(base.track_merge_target)
                .unwrap_or(false),
            source_branches: over
                .source_branches
                .or(base.source_branches)
                .unwrap_or_default(),
            is_release_branch: over
                .is_release_branch
                .or(base.is_release_branch)
                .unwrap_or(false),
            is_mainline: over.is_mainline.or(base.is_mainline).unwrap_or(false),
        })
    }

    /// The fallback configuration for branches no pattern matches
    pub fn unknown_branch(&self) -> BranchConfig {
        self.effective_branch("unknown")
            .expect("built-in unknown branch entry always exists")
    }

    /// Validate the configuration before any history traversal
    ///
    /// Compiles every regex, parses `next_version`, and rejects entries that
    /// claim to be both a release branch and the mainline.
    pub fn validate(&self) -> Result<()> {
        if let Some(next) = &self.next_version {
            SemanticVersion::parse(next).map_err(|e| {
                CalcVerError::configuration(format!("Malformed next-version '{}': {}", next, e))
            })?;
        }

        for name in self.branch_names() {
            let branch = self
                .effective_branch(&name)
                .expect("name came from branch_names");
            regex::Regex::new(&branch.regex).map_err(|e| {
                CalcVerError::configuration(format!(
                    "Invalid regex for branch '{}': {}",
                    name, e
                ))
            })?;
            if branch.is_release_branch && branch.is_mainline {
                return Err(CalcVerError::configuration(format!(
                    "Branch '{}' cannot be both a release branch and the mainline",
                    name
                )));
            }
        }

        for pattern in &self.merge_message_formats {
            let compiled = regex::Regex::new(pattern).map_err(|e| {
                CalcVerError::configuration(format!(
                    "Invalid merge-message format '{}': {}",
                    pattern, e
                ))
            })?;
            let names: Vec<_> = compiled.capture_names().flatten().collect();
            if !names.contains(&"version") && !names.contains(&"branch") {
                return Err(CalcVerError::configuration(format!(
                    "Merge-message format '{}' needs a 'version' or 'branch' group",
                    pattern
                )));
            }
        }

        Ok(())
    }

    /// The configured next version, parsed. `validate` has already rejected
    /// malformed values.
    pub fn parsed_next_version(&self) -> Result<Option<SemanticVersion>> {
        match &self.next_version {
            Some(text) => Ok(Some(SemanticVersion::parse(text)?)),
            None => Ok(None),
        }
    }
}

/// Load configuration from an explicit path, `./calcver.toml`, or the user
/// config directory, falling back to the built-in defaults.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./calcver.toml").exists() {
        fs::read_to_string("./calcver.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("calcver.toml");
        if path.exists() {
            fs::read_to_string(path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| CalcVerError::configuration(format!("Cannot parse configuration: {}", e)))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_builtin_main_branch() {
        let config = Config::default();
        let main = config.effective_branch("main").unwrap();
        assert_eq!(main.regex, "^master$|^main$");
        assert_eq!(main.tag, "");
        assert_eq!(main.increment, IncrementStrategy::Minor);
        assert!(main.is_mainline);
    }

    #[test]
    fn test_builtin_feature_branch_uses_branch_name() {
        let config = Config::default();
        let feature = config.effective_branch("feature").unwrap();
        assert_eq!(feature.tag, TAG_USE_BRANCH_NAME);
        assert_eq!(feature.increment, IncrementStrategy::Inherit);
    }

    #[test]
    fn test_user_entry_overlays_builtin() {
        let mut config = Config::default();
        config.branches.insert(
            "main".to_string(),
            BranchConfigEntry {
                tag: Some("rc".to_string()),
                ..Default::default()
            },
        );

        let main = config.effective_branch("main").unwrap();
        assert_eq!(main.tag, "rc");
        // untouched fields keep the built-in values
        assert_eq!(main.regex, "^master$|^main$");
        assert!(main.is_mainline);
    }

    #[test]
    fn test_user_defined_branch() {
        let mut config = Config::default();
        config.branches.insert(
            "custom".to_string(),
            BranchConfigEntry {
                regex: Some("custom/".to_string()),
                tag: Some(TAG_USE_BRANCH_NAME.to_string()),
                source_branches: Some(vec![]),
                ..Default::default()
            },
        );

        let custom = config.effective_branch("custom").unwrap();
        assert_eq!(custom.regex, "custom/");
        assert_eq!(custom.increment, IncrementStrategy::Inherit);
        assert!(custom.source_branches.is_empty());
    }

    #[test]
    fn test_invalid_regex_is_fatal() {
        let mut config = Config::default();
        config.branches.insert(
            "broken".to_string(),
            BranchConfigEntry {
                regex: Some("[".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(CalcVerError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_next_version_is_fatal() {
        let config = Config {
            next_version: Some("not-a-version".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_release_and_mainline_conflict() {
        let mut config = Config::default();
        config.branches.insert(
            "odd".to_string(),
            BranchConfigEntry {
                regex: Some("^odd$".to_string()),
                is_release_branch: Some(true),
                is_mainline: Some(true),
                ..Default::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_message_format_needs_group() {
        let config = Config {
            merge_message_formats: vec!["^Merging (.*)$".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            merge_message_formats: vec![r"^Merging (?P<branch>\S+)$".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ignore_by_sha_prefix() {
        let ignore = IgnoreConfig {
            shas: vec!["abc".to_string()],
            commits_before: None,
        };
        assert!(ignore.is_ignored("abc1234", 100));
        assert!(!ignore.is_ignored("def5678", 100));
    }

    #[test]
    fn test_ignore_by_date() {
        let ignore = IgnoreConfig {
            shas: vec![],
            commits_before: Some(1_000),
        };
        assert!(ignore.is_ignored("abc", 999));
        assert!(!ignore.is_ignored("abc", 1_000));
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            next-version = "1.0.0"
            tag-prefix = "v"

            [branches.custom]
            regex = "custom/"
            tag = "useBranchName"
            source-branches = []
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.next_version.as_deref(), Some("1.0.0"));
        assert_eq!(config.tag_prefix.as_deref(), Some("v"));
        assert!(config.branches.contains_key("custom"));
        assert!(config.validate().is_ok());
    }
}
