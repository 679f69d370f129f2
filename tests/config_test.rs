//! Configuration parsing, overlay and validation

use git_calcver::config::{load_config, Config, IncrementStrategy, VersioningMode};
use std::io::Write;

#[test]
fn default_config_loads_when_no_file_exists() {
    let config = Config::default();
    assert!(config.next_version.is_none());
    assert_eq!(config.versioning_mode, VersioningMode::ContinuousDelivery);
    assert!(config.validate().is_ok());
}

#[test]
fn full_file_round_trips() {
    let text = r#"
        next-version = "2.0.0"
        tag-prefix = "release-"
        versioning-mode = "ContinuousDeployment"
        increment = "Patch"
        merge-message-formats = ["^Merging (?P<branch>\\S+)"]

        [branches.main]
        tag = "rc"

        [branches.custom]
        regex = "^custom/"
        tag = "useBranchName"
        increment = "Minor"
        source-branches = ["main"]

        [ignore]
        shas = ["deadbeef"]
        commits-before = 1500000000
    "#;

    let config: Config = toml::from_str(text).unwrap();
    assert!(config.validate().is_ok());

    assert_eq!(config.next_version.as_deref(), Some("2.0.0"));
    assert_eq!(config.tag_prefix.as_deref(), Some("release-"));
    assert_eq!(config.versioning_mode, VersioningMode::ContinuousDeployment);
    assert_eq!(config.increment, IncrementStrategy::Patch);
    assert_eq!(config.ignore.shas, vec!["deadbeef".to_string()]);
    assert_eq!(config.ignore.commits_before, Some(1_500_000_000));

    // the main entry keeps its built-in regex but takes the new tag
    let main = config.effective_branch("main").unwrap();
    assert_eq!(main.tag, "rc");
    assert_eq!(main.regex, "^master$|^main$");

    let custom = config.effective_branch("custom").unwrap();
    assert_eq!(custom.increment, IncrementStrategy::Minor);
    assert_eq!(custom.source_branches, vec!["main".to_string()]);
    // unset fields take the global defaults
    assert_eq!(custom.versioning_mode, VersioningMode::ContinuousDeployment);
}

#[test]
fn unknown_fields_are_rejected() {
    let text = r#"
        [branches.main]
        tga = "typo"
    "#;
    assert!(toml::from_str::<Config>(text).is_err());
}

#[test]
fn invalid_branch_regex_fails_validation() {
    let text = r#"
        [branches.broken]
        regex = "["
    "#;
    let config: Config = toml::from_str(text).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn malformed_next_version_fails_validation() {
    let text = r#"next-version = "1.2""#;
    let config: Config = toml::from_str(text).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn load_config_from_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "next-version = \"3.1.4\"").unwrap();

    let config = load_config(file.path().to_str()).unwrap();
    assert_eq!(config.next_version.as_deref(), Some("3.1.4"));
}

#[test]
fn load_config_missing_explicit_path_errors() {
    assert!(load_config(Some("/nonexistent/calcver.toml")).is_err());
}
