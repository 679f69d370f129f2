//! Branch-configuration resolution
//!
//! Maps the current branch name to its effective [BranchConfig]: regex
//! matching, most-specific-match selection, and folding of `Inherit` fields
//! through the branch this one was most likely cut from.

use crate::config::{BranchConfig, Config, IncrementStrategy};
use crate::context::CancellationToken;
use crate::error::Result;
use crate::git::Repository;
use regex::Regex;
use std::collections::HashSet;

/// The name of the configured branch entry matching a branch name, picking
/// the most specific regex (longest literal prefix); ties go to the earlier
/// entry. `None` when only the `unknown` fallback would match.
pub fn matching_entry_name(branch: &str, config: &Config) -> Option<String> {
    let mut best: Option<(usize, String)> = None;

    for name in config.branch_names() {
        if name == "unknown" {
            continue;
        }
        let Some(entry) = config.effective_branch(&name) else {
            continue;
        };
        if entry.regex.is_empty() {
            continue;
        }
        let Ok(re) = Regex::new(&entry.regex) else {
            // validate() rejects these before the calculation starts
            continue;
        };
        if re.is_match(branch) {
            let specificity = literal_prefix(&entry.regex).len();
            if best.as_ref().map_or(true, |(s, _)| specificity > *s) {
                best = Some((specificity, name));
            }
        }
    }

    best.map(|(_, name)| name)
}

/// Resolve the effective configuration for a branch, folding `Inherit`
/// against the source branch (the one with the newest merge-base).
pub fn resolve_branch_config(
    branch: &str,
    config: &Config,
    repo: &dyn Repository,
    token: &CancellationToken,
) -> Result<BranchConfig> {
    let mut resolved = match matching_entry_name(branch, config) {
        Some(name) => config
            .effective_branch(&name)
            .expect("matched entry exists"),
        None => config.unknown_branch(),
    };

    if resolved.increment == IncrementStrategy::Inherit {
        resolved.increment = resolve_inherited_increment(branch, &resolved, config, repo, token)?;
    }

    Ok(resolved)
}

/// Walk source branches until a concrete increment appears. Cycles and dead
/// ends fall back to the `unknown` entry; if that is itself `Inherit`, the
/// terminal default is `Minor`.
fn resolve_inherited_increment(
    branch: &str,
    start: &BranchConfig,
    config: &Config,
    repo: &dyn Repository,
    token: &CancellationToken,
) -> Result<IncrementStrategy> {
    let branch_tip = repo.branch_tip(branch)?;
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.name.clone());
    let mut current = start.clone();

    loop {
        token.check()?;

        let source = match &branch_tip {
            Some(tip) => newest_source_branch(branch, tip, &current, config, repo, token)?,
            None => None,
        };

        match source {
            Some(source_config) if !visited.contains(&source_config.name) => {
                if source_config.increment != IncrementStrategy::Inherit {
                    return Ok(source_config.increment);
                }
                visited.insert(source_config.name.clone());
                current = source_config;
            }
            _ => {
                let unknown = config.unknown_branch();
                if !visited.contains(&unknown.name)
                    && unknown.increment != IncrementStrategy::Inherit
                {
                    return Ok(unknown.increment);
                }
                return Ok(IncrementStrategy::Minor);
            }
        }
    }
}

/// Among the configured source branches, the one whose merge-base with the
/// current branch is newest; its effective config is returned.
fn newest_source_branch(
    branch: &str,
    branch_tip: &str,
    branch_config: &BranchConfig,
    config: &Config,
    repo: &dyn Repository,
    token: &CancellationToken,
) -> Result<Option<BranchConfig>> {
    let local = repo.local_branches()?;
    let mut best: Option<(i64, String)> = None;

    for entry_name in &branch_config.source_branches {
        token.check()?;
        let Some(entry) = config.effective_branch(entry_name) else {
            continue;
        };
        let Ok(re) = Regex::new(&entry.regex) else {
            continue;
        };

        for candidate in &local {
            if candidate == branch || !re.is_match(candidate) {
                continue;
            }
            let Some(tip) = repo.branch_tip(candidate)? else {
                continue;
            };
            let Some(base) = repo.merge_base(branch_tip, &tip)? else {
                continue;
            };
            let date = repo
                .commits_from(&base)?
                .first()
                .map(|c| c.committer_date)
                .unwrap_or(i64::MIN);
            if best.as_ref().map_or(true, |(d, _)| date > *d) {
                best = Some((date, entry_name.clone()));
            }
        }
    }

    Ok(match best {
        Some((_, entry_name)) => config.effective_branch(&entry_name),
        None => None,
    })
}

/// The branch name with the portion matched by its config regex removed,
/// for `useBranchName` and `{BranchName}` substitution. `custom/foo` under
/// regex `custom/` yields `foo`.
pub fn branch_name_for_label(branch: &str, branch_config: &BranchConfig) -> String {
    if branch_config.regex.is_empty() {
        return branch.to_string();
    }
    let Ok(re) = Regex::new(&branch_config.regex) else {
        return branch.to_string();
    };
    match re.find(branch) {
        Some(found) => {
            let stripped = format!("{}{}", &branch[..found.start()], &branch[found.end()..]);
            if stripped.is_empty() {
                branch.to_string()
            } else {
                stripped
            }
        }
        None => branch.to_string(),
    }
}

/// The literal prefix of a regex pattern: characters that must match
/// verbatim before the first metacharacter. Used as the specificity measure
/// when several branch patterns match.
fn literal_prefix(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars().peekable();

    if chars.peek() == Some(&'^') {
        chars.next();
    }

    while let Some(c) = chars.next() {
        let literal = match c {
            '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '$' | '^' => break,
            '\\' => match chars.next() {
                Some(esc) if !esc.is_ascii_alphanumeric() => esc,
                _ => break,
            },
            other => other,
        };
        // a quantifier makes the preceding character optional or repeated
        if matches!(chars.peek(), Some('*') | Some('+') | Some('?') | Some('{')) {
            break;
        }
        out.push(literal);
    }

    out
}
