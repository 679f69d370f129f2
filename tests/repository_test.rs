//! Smoke tests for the git2-backed adapter against throwaway repositories

use git_calcver::config::Config;
use git_calcver::git::{Git2Repository, Repository};
use tempfile::TempDir;

/// Initialize a repository with a `master` branch and one commit per message
fn repo_with_commits(messages: &[&str]) -> (TempDir, git2::Repository) {
    let dir = TempDir::new().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let sig = git2::Signature::now("tester", "tester@example.com").unwrap();

    let mut last: Option<git2::Oid> = None;
    for message in messages {
        let tree_id = {
            let mut index = repo.index().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<git2::Commit> = last
            .into_iter()
            .map(|oid| repo.find_commit(oid).unwrap())
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
        last = Some(oid);
    }

    // pin the branch name so assertions are independent of init defaults;
    // detach first, a checked-out branch cannot be force-created
    let head_oid = last.unwrap();
    repo.set_head_detached(head_oid).unwrap();
    {
        let head = repo.find_commit(head_oid).unwrap();
        repo.branch("master", &head, true).unwrap();
    }
    repo.set_head("refs/heads/master").unwrap();

    (dir, repo)
}

#[test]
fn head_reports_branch_and_commit() {
    let (_dir, git) = repo_with_commits(&["one", "two"]);
    let adapter = Git2Repository::from_git2(git);

    let head = adapter.head().unwrap();
    assert_eq!(head.branch.as_deref(), Some("master"));
    assert_eq!(head.sha.len(), 40);
}

#[test]
fn commits_from_walks_newest_first() {
    let (_dir, git) = repo_with_commits(&["one", "two", "three"]);
    let adapter = Git2Repository::from_git2(git);

    let head = adapter.head().unwrap();
    let commits = adapter.commits_from(&head.sha).unwrap();
    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0].sha, head.sha);
    assert_eq!(commits[0].message.trim(), "three");
    assert_eq!(commits[2].message.trim(), "one");
    assert!(commits[2].parents.is_empty());
    assert_eq!(commits[0].parents.len(), 1);
}

#[test]
fn tags_are_peeled_to_commits() {
    let (_dir, git) = repo_with_commits(&["one"]);
    let head_oid = git.head().unwrap().target().unwrap();
    git.tag_lightweight("v0.1.0", &git.find_object(head_oid, None).unwrap(), false)
        .unwrap();

    let adapter = Git2Repository::from_git2(git);
    let tags = adapter.tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "v0.1.0");
    assert_eq!(tags[0].target, head_oid.to_string());
    assert_eq!(adapter.tags_on(&tags[0].target).unwrap(), vec!["v0.1.0"]);
}

#[test]
fn commits_since_counts_exclusively() {
    let (_dir, git) = repo_with_commits(&["one", "two", "three"]);
    let adapter = Git2Repository::from_git2(git);

    let head = adapter.head().unwrap();
    let commits = adapter.commits_from(&head.sha).unwrap();
    let root = &commits[2].sha;

    assert_eq!(adapter.commits_since(&head.sha, Some(root)).unwrap(), 2);
    assert_eq!(adapter.commits_since(&head.sha, None).unwrap(), 2);
}

#[test]
fn merge_base_of_linear_history_is_the_ancestor() {
    let (_dir, git) = repo_with_commits(&["one", "two"]);
    let adapter = Git2Repository::from_git2(git);

    let head = adapter.head().unwrap();
    let commits = adapter.commits_from(&head.sha).unwrap();
    let root = &commits[1].sha;

    assert_eq!(
        adapter.merge_base(&head.sha, root).unwrap().as_deref(),
        Some(root.as_str())
    );
}

#[test]
fn branch_tip_and_local_branches() {
    let (_dir, git) = repo_with_commits(&["one"]);
    let head_oid = git.head().unwrap().target().unwrap();
    let commit = git.find_commit(head_oid).unwrap();
    git.branch("feature/x", &commit, false).unwrap();
    drop(commit);

    let adapter = Git2Repository::from_git2(git);
    let branches = adapter.local_branches().unwrap();
    assert!(branches.contains(&"master".to_string()));
    assert!(branches.contains(&"feature/x".to_string()));

    assert_eq!(
        adapter.branch_tip("feature/x").unwrap().as_deref(),
        Some(head_oid.to_string().as_str())
    );
    assert!(adapter.branch_tip("missing").unwrap().is_none());
}

#[test]
fn end_to_end_version_for_a_real_repository() {
    let (_dir, git) = repo_with_commits(&["one", "two"]);
    let adapter = Git2Repository::from_git2(git);

    let result = git_calcver::calculate_version(&adapter, Config::default(), None).unwrap();
    assert_eq!(result.version.to_string(), "0.1.0+1");
    assert_eq!(result.base.source, "Fallback base version");
}
