use nebe_core::batch::{self, BatchError, GitOp, RowState};
use nebe_core::contract::{MockGit, MockPrompter};
use nebe_core::git_status::GitStatus;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn git_repo(root: &Path, brand: &str, repo: &str) {
    fs::create_dir_all(root.join("src").join(brand).join(repo).join(".git")).unwrap();
}

fn changed(files: &[&str]) -> GitStatus {
    GitStatus {
        current: Some("master".into()),
        files: files.iter().map(|f| f.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn fetch_runs_on_git_visuals_and_isolates_failures() {
    let root = tempdir().unwrap();
    git_repo(root.path(), "acme", "one");
    git_repo(root.path(), "acme", "two");
    fs::create_dir_all(root.path().join("src/acme/plain")).unwrap();

    let mut git = MockGit::new();
    git.expect_fetch().times(2).returning(|repo| {
        if repo.ends_with("two") {
            Err("remote hung up".into())
        } else {
            Ok(())
        }
    });

    let mut outcomes = batch::run_all(root.path(), &git, GitOp::Fetch).await.unwrap();
    outcomes.sort_by(|a, b| a.visual.cmp(&b.visual));

    assert_eq!(outcomes.len(), 2, "non-git folders are skipped");
    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[1].error.as_deref(), Some("remote hung up"));
}

#[tokio::test]
async fn pull_uses_pull() {
    let root = tempdir().unwrap();
    git_repo(root.path(), "acme", "one");

    let mut git = MockGit::new();
    git.expect_pull().times(1).returning(|_| Ok(()));
    git.expect_fetch().never();

    let outcomes = batch::run_all(root.path(), &git, GitOp::Pull).await.unwrap();
    assert!(outcomes.iter().all(|o| o.is_ok()));
}

#[tokio::test]
async fn push_offers_changed_visuals_and_pushes_selection() {
    let root = tempdir().unwrap();
    git_repo(root.path(), "acme", "clean");
    git_repo(root.path(), "acme", "edited");
    git_repo(root.path(), "acme", "skipped");

    let mut git = MockGit::new();
    git.expect_status().returning(|repo| {
        Ok(if repo.ends_with("clean") {
            GitStatus::default()
        } else {
            changed(&["300x250/index.html", "config.json"])
        })
    });
    git.expect_add_all()
        .withf(|repo| repo.ends_with("edited"))
        .times(1)
        .returning(|_| Ok(()));
    git.expect_commit()
        .withf(|repo, message| repo.ends_with("edited") && message == "Changes")
        .times(1)
        .returning(|_, _| Ok(()));
    git.expect_push()
        .withf(|_, remote, branch| remote == "origin" && branch == "master")
        .times(1)
        .returning(|_, _, _| Ok(()));

    let mut prompter = MockPrompter::new();
    prompter
        .expect_multi_select()
        .withf(|_, choices, defaults| {
            choices.to_vec()
                == vec![
                    "acme/edited (Changed 2 files)".to_string(),
                    "acme/skipped (Changed 2 files)".to_string(),
                ]
                && defaults.iter().all(|d| *d)
        })
        .times(1)
        .returning(|_, _, _| Ok(vec![0]));

    let outcomes = batch::push_changed(root.path(), &git, &prompter).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].visual.repo, "edited");
    assert!(outcomes[0].is_ok());
}

#[tokio::test]
async fn push_with_empty_selection_is_an_error() {
    let root = tempdir().unwrap();
    git_repo(root.path(), "acme", "edited");

    let mut git = MockGit::new();
    git.expect_status().returning(|_| Ok(changed(&["a.js"])));
    git.expect_push().never();
    let mut prompter = MockPrompter::new();
    prompter.expect_multi_select().returning(|_, _, _| Ok(vec![]));

    let result = batch::push_changed(root.path(), &git, &prompter).await;
    assert!(matches!(result, Err(BatchError::NothingSelected)));
}

#[tokio::test]
async fn push_without_changes_does_not_prompt() {
    let root = tempdir().unwrap();
    git_repo(root.path(), "acme", "clean");

    let mut git = MockGit::new();
    git.expect_status().returning(|_| Ok(GitStatus::default()));
    let mut prompter = MockPrompter::new();
    prompter.expect_multi_select().never();

    let outcomes = batch::push_changed(root.path(), &git, &prompter).await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn status_deletes_empty_folders_and_reports_changes() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("src/acme/empty")).unwrap();
    fs::create_dir_all(root.path().join("src/acme/plain")).unwrap();
    fs::write(root.path().join("src/acme/plain/index.html"), "<main></main>").unwrap();
    git_repo(root.path(), "acme", "feature");
    git_repo(root.path(), "acme", "tidy");

    let mut git = MockGit::new();
    git.expect_status().returning(|repo| {
        Ok(if repo.ends_with("tidy") {
            GitStatus::default()
        } else {
            GitStatus {
                current: Some("feature-x".into()),
                files: vec!["schema.json".into()],
                ..Default::default()
            }
        })
    });

    let rows = batch::status(root.path(), &git).await.unwrap();

    assert!(!root.path().join("src/acme/empty").exists());
    let state_of = |repo: &str| {
        rows.iter()
            .find(|r| r.visual.repo == repo)
            .map(|r| r.state.clone())
    };
    assert_eq!(state_of("empty"), Some(RowState::EmptyDeleted));
    assert_eq!(state_of("plain"), Some(RowState::NotGit));
    assert_eq!(
        state_of("feature"),
        Some(RowState::Changed(vec!["schema.json".into()]))
    );
    assert_eq!(state_of("tidy"), None, "clean visuals produce no row");

    let feature = rows.iter().find(|r| r.visual.repo == "feature").unwrap();
    assert!(feature.off_master());
    assert_eq!(
        feature.state.describe(),
        "Changed 1 files: schema.json"
    );
}

#[tokio::test]
async fn commit_all_uses_changed_files_as_message() {
    let root = tempdir().unwrap();
    git_repo(root.path(), "acme", "edited");

    let mut git = MockGit::new();
    git.expect_status()
        .returning(|_| Ok(changed(&["a.js", "b.css"])));
    git.expect_add_all().times(1).returning(|_| Ok(()));
    git.expect_commit()
        .withf(|_, message| message == "Changed files: a.js, b.css")
        .times(1)
        .returning(|_, _| Ok(()));
    git.expect_push().times(1).returning(|_, _, _| Ok(()));

    let rows = batch::commit_all(root.path(), &git).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].state,
        RowState::Changed(vec!["a.js".into(), "b.css".into()])
    );
}
