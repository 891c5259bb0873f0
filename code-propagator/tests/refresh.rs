mod common;

use code_propagator::host::{RemoteHost, RepoName};
use code_propagator::{
    refresh_all, refresh_repo_config, Context, ConfigStore, CopyRule, IssueStatus, LockInfo,
    MemoryConfigStore, ProcessingResult, RefreshOutcome, TemplateRenderer,
};
use common::{write_file, FakeGit, FakeHost};
use tempfile::TempDir;

const DEST_URL: &str = "https://github.com/acme/speech.git";

fn repo() -> RepoName {
    RepoName::new("acme", "speech")
}

fn fixture(copy_config: &str) -> TempDir {
    let dest = TempDir::new().unwrap();
    write_file(dest.path(), ".github/propagation.yaml", copy_config);
    write_file(
        dest.path(),
        ".github/propagation.lock.yaml",
        "docker:\n  image: gcr.io/owlbot\n  digest: sha256:abc\n",
    );
    dest
}

#[tokio::test]
async fn records_declarative_files_then_no_ops() {
    let dest = fixture(
        "docker:\n  image: gcr.io/owlbot\ncopy-dirs:\n  - source: /google/cloud/speech\n    dest: src\n",
    );
    let mut git = FakeGit::new(vec![]);
    git.add_remote(DEST_URL, dest.path());
    let host = FakeHost::new();
    let store = MemoryConfigStore::new();
    let remote = RemoteHost::new("https://github.com/", None).unwrap();
    let renderer = TemplateRenderer::new();
    let ctx = Context {
        git: &git,
        host: &host,
        store: &store,
        remote: &remote,
        renderer: &renderer,
    };

    let first = refresh_repo_config(ctx, &repo(), Some(7)).await.unwrap();
    let second = refresh_repo_config(ctx, &repo(), None).await.unwrap();

    assert_eq!(
        first,
        RefreshOutcome::Recorded {
            commit_hash: "dest-head-1".to_string()
        }
    );
    assert_eq!(second, RefreshOutcome::Unchanged);

    let stored = store.get_config("acme/speech").await.unwrap().unwrap();
    assert_eq!(stored.copy_rules, vec![CopyRule::new("/google/cloud/speech", "src")]);
    assert_eq!(stored.post_processor(), Some("gcr.io/owlbot"));
    assert_eq!(stored.lock, Some(LockInfo::new("gcr.io/owlbot", "sha256:abc")));
    assert_eq!(stored.branch_name, "main");
    assert_eq!(stored.installation_id, 7);
}

#[tokio::test]
async fn invalid_rules_file_an_issue_and_record_nothing() {
    let dest = fixture("copy-dirs:\n  - source: \"\"\n");
    let mut git = FakeGit::new(vec![]);
    git.add_remote(DEST_URL, dest.path());
    let host = FakeHost::new();
    let store = MemoryConfigStore::new();
    let remote = RemoteHost::new("https://github.com/", None).unwrap();
    let renderer = TemplateRenderer::new();
    let ctx = Context {
        git: &git,
        host: &host,
        store: &store,
        remote: &remote,
        renderer: &renderer,
    };

    let first = refresh_repo_config(ctx, &repo(), None).await.unwrap();
    let second = refresh_repo_config(ctx, &repo(), None).await.unwrap();

    let RefreshOutcome::Defect {
        issue: IssueStatus::Created { number, .. },
    } = &first
    else {
        panic!("expected a new defect issue, got {first:?}");
    };
    assert_eq!(
        second,
        RefreshOutcome::Defect {
            issue: IssueStatus::Existing { number: *number }
        }
    );
    assert_eq!(host.issues("acme/speech").len(), 1);
    assert!(store.get_config("acme/speech").await.unwrap().is_none());
}

#[tokio::test]
async fn refresh_all_records_listed_repositories_independently() {
    let speech = fixture("copy-dirs:\n  - source: /google/cloud/speech\n    dest: src\n");
    let vision = TempDir::new().unwrap();
    write_file(vision.path(), "README.md", "# vision");
    let mut git = FakeGit::new(vec![]);
    git.add_remote(DEST_URL, speech.path());
    git.add_remote("https://github.com/acme/vision.git", vision.path());
    let host = FakeHost::new();
    for repo in ["acme/vision", "googleapis/googleapis-gen", "acme/speech", "acme/broken"] {
        host.add_repository(repo);
    }
    host.fail_repo("acme/broken");
    let store = MemoryConfigStore::new();
    let remote = RemoteHost::new("https://github.com/", None).unwrap();
    let renderer = TemplateRenderer::new();
    let ctx = Context {
        git: &git,
        host: &host,
        store: &store,
        remote: &remote,
        renderer: &renderer,
    };
    let source = RepoName::new("googleapis", "googleapis-gen");

    let results = refresh_all(ctx, &source, Some(9)).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(matches!(
        &results[0],
        ProcessingResult::Failed { repository, .. } if repository == "acme/broken"
    ));
    assert_eq!(
        results[1],
        ProcessingResult::Refreshed {
            repository: "acme/speech".to_string(),
            commit_hash: "dest-head-1".to_string(),
        }
    );
    assert!(matches!(
        &results[2],
        ProcessingResult::Skipped { repository, .. } if repository == "acme/vision"
    ));

    assert_eq!(host.issues("acme/vision").len(), 1);
    assert_eq!(
        store.get_config("acme/speech").await.unwrap().unwrap().installation_id,
        9
    );
    assert!(store.get_config("acme/vision").await.unwrap().is_none());
    assert!(!git
        .clones()
        .iter()
        .any(|(url, _)| url.contains("googleapis-gen")));
}
