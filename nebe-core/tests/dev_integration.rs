use nebe_core::contract::{BoxError, DevstackApi, MockDevstackApi, MockPrompter};
use nebe_core::dev::events::{self, Debouncer, FsAction, Tracker};
use nebe_core::dev::preview::DevWorkspace;
use nebe_core::dev::remote::{sha256_hex, RemoteSync};
use nebe_core::dev::session::{RemoteSession, SessionConfig, SessionError};
use nebe_core::dev::state::{DevState, PreviewState};
use nebe_core::dev::{self, DevError, Reaction, Start};
use nebe_core::environment::{Target, Tenant};
use nebe_core::markup;
use nebe_core::model::{Bundle, BundleStatus, Endpoint, Endpoints, NewBundle, SchemaValidation};
use nebe_core::settings::{self, Settings};
use nebe_core::visual::VisualId;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn root_with(visuals: &[&str]) -> TempDir {
    let root = tempdir().unwrap();
    for visual in visuals {
        fs::create_dir_all(root.path().join("src").join(visual)).unwrap();
    }
    root
}

fn settings_with(root: &TempDir, key: &str, value: &str) -> Settings {
    let mut settings =
        Settings::open(root.path().join("config.json"), Tenant::Default).unwrap();
    settings.set(key, value);
    settings
}

fn bundle(status: BundleStatus) -> Bundle {
    Bundle {
        id: "b-1".into(),
        status,
        endpoints: Endpoints::new(),
        preview_url: None,
        message: Some("bundler crashed".into()),
    }
}

fn endpoints() -> Endpoints {
    ["add", "change", "unlink", "delete"]
        .into_iter()
        .map(|name| {
            (
                name.to_string(),
                Endpoint {
                    url: format!("/fs/{name}"),
                    method: "POST".into(),
                },
            )
        })
        .collect()
}

fn fast_config(max_polls: u32) -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_millis(5),
        max_polls,
        teardown_timeout: Duration::from_secs(1),
    }
}

// -- visual choice ------------------------------------------------------

#[test]
fn latest_reuses_last_dev_without_asking() {
    let root = root_with(&["acme/spring", "acme/summer"]);
    let settings = settings_with(&root, settings::LAST_DEV, "acme/summer");
    let prompter = MockPrompter::new();

    let chosen = dev::choose_visual(root.path(), &settings, Start::Latest, &prompter).unwrap();
    assert_eq!(chosen, VisualId::new("acme", "summer"));
}

#[test]
fn ask_offers_last_dev_and_falls_back_to_selection() {
    let root = root_with(&["acme/spring", "acme/summer"]);
    let settings = settings_with(&root, settings::LAST_DEV, "acme/summer");

    let mut prompter = MockPrompter::new();
    prompter
        .expect_confirm()
        .withf(|message, default| message == "Use last visual? acme/summer" && *default)
        .times(1)
        .returning(|_, _| Ok(false));
    prompter
        .expect_select()
        .withf(|message, _| message == "Select visual")
        .times(1)
        .returning(|_, _| Ok(1));

    let chosen = dev::choose_visual(root.path(), &settings, Start::Ask, &prompter).unwrap();
    assert_eq!(chosen, VisualId::new("acme", "spring"));
}

#[test]
fn newest_uses_created_visual_or_asks() {
    let root = root_with(&["acme/spring"]);
    let settings = settings_with(&root, settings::NEWEST_VISUAL, "acme/autumn");
    let prompter = MockPrompter::new();
    let chosen = dev::choose_visual(root.path(), &settings, Start::Newest, &prompter).unwrap();
    assert_eq!(chosen, VisualId::new("acme", "autumn"));

    let settings = settings_with(&root, settings::LAST_DEV, "acme/spring");
    let mut prompter = MockPrompter::new();
    prompter.expect_confirm().times(1).returning(|_, _| Ok(true));
    let chosen = dev::choose_visual(root.path(), &settings, Start::Newest, &prompter).unwrap();
    assert_eq!(chosen, VisualId::new("acme", "spring"));
}

#[test]
fn removed_last_dev_is_not_offered() {
    let root = root_with(&["acme/spring"]);
    let settings = settings_with(&root, settings::LAST_DEV, "acme/gone");
    let mut prompter = MockPrompter::new();
    prompter.expect_confirm().never();
    prompter.expect_select().times(1).returning(|_, _| Ok(0));

    let chosen = dev::choose_visual(root.path(), &settings, Start::Latest, &prompter).unwrap();
    assert_eq!(chosen, VisualId::new("acme", "spring"));
}

#[test]
fn size_selection_requires_at_least_one_size() {
    let prompter = MockPrompter::new();
    assert!(matches!(dev::select_sizes(&[], &prompter), Err(DevError::NoSizes)));

    let sizes = vec!["300x250".to_string(), "728x90".to_string()];
    let mut prompter = MockPrompter::new();
    prompter
        .expect_multi_select()
        .withf(|_, _, defaults| defaults.to_vec() == vec![true, true])
        .returning(|_, _, _| Ok(vec![]));
    assert!(matches!(
        dev::select_sizes(&sizes, &prompter),
        Err(DevError::NoSizesSelected)
    ));

    let mut prompter = MockPrompter::new();
    prompter.expect_multi_select().returning(|_, _, _| Ok(vec![1]));
    assert_eq!(dev::select_sizes(&sizes, &prompter).unwrap(), vec!["728x90"]);
}

#[test]
fn changed_paths_map_to_reactions() {
    let sizes = vec!["300x250".to_string()];
    let cases = [
        ("schema.json", Reaction::Schema),
        ("config.json", Reaction::Config),
        ("include/img/logo.svg", Reaction::Include),
        ("300x250/main.js", Reaction::Size("300x250".into())),
        ("728x90/main.js", Reaction::None),
        ("README.md", Reaction::None),
    ];
    for (path, expected) in cases {
        assert_eq!(dev::reaction_for(Path::new(path), &sizes), expected, "{path}");
    }
}

// -- events -------------------------------------------------------------

#[test]
fn tracker_classifies_creation_change_and_removal() {
    let mut tracker = Tracker::default();
    let dir = Path::new("300x250");
    let file = Path::new("300x250/index.html");

    assert_eq!(tracker.observe(dir, Some(true)), Some(FsAction::Mkdir));
    assert_eq!(tracker.observe(dir, Some(true)), None, "known directories are ignored");
    assert_eq!(tracker.observe(file, Some(false)), Some(FsAction::Add));
    assert_eq!(tracker.observe(file, Some(false)), Some(FsAction::Change));
    assert_eq!(tracker.observe(dir, None), Some(FsAction::Delete));
    assert_eq!(tracker.observe(file, None), None, "children go with their directory");
    assert_eq!(tracker.observe(Path::new("ghost.js"), None), None);
}

#[test]
fn tracker_scan_skips_git_and_classify_reads_disk() {
    let base = tempdir().unwrap();
    fs::create_dir_all(base.path().join(".git/objects")).unwrap();
    fs::create_dir_all(base.path().join("300x250")).unwrap();
    fs::write(base.path().join("300x250/index.html"), "").unwrap();

    let mut tracker = Tracker::scan(base.path());
    let files: Vec<&PathBuf> = tracker.files().collect();
    assert_eq!(files, vec![&PathBuf::from("300x250/index.html")]);

    assert_eq!(
        tracker.classify(base.path(), Path::new("300x250/index.html")),
        Some(FsAction::Change)
    );
    fs::remove_file(base.path().join("300x250/index.html")).unwrap();
    assert_eq!(
        tracker.classify(base.path(), Path::new("300x250/index.html")),
        Some(FsAction::Unlink)
    );
    assert_eq!(tracker.classify(base.path(), Path::new(".git/HEAD")), None);
}

#[tokio::test]
async fn folder_moved_into_visual_sends_its_contents() {
    let base = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let copy = outside.path().join("300x600");
    fs::create_dir_all(copy.join("img")).unwrap();
    fs::create_dir_all(copy.join(".git")).unwrap();
    fs::write(copy.join("index.html"), "<main></main>").unwrap();
    fs::write(copy.join("img/logo.png"), "png").unwrap();
    fs::write(copy.join(".git/HEAD"), "ref").unwrap();

    let mut tracker = Tracker::scan(base.path());
    fs::rename(&copy, base.path().join("300x600")).unwrap();

    let actions = tracker.classify_all(base.path(), Path::new("300x600"));
    assert_eq!(
        actions,
        vec![
            (PathBuf::from("300x600"), FsAction::Mkdir),
            (PathBuf::from("300x600/img"), FsAction::Mkdir),
            (PathBuf::from("300x600/img/logo.png"), FsAction::Add),
            (PathBuf::from("300x600/index.html"), FsAction::Add),
        ]
    );
    assert_eq!(
        tracker.classify(base.path(), Path::new("300x600/index.html")),
        Some(FsAction::Change),
        "contents are tracked once the folder arrived"
    );

    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_call_endpoint()
        .withf(|endpoint, body| {
            endpoint.url == "/fs/add"
                && (body["path"] == "300x600/index.html" || body["path"] == "300x600/img/logo.png")
        })
        .times(2)
        .returning(|_, _| Ok(()));
    let sync = RemoteSync::new(Arc::new(devstack), endpoints(), base.path().to_path_buf());
    for (path, action) in &actions {
        sync.dispatch(path, *action);
    }
    sync.settle().await;
}

#[test]
fn classify_all_of_a_file_is_a_single_action() {
    let base = tempdir().unwrap();
    fs::write(base.path().join("config.json"), "{}").unwrap();
    let mut tracker = Tracker::default();
    assert_eq!(
        tracker.classify_all(base.path(), Path::new("config.json")),
        vec![(PathBuf::from("config.json"), FsAction::Add)]
    );
    assert!(tracker.classify_all(base.path(), Path::new("gone.js")).is_empty());
}

#[test]
fn posix_paths_and_ignored_paths() {
    assert_eq!(events::to_posix(Path::new("a/b/c.js")), "a/b/c.js");
    assert!(events::is_ignored(Path::new(".git/index")));
    assert!(!events::is_ignored(Path::new("src/.gitkeep")));
}

#[test]
fn debouncer_waits_for_quiet_period_per_path() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(Duration::from_millis(100));
    debouncer.push("a.js".into(), start);
    debouncer.push("b.js".into(), start + Duration::from_millis(50));
    debouncer.push("a.js".into(), start + Duration::from_millis(80));

    assert_eq!(debouncer.next_deadline(), Some(start + Duration::from_millis(150)));
    assert!(debouncer.due(start + Duration::from_millis(120)).is_empty());
    assert_eq!(
        debouncer.due(start + Duration::from_millis(160)),
        vec![PathBuf::from("b.js")]
    );
    assert_eq!(
        debouncer.due(start + Duration::from_millis(180)),
        vec![PathBuf::from("a.js")]
    );
    assert!(debouncer.is_empty());
}

#[tokio::test(start_paused = true)]
async fn debounce_task_collapses_bursts_and_flushes_on_close() {
    let (tx, raw) = mpsc::unbounded_channel();
    let mut changes = events::debounce(raw, Duration::from_millis(200));

    for _ in 0..5 {
        tx.send(PathBuf::from("index.html")).unwrap();
    }
    assert_eq!(changes.recv().await, Some(PathBuf::from("index.html")));

    tx.send(PathBuf::from("late.js")).unwrap();
    drop(tx);
    assert_eq!(changes.recv().await, Some(PathBuf::from("late.js")));
    assert_eq!(changes.recv().await, None);
}

// -- remote sync --------------------------------------------------------

#[tokio::test]
async fn upload_then_changes_skip_known_contents() {
    let base = tempdir().unwrap();
    fs::create_dir_all(base.path().join("300x250")).unwrap();
    fs::write(base.path().join("300x250/index.html"), "<main></main>").unwrap();
    fs::write(base.path().join("config.json"), "{}").unwrap();

    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_call_endpoint()
        .withf(|endpoint, body| {
            endpoint.url == "/fs/add" && body["hash"].as_str().map(str::len) == Some(64)
        })
        .times(2)
        .returning(|_, _| Ok(()));
    devstack
        .expect_call_endpoint()
        .withf(|endpoint, body| {
            endpoint.url == "/fs/change"
                && body["path"] == "300x250/index.html"
                && body["contents"] == "PG1haW4+Y2hhbmdlZDwvbWFpbj4="
        })
        .times(1)
        .returning(|_, _| Ok(()));
    devstack
        .expect_call_endpoint()
        .withf(|endpoint, body| {
            endpoint.url == "/fs/unlink" && body == &serde_json::json!({ "path": "config.json" })
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let devstack: Arc<dyn DevstackApi> = Arc::new(devstack);
    let sync = RemoteSync::new(devstack, endpoints(), base.path().to_path_buf());
    let tracker = Tracker::scan(base.path());

    let summary = sync.upload_all(tracker.files()).await;
    assert_eq!((summary.sent, summary.failed), (2, 0));

    // Same bytes as uploaded: nothing is sent.
    sync.dispatch(Path::new("config.json"), FsAction::Change);
    sync.settle().await;

    fs::write(base.path().join("300x250/index.html"), "<main>changed</main>").unwrap();
    sync.dispatch(Path::new("300x250/index.html"), FsAction::Change);
    sync.dispatch(Path::new("config.json"), FsAction::Unlink);
    sync.settle().await;
}

#[tokio::test]
async fn failed_calls_are_sent_again() {
    let base = tempdir().unwrap();
    fs::write(base.path().join("a.js"), "let a;").unwrap();

    let mut devstack = MockDevstackApi::new();
    let mut calls = 0;
    devstack
        .expect_call_endpoint()
        .times(2)
        .returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err("502".into())
            } else {
                Ok(())
            }
        });

    let sync = RemoteSync::new(Arc::new(devstack), endpoints(), base.path().to_path_buf());
    sync.dispatch(Path::new("a.js"), FsAction::Add);
    sync.settle().await;
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    sync.settle().await;
}

/// Records every applied body in order; bodies carrying `slow` contents
/// take 100 ms to land.
struct SlowDevstack {
    slow: &'static str,
    applied: std::sync::Mutex<Vec<serde_json::Value>>,
}

impl SlowDevstack {
    fn new(slow: &'static str) -> Arc<Self> {
        Arc::new(Self {
            slow,
            applied: Default::default(),
        })
    }

    fn applied(&self) -> Vec<serde_json::Value> {
        self.applied.lock().unwrap().clone()
    }

    fn contents(&self) -> Vec<String> {
        self.applied()
            .iter()
            .filter_map(|body| body["contents"].as_str().map(String::from))
            .collect()
    }
}

#[async_trait::async_trait]
impl DevstackApi for SlowDevstack {
    async fn create_bundle(&self, _: &NewBundle) -> Result<Bundle, BoxError> {
        Err("not used".into())
    }

    async fn bundle(&self, _: &str) -> Result<Bundle, BoxError> {
        Err("not used".into())
    }

    async fn delete_bundle(&self, _: &str) -> Result<(), BoxError> {
        Ok(())
    }

    async fn call_endpoint(
        &self,
        _: &Endpoint,
        body: &serde_json::Value,
    ) -> Result<(), BoxError> {
        if body["contents"] == self.slow {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.applied.lock().unwrap().push(body.clone());
        Ok(())
    }

    async fn validate_schema(&self, _: &serde_json::Value) -> Result<SchemaValidation, BoxError> {
        Err("not used".into())
    }
}

async fn let_call_start() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn newer_change_replaces_call_in_flight() {
    let base = tempdir().unwrap();
    let file = base.path().join("a.js");
    fs::write(&file, "A").unwrap();

    // "B" base64-encoded.
    let devstack = SlowDevstack::new("Qg==");
    let sync = RemoteSync::new(devstack.clone(), endpoints(), base.path().to_path_buf());
    sync.dispatch(Path::new("a.js"), FsAction::Add);
    sync.settle().await;

    fs::write(&file, "B").unwrap();
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    let_call_start().await;
    fs::write(&file, "C").unwrap();
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    sync.settle().await;
    assert_eq!(devstack.contents(), vec!["QQ==", "Qw=="], "the slow call never lands");

    // The stored hash is the one of "C": sending it again is skipped.
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    sync.settle().await;
    assert_eq!(devstack.applied().len(), 2);
}

#[tokio::test]
async fn reverted_edit_in_flight_is_sent_again() {
    let base = tempdir().unwrap();
    let file = base.path().join("a.js");
    fs::write(&file, "A").unwrap();

    let devstack = SlowDevstack::new("Qg==");
    let sync = RemoteSync::new(devstack.clone(), endpoints(), base.path().to_path_buf());
    sync.dispatch(Path::new("a.js"), FsAction::Add);
    sync.settle().await;

    fs::write(&file, "B").unwrap();
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    let_call_start().await;
    fs::write(&file, "A").unwrap();
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    sync.settle().await;

    assert_eq!(
        devstack.contents().last().map(String::as_str),
        Some("QQ=="),
        "remote ends with the contents on disk"
    );
    assert!(!devstack.contents().contains(&"Qg==".to_string()));

    let sent = devstack.applied().len();
    sync.dispatch(Path::new("a.js"), FsAction::Change);
    sync.settle().await;
    assert_eq!(devstack.applied().len(), sent);
}

#[tokio::test]
async fn deleted_folder_cancels_calls_below_it() {
    let base = tempdir().unwrap();
    fs::create_dir_all(base.path().join("300x600")).unwrap();
    fs::write(base.path().join("300x600/index.html"), "B").unwrap();

    let devstack = SlowDevstack::new("Qg==");
    let sync = RemoteSync::new(devstack.clone(), endpoints(), base.path().to_path_buf());
    sync.dispatch(Path::new("300x600/index.html"), FsAction::Add);
    let_call_start().await;
    fs::remove_dir_all(base.path().join("300x600")).unwrap();
    sync.dispatch(Path::new("300x600"), FsAction::Delete);
    sync.settle().await;

    assert_eq!(
        devstack.applied(),
        vec![serde_json::json!({ "path": "300x600" })]
    );
}

#[tokio::test]
async fn actions_without_endpoint_are_dropped() {
    let base = tempdir().unwrap();
    let mut devstack = MockDevstackApi::new();
    devstack.expect_call_endpoint().never();

    let sync = RemoteSync::new(Arc::new(devstack), Endpoints::new(), base.path().to_path_buf());
    sync.dispatch(Path::new("img"), FsAction::Mkdir);
    let summary = sync.upload_all(std::iter::empty()).await;
    assert_eq!(summary.sent, 0);
    sync.settle().await;
}

#[test]
fn sha256_is_lowercase_hex() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

// -- remote session -----------------------------------------------------

#[tokio::test]
async fn session_polls_until_ready_and_tears_down() {
    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_create_bundle()
        .withf(|request| request.sizes == vec!["300x250".to_string()])
        .times(1)
        .returning(|_| Ok(bundle(BundleStatus::Pending)));
    let mut polls = 0;
    devstack.expect_bundle().times(2).returning(move |id| {
        polls += 1;
        if polls < 2 {
            return Ok(bundle(BundleStatus::Pending));
        }
        Ok(Bundle {
            id: id.to_string(),
            endpoints: endpoints(),
            preview_url: Some("https://preview.example/b-1".into()),
            ..bundle(BundleStatus::Ready)
        })
    });
    devstack
        .expect_delete_bundle()
        .withf(|id| id == "b-1")
        .times(1)
        .returning(|_| Ok(()));

    let request = NewBundle {
        visual: "acme/spring".into(),
        sizes: vec!["300x250".into()],
    };
    let session = RemoteSession::start(Arc::new(devstack), &request, fast_config(10))
        .await
        .expect("bundle should become ready");

    assert_eq!(session.bundle().status, BundleStatus::Ready);
    assert_eq!(session.bundle().endpoints.len(), 4);
    session.teardown().await.expect("teardown should succeed");
}

#[tokio::test]
async fn failed_bundle_is_deleted() {
    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_create_bundle()
        .returning(|_| Ok(bundle(BundleStatus::Failed)));
    devstack.expect_delete_bundle().times(1).returning(|_| Ok(()));

    let request = NewBundle {
        visual: "acme/spring".into(),
        sizes: vec![],
    };
    let result = RemoteSession::start(Arc::new(devstack), &request, fast_config(10)).await;
    assert!(
        matches!(&result, Err(SessionError::Failed { message, .. }) if message == "bundler crashed")
    );
}

#[tokio::test]
async fn pending_bundle_times_out_and_is_deleted() {
    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_create_bundle()
        .returning(|_| Ok(bundle(BundleStatus::Pending)));
    devstack
        .expect_bundle()
        .times(2)
        .returning(|_| Ok(bundle(BundleStatus::Pending)));
    devstack
        .expect_delete_bundle()
        .times(1)
        .returning(|_| Err("already gone".into()));

    let request = NewBundle {
        visual: "acme/spring".into(),
        sizes: vec![],
    };
    let result = RemoteSession::start(Arc::new(devstack), &request, fast_config(2)).await;
    assert!(matches!(result, Err(SessionError::Timeout { polls: 2, .. })));
}

#[tokio::test]
async fn create_failure_is_reported() {
    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_create_bundle()
        .returning(|_| Err("401 Unauthorized".into()));
    devstack.expect_delete_bundle().never();

    let request = NewBundle {
        visual: "acme/spring".into(),
        sizes: vec![],
    };
    let result = RemoteSession::start(Arc::new(devstack), &request, fast_config(2)).await;
    assert!(matches!(result, Err(SessionError::Create(_))));
}

// -- preview workspace --------------------------------------------------

fn workspace_root() -> (TempDir, DevWorkspace) {
    let root = tempdir().unwrap();
    let visual = root.path().join("src/acme/spring");
    fs::create_dir_all(visual.join("300x250")).unwrap();
    fs::create_dir_all(visual.join("include")).unwrap();
    fs::write(
        visual.join("300x250/index.html"),
        "<html><head></head><body><main></main></body></html>",
    )
    .unwrap();
    fs::write(visual.join("include/font.woff"), "font").unwrap();
    fs::write(
        visual.join("config.json"),
        r#"{"name": "Spring", "format": "html", "description": "d"}"#,
    )
    .unwrap();
    fs::write(visual.join("schema.json"), r#"{"headline": {"value": "Sale"}}"#).unwrap();

    let workspace = DevWorkspace::new(
        root.path(),
        VisualId::new("acme", "spring"),
        &Target::default().urls(),
    );
    (root, workspace)
}

#[tokio::test]
async fn workspace_prepares_dist_and_builds_previews() {
    let (root, mut workspace) = workspace_root();
    fs::create_dir_all(root.path().join("dist/old")).unwrap();

    let check = workspace.prepare().unwrap();
    assert!(check.is_clean());
    assert!(!root.path().join("dist/old").exists());
    assert!(root.path().join("dist/config.json").exists());
    assert!(root.path().join("dist/include/font.woff").exists());

    let mut devstack = MockDevstackApi::new();
    devstack.expect_validate_schema().returning(|_| {
        Ok(SchemaValidation {
            valid: true,
            log: vec![],
        })
    });
    let schema = workspace.refresh_schema(&devstack).await;
    assert!(schema.valid);

    assert_eq!(workspace.sizes(), vec!["300x250"]);
    assert!(workspace.build_size("300x250").unwrap(), "markup has <main>");
    let built = fs::read_to_string(workspace.size_dir("300x250").join("index.html")).unwrap();
    assert!(markup::has_block(&built, markup::VISUAL_CLIENT));
    assert!(built.contains("Sale"), "demo fill follows the schema");
    assert!(built.contains(r#"document.title = "300x250 acme/spring""#));
}

#[test]
fn unusable_config_aborts_prepare() {
    let (root, workspace) = workspace_root();
    fs::write(root.path().join("src/acme/spring/config.json"), "{}").unwrap();

    match workspace.prepare() {
        Err(DevError::Config(errors)) => {
            assert!(errors.contains(&"Visual's format is not defined".to_string()))
        }
        other => panic!("expected config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn state_serializes_for_the_studio() {
    let mut state = DevState::new("acme/spring");
    state.folders = vec!["300x250".into()];
    state.bundlers.insert(
        0,
        PreviewState {
            folder: "300x250".into(),
            port: 1200,
            error: None,
        },
    );

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["visualPath"], "acme/spring");
    assert_eq!(json["bundlers"]["0"]["port"], 1200);
    assert!(json["gitStatus"].is_null());
}
