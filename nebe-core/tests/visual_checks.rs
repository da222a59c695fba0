use nebe_core::checks;
use nebe_core::contract::{MockDevstackApi, MockPrompter};
use nebe_core::git_status::GitStatus;
use nebe_core::model::{SchemaLogEntry, SchemaValidation};
use nebe_core::report::{self, Level, ReportEvent};
use nebe_core::visual::{self, SelectError, VisualId};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn visual_dir(root: &Path, brand: &str, repo: &str) -> std::path::PathBuf {
    let dir = root.join("src").join(brand).join(repo);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn visual_ids_parse_brand_and_repo() {
    let id: VisualId = "/acme/spring/".parse().unwrap();
    assert_eq!(id, VisualId::new("acme", "spring"));
    assert_eq!(id.to_string(), "acme/spring");
    assert_eq!(id.dir(Path::new("/r")), Path::new("/r/src/acme/spring"));

    for bad in ["acme", "acme/", "/spring", "a/b/c", ""] {
        assert!(bad.parse::<VisualId>().is_err(), "{bad:?} should be rejected");
    }
}

#[test]
fn size_folders_and_pdfs_follow_naming() {
    let root = tempdir().unwrap();
    let dir = visual_dir(root.path(), "acme", "spring");
    for size in ["300x250", "728x90", "_1x1", "include"] {
        fs::create_dir_all(dir.join(size)).unwrap();
        fs::write(dir.join(size).join("index.html"), "").unwrap();
    }
    fs::create_dir_all(dir.join("160x600")).unwrap();
    fs::write(dir.join("160x600/print.pdf"), "%PDF").unwrap();

    assert_eq!(visual::size_folders(&dir), vec!["300x250", "728x90"]);
    assert_eq!(visual::pdfs(&dir), vec![dir.join("160x600/print.pdf")]);
}

#[test]
fn listings_skip_dot_folders_and_files() {
    let root = tempdir().unwrap();
    visual_dir(root.path(), "acme", "b");
    visual_dir(root.path(), "acme", "a");
    visual_dir(root.path(), ".cache", "x");
    fs::write(root.path().join("src/acme/notes.txt"), "").unwrap();

    assert_eq!(visual::list_brands(root.path()).unwrap(), vec!["acme"]);
    assert_eq!(
        visual::all_visuals(root.path()).unwrap(),
        vec![VisualId::new("acme", "a"), VisualId::new("acme", "b")]
    );
}

#[test]
fn single_brand_is_chosen_without_asking() {
    let root = tempdir().unwrap();
    visual_dir(root.path(), "acme", "a1");
    visual_dir(root.path(), "acme", "a2");

    let mut prompter = MockPrompter::new();
    prompter
        .expect_select()
        .withf(|message, choices| {
            message == "Select visual" && choices.to_vec() == vec!["a2".to_string(), "a1".to_string()]
        })
        .times(1)
        .returning(|_, _| Ok(0));

    let chosen = visual::select_visual(root.path(), &prompter).unwrap();
    assert_eq!(chosen, VisualId::new("acme", "a2"), "newest visuals are offered first");
}

#[test]
fn selection_fails_without_brands() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("src")).unwrap();
    let prompter = MockPrompter::new();
    assert!(matches!(
        visual::select_visual(root.path(), &prompter),
        Err(SelectError::NoBrands(_))
    ));
}

#[test]
fn out_of_range_selection_is_an_error() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("src/acme/a1")).unwrap();
    fs::create_dir_all(root.path().join("src/globex/g1")).unwrap();

    let mut prompter = MockPrompter::new();
    prompter.expect_select().times(1).returning(|_, _| Ok(7));
    assert!(matches!(
        visual::select_visual(root.path(), &prompter),
        Err(SelectError::OutOfRange(7))
    ));

    let mut prompter = MockPrompter::new();
    let mut calls = 0;
    prompter.expect_select().times(2).returning(move |_, _| {
        calls += 1;
        Ok(if calls == 1 { 0 } else { 1 })
    });
    assert!(matches!(
        visual::select_visual(root.path(), &prompter),
        Err(SelectError::OutOfRange(1))
    ));
}

#[test]
fn copy_dir_copies_nested_files() {
    let from = tempdir().unwrap();
    let to = tempdir().unwrap();
    fs::create_dir_all(from.path().join("img/icons")).unwrap();
    fs::write(from.path().join("img/icons/a.svg"), "<svg/>").unwrap();
    fs::write(from.path().join("style.css"), "body{}").unwrap();

    let copied = visual::copy_dir(from.path(), &to.path().join("out")).unwrap();
    assert_eq!(copied, 2);
    assert_eq!(
        fs::read_to_string(to.path().join("out/img/icons/a.svg")).unwrap(),
        "<svg/>"
    );
    visual::remove_path(&to.path().join("out")).unwrap();
    visual::remove_path(&to.path().join("out")).expect("missing paths are fine");
}

#[test]
fn config_check_reports_errors_and_warnings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let missing = checks::check_config(&path);
    assert_eq!(missing.errors, vec!["config.json does not exist!"]);

    fs::write(&path, "[]").unwrap();
    assert_eq!(
        checks::check_config(&path).errors,
        vec!["File config.json is not valid JSON"]
    );

    fs::write(&path, r#"{"format": "gif", "name": " "}"#).unwrap();
    let check = checks::check_config(&path);
    assert_eq!(
        check.errors,
        vec!["Visual's format is not correct", "Visual's name is empty"]
    );
    assert_eq!(check.warnings, vec!["Visual's description is not defined"]);
    assert!(!check.is_ok());

    fs::write(&path, r#"{"format": "html", "name": "Spring", "description": "Banner"}"#).unwrap();
    let check = checks::check_config(&path);
    assert!(check.is_clean());
    assert_eq!(check.config.unwrap()["name"], "Spring");
}

#[tokio::test]
async fn schema_check_uses_remote_validator() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.json");
    fs::write(&path, r#"{"headline": {"type": "text"}}"#).unwrap();

    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_validate_schema()
        .withf(|schema| schema["headline"]["type"] == "text")
        .times(1)
        .returning(|_| {
            Ok(SchemaValidation {
                valid: false,
                log: vec![SchemaLogEntry {
                    message: "headline: missing label".into(),
                }],
            })
        });

    let check = checks::check_schema(&path, &devstack).await;
    assert!(!check.valid);
    assert_eq!(check.messages, vec!["headline: missing label"]);
    assert!(check.response.is_some());
}

#[tokio::test]
async fn schema_check_handles_local_and_remote_failures() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let mut devstack = MockDevstackApi::new();
    devstack
        .expect_validate_schema()
        .times(1)
        .returning(|_| Err("validator offline".into()));

    let missing = checks::check_schema(&path, &devstack).await;
    assert_eq!(missing.messages, vec!["schema.json does not exist!"]);

    fs::write(&path, "{nope").unwrap();
    let invalid = checks::check_schema(&path, &devstack).await;
    assert!(invalid.messages[0].starts_with("schema.json is not valid JSON"));

    fs::write(&path, "{}").unwrap();
    let offline = checks::check_schema(&path, &devstack).await;
    assert!(!offline.valid);
    assert_eq!(offline.messages, vec!["Schema validation failed: validator offline"]);
    assert_eq!(offline.schema, Some(json!({})));
}

#[test]
fn porcelain_status_is_parsed() {
    let status = GitStatus::parse_porcelain(
        "## master...origin/master [ahead 2, behind 1]\n M 300x250/index.html\n?? new.js\nR  old.css -> new.css\n",
    );
    assert_eq!(status.current.as_deref(), Some("master"));
    assert_eq!(status.tracking.as_deref(), Some("origin/master"));
    assert_eq!((status.ahead, status.behind), (2, 1));
    assert_eq!(status.files, vec!["300x250/index.html", "new.js", "new.css"]);
    assert!(status.is_on("master"));

    let fresh = GitStatus::parse_porcelain("## No commits yet on main\n");
    assert_eq!(fresh.current.as_deref(), Some("main"));
    assert!(fresh.is_clean());

    let detached = GitStatus::parse_porcelain("## HEAD (no branch)\n");
    assert_eq!(detached.current, None);
}

#[test]
fn configuration_report_redacts_credentials() {
    let env = vec![
        ("HOME".to_string(), "/home/jane".to_string()),
        ("NEBE_OAUTH_CLIENT_SECRET".to_string(), "s3cr3t".to_string()),
    ];
    let settings = json!({
        "root": "/work",
        "password": "pw",
        "tokenSazka": {"access_token": "x"},
        "lastSyncResponseData": {"brands": {}},
        "lastSyncResponseDataSazka": {"brands": {}},
    });

    let report = report::configuration_report(env, settings.as_object().unwrap());

    assert_eq!(report["env"]["HOME"], "/home/jane");
    assert_eq!(report["env"]["NEBE_OAUTH_CLIENT_SECRET"], "<redacted>");
    assert_eq!(report["config"]["root"], "/work");
    assert_eq!(report["config"]["password"], "<redacted>");
    assert_eq!(report["config"]["tokenSazka"], "<redacted>");
    assert_eq!(report["config"]["lastSyncResponseData"], "<skipped>");
    assert!(report["config"].get("lastSyncResponseDataSazka").is_none());
}

#[test]
fn error_events_capture_the_source_chain() {
    let inner = std::io::Error::other("disk full");
    let outer = nebe_core::settings::SettingsError::Write {
        path: "/c.json".into(),
        source: inner,
    };
    let event = ReportEvent::from_error(&outer)
        .with_environment("staging")
        .with_tag("command", "sync");

    assert_eq!(event.level, Level::Error);
    assert!(event.message.contains("/c.json"));
    assert_eq!(event.causes, vec!["disk full"]);
    assert_eq!(event.environment, "staging");
    assert_eq!(event.tags.get("command").map(String::as_str), Some("sync"));
    assert!(event.tags.contains_key("version"));
}
