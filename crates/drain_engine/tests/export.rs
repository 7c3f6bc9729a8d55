use std::fs;
use std::path::Path;

use drain_core::{Broadcast, Converter};
use drain_engine::{
    export_broadcasts, run, BroadcastOutcome, BroadcastSource, Configuration, ExportError,
    FailureKind, FetchError, Html2MdConverter, SkipReason, CONFIG_FILENAME,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fixed in-memory broadcast list.
struct StaticSource(Vec<Broadcast>);

#[async_trait::async_trait]
impl BroadcastSource for StaticSource {
    async fn broadcasts(&self, _status: &str) -> Result<Vec<Broadcast>, FetchError> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

#[async_trait::async_trait]
impl BroadcastSource for FailingSource {
    async fn broadcasts(&self, _status: &str) -> Result<Vec<Broadcast>, FetchError> {
        Err(FetchError {
            kind: FailureKind::HttpStatus(500),
            message: "boom".to_string(),
        })
    }
}

struct PlainConverter;

impl Converter for PlainConverter {
    fn to_markdown(&self, html: &str) -> String {
        html.to_string()
    }
}

fn config(base: &Path, extra: &str) -> Configuration {
    let yaml = format!("account_id: A\napi_key: K\ndirectory: out\nstatus: sent\n{extra}");
    Configuration::from_yaml(&yaml, base).unwrap()
}

fn spring_update() -> Broadcast {
    Broadcast::new("Spring Update", Some("2024-03-01"), "<b>Hi</b>")
}

#[tokio::test]
async fn spring_update_is_written_as_markdown() {
    drain_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");

    let summary = export_broadcasts(&cfg, &StaticSource(vec![spring_update()]), &Html2MdConverter)
        .await
        .unwrap();

    let target = temp.path().join("out").join("spring-update.md");
    assert_eq!(
        summary.outcomes,
        vec![BroadcastOutcome::Written {
            subject: "Spring Update".to_string(),
            path: target.clone(),
        }]
    );
    let content = fs::read_to_string(&target).unwrap();
    assert!(content.starts_with("---\ntitle: Spring Update\nlayout: newsletter\npublished: true\n"));
    assert!(content.contains("2024-03-01"));
    assert!(content.contains("---\n\n"));
    assert!(content.contains("**Hi**"));
}

#[tokio::test]
async fn second_run_without_overwrite_changes_nothing() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");
    let source = StaticSource(vec![spring_update()]);

    export_broadcasts(&cfg, &source, &PlainConverter).await.unwrap();
    let target = temp.path().join("out").join("spring-update.md");
    fs::write(&target, "edited by hand").unwrap();

    let summary = export_broadcasts(&cfg, &source, &PlainConverter).await.unwrap();

    assert_eq!(summary.written(), 0);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(
        summary.outcomes[0],
        BroadcastOutcome::Skipped {
            subject: "Spring Update".to_string(),
            reason: SkipReason::Exists(target.clone()),
        }
    );
    assert_eq!(fs::read_to_string(&target).unwrap(), "edited by hand");
}

#[tokio::test]
async fn overwrite_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "overwrite: true\n");
    let target = temp.path().join("out").join("spring-update.md");
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, "stale").unwrap();

    let summary = export_broadcasts(&cfg, &StaticSource(vec![spring_update()]), &PlainConverter)
        .await
        .unwrap();

    assert_eq!(summary.written(), 1);
    let content = fs::read_to_string(&target).unwrap();
    assert!(content.ends_with("---\n\n<b>Hi</b>"));
}

#[tokio::test]
async fn template_tail_never_reaches_the_file() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");
    let broadcast = Broadcast::new(
        "Raw",
        Some("2024-03-01"),
        "<p>Hello</p>{% raw %}ignored{% endraw %}",
    );

    export_broadcasts(&cfg, &StaticSource(vec![broadcast]), &PlainConverter)
        .await
        .unwrap();

    let content = fs::read_to_string(temp.path().join("out").join("raw.md")).unwrap();
    assert!(content.ends_with("\n\n<p>Hello</p>"));
}

#[tokio::test]
async fn empty_and_duplicate_slugs_are_skipped() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");
    let source = StaticSource(vec![
        Broadcast::new("Weekly", Some("2024-01-01"), "first"),
        Broadcast::new("?!", Some("2024-01-02"), "nothing usable"),
        Broadcast::new("weekly!", Some("2024-01-08"), "second"),
    ]);

    let summary = export_broadcasts(&cfg, &source, &PlainConverter).await.unwrap();

    let target = temp.path().join("out").join("weekly.md");
    assert_eq!(
        summary.outcomes,
        vec![
            BroadcastOutcome::Written {
                subject: "Weekly".to_string(),
                path: target.clone(),
            },
            BroadcastOutcome::Skipped {
                subject: "?!".to_string(),
                reason: SkipReason::EmptySlug,
            },
            BroadcastOutcome::Skipped {
                subject: "weekly!".to_string(),
                reason: SkipReason::DuplicateSlug(target.clone()),
            },
        ]
    );
    assert!(fs::read_to_string(&target).unwrap().ends_with("first"));
    assert!(!temp.path().join("out").join(".md").exists());
}

#[tokio::test]
async fn write_failure_does_not_stop_the_run() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");
    fs::create_dir_all(temp.path().join("out").join("blocked.md")).unwrap();
    let source = StaticSource(vec![
        Broadcast::new("Blocked", Some("2024-01-01"), "a"),
        Broadcast::new("Open", Some("2024-01-02"), "b"),
    ]);

    let summary = export_broadcasts(&cfg, &source, &PlainConverter).await.unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.written(), 1);
    assert!(matches!(
        &summary.outcomes[0],
        BroadcastOutcome::Failed { subject, .. } if subject == "Blocked"
    ));
    assert!(temp.path().join("out").join("open.md").is_file());
}

#[tokio::test]
async fn failed_write_does_not_claim_the_slug() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");
    fs::create_dir_all(temp.path().join("out").join("weekly.md")).unwrap();
    let source = StaticSource(vec![
        Broadcast::new("Weekly", Some("2024-01-01"), "first"),
        Broadcast::new("weekly!", Some("2024-01-08"), "second"),
    ]);

    let summary = export_broadcasts(&cfg, &source, &PlainConverter).await.unwrap();

    // Both broadcasts tried the blocked path; neither is reported as a duplicate.
    assert_eq!(summary.failed(), 2);
    assert_eq!(summary.skipped(), 0);
}

#[tokio::test]
async fn api_failure_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let cfg = config(temp.path(), "");

    let err = export_broadcasts(&cfg, &FailingSource, &PlainConverter)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::ApiFailure(_)));
    assert_eq!(err.to_string(), "API failure!");
    assert!(!temp.path().join("out").exists());
}

#[tokio::test]
async fn run_exports_from_drip_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/A/broadcasts"))
        .and(query_param("status", "sent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"broadcasts":[{"subject":"Spring Update","send_at":"2024-03-01","html_body":"<b>Hi</b>"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILENAME),
        format!(
            "account_id: A\napi_key: K\ndirectory: out\napi_url: {}/v2/\n",
            server.uri()
        ),
    )
    .unwrap();

    let summary = run(temp.path()).await.unwrap();

    assert_eq!(summary.written(), 1);
    assert!(temp.path().join("out").join("spring-update.md").is_file());
}

#[tokio::test]
async fn run_reports_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(CONFIG_FILENAME),
        format!(
            "account_id: A\napi_key: K\ndirectory: out\napi_url: {}/v2/\n",
            server.uri()
        ),
    )
    .unwrap();

    match run(temp.path()).await {
        Err(ExportError::ApiFailure(err)) => assert_eq!(err.kind, FailureKind::HttpStatus(500)),
        other => panic!("expected api failure, got {other:?}"),
    }
    assert!(!temp.path().join("out").exists());
}

#[tokio::test]
async fn missing_configuration_stops_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let err = run(temp.path()).await.unwrap_err();

    assert!(matches!(err, ExportError::MissingConfiguration(_)));
    assert_eq!(
        err.to_string(),
        "Cannot find your _drain.yml configuration file"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn incomplete_configuration_is_invalid() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILENAME), "account_id: A\n").unwrap();

    let err = run(temp.path()).await.unwrap_err();

    assert!(matches!(err, ExportError::InvalidConfiguration(_)));
}
