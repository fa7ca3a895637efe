use crate::error::{ExportError, Result};
use crate::exporter::{FlushOutcome, HttpExporter, SENT_AT_FORMAT};
use crate::scheduler::FlushScheduler;
use crate::transport::{ExportTransport, ReqwestTransport};
use crate::ExportConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

struct Post {
    url: String,
    headers: Vec<(String, String)>,
    body: Value,
}

#[derive(Default)]
struct FakeTransport {
    fail: bool,
    posts: Mutex<Vec<Post>>,
}

impl FakeTransport {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl ExportTransport for FakeTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: String,
        _timeout: Duration,
    ) -> Result<u16> {
        self.posts.lock().unwrap().push(Post {
            url: url.to_string(),
            headers: headers.to_vec(),
            body: serde_json::from_str(&body).unwrap(),
        });
        if self.fail {
            return Err(ExportError::Unreachable {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(200)
    }
}

fn config() -> ExportConfig {
    ExportConfig {
        url: Some("https://collector.example.com/ingest".to_string()),
        api_key: Some("k-123".to_string()),
        host: Some("web-01".to_string()),
        ..Default::default()
    }
}

fn exporter(transport: Arc<FakeTransport>) -> HttpExporter {
    HttpExporter::new(&config(), transport).expect("config should be valid")
}

// ── Buffer semantics ──

#[test]
fn record_same_name_keeps_only_latest_value() {
    let exporter = exporter(Arc::new(FakeTransport::default()));

    exporter.record("cpu", json!({"total": 10.0}));
    exporter.record("cpu", json!({"total": 42.0}));

    assert_eq!(exporter.buffered(), 1);
}

#[tokio::test]
async fn flush_sends_all_plugins_with_metadata_and_timestamp() {
    let transport = Arc::new(FakeTransport::default());
    let exporter = exporter(transport.clone());

    exporter.record("cpu", json!({"total": 12.5}));
    exporter.record("mem", json!({"percent": 40.0}));
    let outcome = exporter.flush().await;

    assert_eq!(outcome, FlushOutcome::Delivered { status: 200 });
    let posts = transport.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.url, "https://collector.example.com/ingest");
    assert_eq!(post.body["cpu"], json!({"total": 12.5}));
    assert_eq!(post.body["mem"], json!({"percent": 40.0}));
    assert_eq!(post.body["metadata"]["api-key"], json!("k-123"));
    assert_eq!(
        post.body["metadata"]["version"],
        json!(stratus_common::AGENT_VERSION)
    );
    let sent_at = post.body["sent_at"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(sent_at, SENT_AT_FORMAT).is_ok());
    assert_eq!(
        post.headers,
        vec![
            ("apikey".to_string(), "k-123".to_string()),
            ("host".to_string(), "web-01".to_string()),
        ]
    );
}

#[tokio::test]
async fn second_record_wins_in_payload() {
    let transport = Arc::new(FakeTransport::default());
    let exporter = exporter(transport.clone());

    exporter.record("load", json!({"min1": 0.5}));
    exporter.record("load", json!({"min1": 2.0}));
    exporter.flush().await;

    let posts = transport.posts.lock().unwrap();
    assert_eq!(posts[0].body["load"], json!({"min1": 2.0}));
}

#[tokio::test]
async fn failed_delivery_still_clears_the_batch() {
    let transport = Arc::new(FakeTransport::failing());
    let exporter = exporter(transport.clone());

    exporter.record("cpu", json!({"total": 1.0}));
    let outcome = exporter.flush().await;

    assert_eq!(outcome, FlushOutcome::Dropped);
    assert_eq!(exporter.buffered(), 0);

    // nothing is retried on the next flush
    assert_eq!(exporter.flush().await, FlushOutcome::Empty);
    assert_eq!(transport.post_count(), 1);
}

#[tokio::test]
async fn empty_buffer_sends_nothing() {
    let transport = Arc::new(FakeTransport::default());
    let exporter = exporter(transport.clone());

    assert_eq!(exporter.flush().await, FlushOutcome::Empty);
    assert_eq!(transport.post_count(), 0);
}

#[tokio::test]
async fn refused_connection_maps_to_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/ingest", listener.local_addr().unwrap());
    drop(listener);

    let err = ReqwestTransport::new()
        .post(&url, &[], "{}".to_string(), Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, ExportError::Unreachable { url: u, .. } if *u == url),
        "unexpected error: {err}"
    );
}

// ── Configuration ──

#[test]
fn missing_api_key_is_fatal() {
    let mut cfg = config();
    cfg.api_key = None;
    let err = HttpExporter::new(&cfg, Arc::new(FakeTransport::default()))
        .err()
        .expect("missing api key should be rejected");
    assert!(matches!(err, ExportError::MissingConfig("api_key")));
}

#[test]
fn blank_host_is_fatal() {
    let mut cfg = config();
    cfg.host = Some("   ".to_string());
    let err = HttpExporter::new(&cfg, Arc::new(FakeTransport::default()))
        .err()
        .expect("blank host should be rejected");
    assert!(matches!(err, ExportError::MissingConfig("host")));
}

#[test]
fn url_is_optional_in_dump_mode() {
    let mut cfg = config();
    cfg.url = None;
    assert!(HttpExporter::new(&cfg, Arc::new(FakeTransport::default())).is_err());

    cfg.dump_path = Some(std::env::temp_dir().join("stratus-dump.json"));
    assert!(HttpExporter::new(&cfg, Arc::new(FakeTransport::default())).is_ok());
}

#[test]
fn config_defaults_apply_when_deserializing() {
    let cfg: ExportConfig = serde_json::from_value(json!({
        "url": "http://localhost:8080/",
        "api_key": "abc",
        "host": "h"
    }))
    .expect("config should parse");

    assert_eq!(cfg.flush_interval_secs, 60);
    assert_eq!(cfg.timeout_secs, 5);
    assert!(cfg.dump_path.is_none());
}

// ── Offline dump mode ──

#[tokio::test]
async fn dump_mode_writes_file_instead_of_posting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let mut cfg = config();
    cfg.dump_path = Some(path.clone());
    let transport = Arc::new(FakeTransport::default());
    let exporter = HttpExporter::new(&cfg, transport.clone()).unwrap();

    exporter.record("version", json!({"version": "1.0"}));
    let outcome = exporter.flush().await;

    assert_eq!(outcome, FlushOutcome::Dumped(path.clone()));
    assert_eq!(transport.post_count(), 0);
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["version"]["version"], json!("1.0"));
    assert!(written.get("sent_at").is_some());
}

// ── Scheduler ──

#[tokio::test(start_paused = true)]
async fn scheduler_flushes_on_interval_and_on_stop() {
    let transport = Arc::new(FakeTransport::default());
    let exporter = Arc::new(exporter(transport.clone()));
    let (stop_tx, stop_rx) = watch::channel(false);

    let scheduler = FlushScheduler::new(Arc::clone(&exporter), Duration::from_secs(10));
    let task = tokio::spawn(async move { scheduler.run(stop_rx).await });

    exporter.record("cpu", json!({"total": 1.0}));
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(transport.post_count(), 1);

    exporter.record("cpu", json!({"total": 2.0}));
    stop_tx.send(true).unwrap();
    let outcome = task.await.unwrap();

    assert_eq!(outcome, FlushOutcome::Delivered { status: 200 });
    assert_eq!(transport.post_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn scheduler_returns_after_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.json");
    let mut cfg = config();
    cfg.dump_path = Some(path.clone());
    let exporter = Arc::new(HttpExporter::new(&cfg, Arc::new(FakeTransport::default())).unwrap());
    let (_stop_tx, stop_rx) = watch::channel(false);

    exporter.record("cpu", json!({"total": 1.0}));
    let scheduler = FlushScheduler::new(Arc::clone(&exporter), Duration::from_secs(5));
    let outcome = scheduler.run(stop_rx).await;

    assert_eq!(outcome, FlushOutcome::Dumped(path));
}
