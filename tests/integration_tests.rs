//! Integration tests for the log pipeline
//!
//! These tests verify:
//! - Records fan out to console, file, custom writers and the broker
//! - Broker records are zerolog-style JSON lines
//! - Broker outages are reported through the other sinks and retried
//! - A full buffer drops records without failing the caller
//! - on_stop returns promptly even while a publish is in flight
//! - A supplied logger keeps its level but loses its old sinks

use async_trait::async_trait;
use log_fanout::broker::{BrokerSession, Publication, ResolvedBrokerConfig};
use log_fanout::prelude::*;
use log_fanout::BrokerConnector;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct BrokerState {
    published: Mutex<Vec<(String, String, Vec<u8>)>>,
    connects: AtomicUsize,
    publishing: AtomicUsize,
    refuse_connections: AtomicBool,
    publish_delay: Mutex<Option<Duration>>,
}

impl BrokerState {
    fn messages(&self) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .map(|(_, _, body)| {
                let value: serde_json::Value = serde_json::from_slice(body).unwrap();
                value["message"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }
}

struct TestConnector(Arc<BrokerState>);

struct TestSession(Arc<BrokerState>);

#[async_trait]
impl BrokerConnector for TestConnector {
    async fn connect(&self, config: &ResolvedBrokerConfig) -> Result<Box<dyn BrokerSession>> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        if self.0.refuse_connections.load(Ordering::SeqCst) {
            return Err(LoggerError::connection(config.endpoint(), "connection refused"));
        }
        Ok(Box::new(TestSession(Arc::clone(&self.0))))
    }
}

#[async_trait]
impl BrokerSession for TestSession {
    async fn publish(&mut self, publication: Publication<'_>) -> Result<()> {
        self.0.publishing.fetch_add(1, Ordering::SeqCst);
        let delay = *self.0.publish_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.0.published.lock().push((
            publication.routing_key.to_string(),
            publication.content_type.to_string(),
            publication.body.to_vec(),
        ));
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<serde_json::Value> {
        let data = self.0.lock();
        String::from_utf8_lossy(&data)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn broker_config() -> BrokerConfig {
    BrokerConfig::new("guest", "guest", "broker.test", "5672")
        .queue("app-logs")
        .retry_delay(Duration::from_millis(20))
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[tokio::test]
async fn test_records_are_forwarded_as_json_lines() {
    let state = Arc::new(BrokerState::default());
    let pipeline = LogPipeline::with_connector(
        PipelineConfig::new().broker(broker_config()),
        CancellationToken::new(),
        Arc::new(TestConnector(Arc::clone(&state))),
    )
    .unwrap();

    pipeline.on_start().await.unwrap();
    let logger = pipeline.logger();
    logger.log_with_fields(
        LogLevel::Warn,
        "disk almost full",
        Fields::new().with("mount", "/var").with("used_pct", 93),
    );

    assert!(wait_until(|| state.published.lock().len() == 2).await);
    pipeline.on_stop().await.unwrap();

    assert_eq!(
        state.messages(),
        vec![log_fanout::pipeline::START_BANNER, "disk almost full"]
    );

    let published = state.published.lock();
    let (routing_key, content_type, body) = &published[1];
    assert_eq!(routing_key, "app-logs");
    assert_eq!(content_type, "application/json");
    assert_eq!(body.last(), Some(&b'\n'));

    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    assert_eq!(value["level"], "warn");
    assert_eq!(value["mount"], "/var");
    assert_eq!(value["used_pct"], 93);
    assert!(value["time"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_broker_outage_is_reported_through_other_sinks() {
    let state = Arc::new(BrokerState::default());
    state.refuse_connections.store(true, Ordering::SeqCst);
    let out = SharedBuf::default();

    let pipeline = LogPipeline::with_connector(
        PipelineConfig::new()
            .broker(broker_config())
            .custom_writer(Box::new(out.clone())),
        CancellationToken::new(),
        Arc::new(TestConnector(Arc::clone(&state))),
    )
    .unwrap();

    pipeline.on_start().await.unwrap();
    assert!(wait_until(|| state.connects.load(Ordering::SeqCst) >= 3).await);

    state.refuse_connections.store(false, Ordering::SeqCst);
    assert!(wait_until(|| !state.published.lock().is_empty()).await);
    pipeline.on_stop().await.unwrap();

    let failures: Vec<serde_json::Value> = out
        .lines()
        .into_iter()
        .filter(|line| line["message"] == "broker log forwarding failed")
        .collect();
    assert!(failures.len() >= 2);
    assert_eq!(failures[0]["level"], "error");
    assert_eq!(failures[0]["endpoint"], "broker.test:5672");
    assert!(failures[0]["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    // Only the banner reaches the broker, never the failure reports
    let messages = state.messages();
    assert!(messages
        .iter()
        .all(|m| m != "broker log forwarding failed"));
    assert_eq!(messages[0], log_fanout::pipeline::START_BANNER);
}

#[tokio::test]
async fn test_stop_returns_during_slow_publish() {
    let state = Arc::new(BrokerState::default());
    *state.publish_delay.lock() = Some(Duration::from_secs(30));

    let pipeline = LogPipeline::with_connector(
        PipelineConfig::new().broker(broker_config().publish_timeout(Duration::from_secs(60))),
        CancellationToken::new(),
        Arc::new(TestConnector(Arc::clone(&state))),
    )
    .unwrap();

    pipeline.on_start().await.unwrap();
    assert!(wait_until(|| state.publishing.load(Ordering::SeqCst) == 1).await);

    tokio::time::timeout(Duration::from_secs(1), pipeline.on_stop())
        .await
        .expect("on_stop must not wait for the publish to finish")
        .unwrap();
    assert!(!pipeline.is_forwarding());
    assert!(state.published.lock().is_empty());
}

#[tokio::test]
async fn test_full_buffer_drops_without_failing_callers() {
    let out = SharedBuf::default();
    let pipeline = LogPipeline::with_connector(
        PipelineConfig::new()
            .broker(broker_config().buffer_capacity(2))
            .custom_writer(Box::new(out.clone())),
        CancellationToken::new(),
        Arc::new(TestConnector(Arc::new(BrokerState::default()))),
    )
    .unwrap();

    // Not started: nothing drains the buffer
    let logger = pipeline.logger();
    for i in 0..5 {
        log_fanout::info!(logger, "record {}", i);
    }

    assert_eq!(out.lines().len(), 5);
    let buffer = pipeline.buffer().unwrap();
    assert_eq!(buffer.len(), 2);
    assert_eq!(pipeline.metrics().enqueued_count(), 2);
    assert_eq!(pipeline.metrics().dropped_count(), 3);

    let first: serde_json::Value =
        serde_json::from_slice(&buffer.try_dequeue().unwrap()).unwrap();
    assert_eq!(first["message"], "record 0");
}

#[tokio::test]
async fn test_file_sink_receives_text_lines() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("pipeline.log");
    let file = std::fs::File::create(&path).unwrap();

    let pipeline = LogPipeline::new(
        PipelineConfig::new().file(file).min_level(LogLevel::Debug),
        CancellationToken::new(),
    )
    .unwrap();

    pipeline.on_start().await.unwrap();
    let logger = pipeline.logger();
    log_fanout::debug!(logger, "cache warmed in {}ms", 12);
    logger.trace("filtered");
    logger.log_error(
        LogLevel::Error,
        "request failed",
        &std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timeout"),
    );
    pipeline.on_stop().await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("INF"));
    assert!(lines[0].ends_with(log_fanout::pipeline::START_BANNER));
    assert!(lines[1].contains("DBG cache warmed in 12ms"));
    assert!(lines[2].contains("ERR request failed"));
    assert!(lines[2].contains("error=upstream timeout"));
}

#[tokio::test]
async fn test_own_instance_sinks_are_replaced() {
    let existing = SharedBuf::default();
    let extra = SharedBuf::default();
    let logger = Logger::builder()
        .min_level(LogLevel::Warn)
        .appender(WriterAppender::named("existing", Box::new(existing.clone())))
        .build();
    logger.warn("before the pipeline");

    let pipeline = LogPipeline::new(
        PipelineConfig::new()
            .own_instance(logger)
            .custom_writer(Box::new(extra.clone())),
        CancellationToken::new(),
    )
    .unwrap();

    let logger = pipeline.logger();
    logger.info("filtered by the kept level");
    logger.warn("only the new sink");

    assert_eq!(logger.appender_names(), vec!["custom-0"]);
    assert_eq!(existing.lines().len(), 1);
    assert_eq!(extra.lines().len(), 1);
    assert_eq!(pipeline.metrics().total_logged(), 2);
}

#[tokio::test]
async fn test_default_logger_delivers_debug_records() {
    let out = SharedBuf::default();
    let pipeline = LogPipeline::new(
        PipelineConfig::new().custom_writer(Box::new(out.clone())),
        CancellationToken::new(),
    )
    .unwrap();

    pipeline.logger().debug("cache warmed");

    let lines = out.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "debug");
    assert_eq!(lines[0]["message"], "cache warmed");
}

#[tokio::test]
async fn test_broker_writer_accepts_raw_bytes() {
    let state = Arc::new(BrokerState::default());
    let pipeline = LogPipeline::with_connector(
        PipelineConfig::new().broker(broker_config()),
        CancellationToken::new(),
        Arc::new(TestConnector(Arc::clone(&state))),
    )
    .unwrap();

    let mut writer = pipeline.broker_writer().unwrap();
    let line = br#"{"level":"info","message":"raw"}"#;
    assert_eq!(writer.write(line).unwrap(), line.len());

    pipeline.on_start().await.unwrap();
    assert!(wait_until(|| state.published.lock().len() == 2).await);
    pipeline.on_stop().await.unwrap();

    // The raw line was queued before the banner
    assert_eq!(state.published.lock()[0].2, line.to_vec());
}

#[tokio::test]
async fn test_lifecycle_events_are_logged() {
    let out = SharedBuf::default();
    let pipeline = LogPipeline::new(
        PipelineConfig::new().custom_writer(Box::new(out.clone())),
        CancellationToken::new(),
    )
    .unwrap();

    let events = pipeline.event_logger();
    events.log_event(&LifecycleEvent::Stopping {
        signal: "SIGTERM".into(),
    });
    events.log_event(&LifecycleEvent::RolledBack {
        err: Some("hook timed out".into()),
    });

    let lines = out.lines();
    assert_eq!(lines[0]["level"], "warn");
    assert_eq!(lines[0]["message"], "stopping application... SIGTERM");
    assert_eq!(lines[1]["level"], "error");
    assert_eq!(lines[1]["error"], "hook timed out");
}

#[test]
fn test_missing_destination_is_a_construction_error() {
    let result = LogPipeline::with_connector(
        PipelineConfig::new().broker(BrokerConfig::new("u", "p", "h", "5672")),
        CancellationToken::new(),
        Arc::new(TestConnector(Arc::new(BrokerState::default()))),
    );
    let err = result.err().unwrap();
    assert!(err.to_string().contains("queue or exchange"));
}
