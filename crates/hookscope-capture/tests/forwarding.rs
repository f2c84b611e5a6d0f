//! Forwarding queue delivery and partial-failure recovery.

use std::sync::Mutex;

use async_trait::async_trait;
use hookscope_capture::{
    BatchSink, FlushStatus, ForwardError, ForwardQueue, HttpBatchSink, QueuedEvent,
};
use hookscope_common_config::TelemetryConfig;
use hookscope_event_types::{payload_from, Event, EventType};
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Fails every batch whose index is in `failing`, recording the rest.
struct FlakySink {
    failing: Vec<usize>,
    calls: Mutex<usize>,
    delivered: Mutex<Vec<u64>>,
}

impl FlakySink {
    fn failing_at(failing: &[usize]) -> Self {
        Self {
            failing: failing.to_vec(),
            calls: Mutex::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    fn delivered(&self) -> Vec<u64> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchSink for FlakySink {
    async fn send_batch(&self, events: &[QueuedEvent]) -> Result<(), ForwardError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls - 1
        };
        if self.failing.contains(&index) {
            return Err(ForwardError::Rejected(format!("batch {index} refused")));
        }
        self.delivered
            .lock()
            .unwrap()
            .extend(events.iter().map(|e| e.seq));
        Ok(())
    }
}

fn fill(queue: &ForwardQueue, count: u64) {
    for seq in 1..=count {
        let event = Event::new(
            EventType::ToolEnd,
            "S1",
            seq,
            payload_from(json!({"tool_name": "Read", "duration_ms": 1.5})),
        );
        queue.enqueue(&event).unwrap();
    }
}

fn queued_seqs(queue: &ForwardQueue) -> Vec<u64> {
    queue.read_all().unwrap().iter().map(|e| e.seq).collect()
}

#[test_case(10, 3, 0 ; "fails on first batch")]
#[test_case(10, 3, 1 ; "fails on second batch")]
#[test_case(10, 3, 3 ; "fails on last short batch")]
#[test_case(7, 7, 0 ; "single batch")]
#[tokio::test]
async fn failure_at_batch_keeps_that_batch_onward(total: u64, batch: usize, fail_at: usize) {
    let dir = tempfile::tempdir().unwrap();
    let queue = ForwardQueue::new(dir.path().join(".push_queue.jsonl"));
    fill(&queue, total);

    let sink = FlakySink::failing_at(&[fail_at]);
    let report = queue.flush(&sink, batch).await;

    let delivered = (fail_at * batch) as u64;
    assert_eq!(report.pushed as u64, delivered);
    assert_eq!(report.total as u64, total);
    assert_eq!(report.errors.len(), 1);
    let expected_status = if delivered == 0 {
        FlushStatus::Error
    } else {
        FlushStatus::Partial
    };
    assert_eq!(report.status, expected_status);
    assert_eq!(sink.delivered(), (1..=delivered).collect::<Vec<_>>());
    assert_eq!(queued_seqs(&queue), (delivered + 1..=total).collect::<Vec<_>>());

    // The sink recovers: a second flush delivers exactly the remainder.
    let healthy = FlakySink::failing_at(&[]);
    let report = queue.flush(&healthy, batch).await;
    assert_eq!(report.status, FlushStatus::Ok);
    assert_eq!(healthy.delivered(), (delivered + 1..=total).collect::<Vec<_>>());
    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn later_failures_are_not_attempted() {
    let dir = tempfile::tempdir().unwrap();
    let queue = ForwardQueue::new(dir.path().join(".push_queue.jsonl"));
    fill(&queue, 9);

    // Batch 1 fails; batch 2 would succeed but must not be sent out of order.
    let sink = FlakySink::failing_at(&[1]);
    queue.flush(&sink, 3).await;

    assert_eq!(*sink.calls.lock().unwrap(), 2);
    assert_eq!(queued_seqs(&queue), vec![4, 5, 6, 7, 8, 9]);
}

/// Appends an event to the queue while the first batch is in flight.
struct AppendingSink {
    queue: ForwardQueue,
}

#[async_trait]
impl BatchSink for AppendingSink {
    async fn send_batch(&self, _events: &[QueuedEvent]) -> Result<(), ForwardError> {
        let late = Event::new(EventType::Stop, "S2", 99, Default::default());
        self.queue.enqueue(&late).expect("append during flush");
        Ok(())
    }
}

#[tokio::test]
async fn events_appended_during_flush_survive() {
    let dir = tempfile::tempdir().unwrap();
    let queue = ForwardQueue::new(dir.path().join(".push_queue.jsonl"));
    fill(&queue, 2);

    let sink = AppendingSink {
        queue: queue.clone(),
    };
    let report = queue.flush(&sink, 10).await;

    assert_eq!(report.status, FlushStatus::Ok);
    assert_eq!(report.pushed, 2);
    assert_eq!(queued_seqs(&queue), vec![99]);
}

#[tokio::test]
async fn http_sink_posts_batches_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(header("x-api-key", "ct_live_test"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let queue = ForwardQueue::new(dir.path().join(".push_queue.jsonl"));
    fill(&queue, 3);

    let config = TelemetryConfig {
        api_url: Some(server.uri()),
        api_key: Some("ct_live_test".to_string()),
        push_batch_size: 2,
        ..TelemetryConfig::default()
    };
    let report = queue.flush_configured(&config).await;

    assert_eq!(report.status, FlushStatus::Ok);
    assert_eq!(report.pushed, 3);
    assert!(queue.is_empty().unwrap());

    let requests = server.received_requests().await.unwrap();
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["events"].as_array().unwrap().len(), 2);
    assert_eq!(first["events"][0]["event"], "tool_result");
}

/// Succeeds for the first request, then answers 500.
struct FirstOnly(Mutex<bool>);

impl Respond for FirstOnly {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut served = self.0.lock().unwrap();
        if *served {
            ResponseTemplate::new(500)
        } else {
            *served = true;
            ResponseTemplate::new(200)
        }
    }
}

#[tokio::test]
async fn http_sink_server_error_is_partial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(FirstOnly(Mutex::new(false)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let queue = ForwardQueue::new(dir.path().join(".push_queue.jsonl"));
    fill(&queue, 4);

    let sink = HttpBatchSink::new(&server.uri(), "k").unwrap();
    let report = queue.flush(&sink, 2).await;

    assert_eq!(report.status, FlushStatus::Partial);
    assert_eq!(report.pushed, 2);
    assert!(report.errors[0].contains("500"));
    assert_eq!(queued_seqs(&queue), vec![3, 4]);
}
