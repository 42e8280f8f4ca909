use std::time::Duration;

use soragiri::blade::{Blade, Recorder, Silent, SliceOptions, SliceState};
use soragiri::error::SliceError;
use soragiri::kie::KieClient;
use soragiri::kie::mock::MockApi;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://sora.chatgpt.com/p/s_68e0";

fn options(max_attempts: u32) -> SliceOptions {
    SliceOptions {
        max_attempts,
        poll_interval: Duration::ZERO,
    }
}

fn blade(statuses: Vec<soragiri::kie::TaskRecord>, max_attempts: u32) -> Blade {
    Blade::new(Box::new(MockApi::new(statuses)), options(max_attempts))
}

#[tokio::test]
async fn polls_through_queue_until_success() {
    let blade = blade(
        vec![
            MockApi::status("waiting"),
            MockApi::status("queuing"),
            MockApi::status("generating"),
            MockApi::success("https://cdn/clean.mp4", Some(4200)),
        ],
        10,
    );
    let rec = Recorder::new();

    let out = blade.slice(URL, None, &rec).await.unwrap();
    assert_eq!(out.output_url, "https://cdn/clean.mp4");
    assert_eq!(out.cost_time_ms, Some(4200));

    let messages: Vec<String> = rec.events().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        messages,
        vec![
            "Unsheathing the blade...",
            "Task locked: task-012...",
            "In queue... [1/10]",
            "In queue... [2/10]",
            "Slicing... [3/10]",
            "Watermark severed.",
            "Slice complete.",
        ]
    );
    assert_eq!(
        rec.states(),
        vec![
            SliceState::Initializing,
            SliceState::Queued,
            SliceState::Queued,
            SliceState::Queued,
            SliceState::Slicing,
            SliceState::Slicing,
            SliceState::Complete,
        ]
    );
}

#[tokio::test]
async fn unrecognised_state_counts_as_running() {
    let blade = blade(
        vec![
            MockApi::status("rendering"),
            MockApi::success("https://cdn/clean.mp4", None),
        ],
        5,
    );
    let rec = Recorder::new();
    blade.slice(URL, None, &rec).await.unwrap();
    assert!(
        rec.events()
            .iter()
            .any(|(s, m)| *s == SliceState::Slicing && m == "Processing... [1/5]")
    );
}

#[tokio::test]
async fn fail_state_surfaces_reason() {
    let blade = blade(
        vec![
            MockApi::status("generating"),
            MockApi::failure(Some("video is private")),
        ],
        5,
    );
    let rec = Recorder::new();

    let err = blade.slice(URL, None, &rec).await.unwrap_err();
    assert!(matches!(err, SliceError::Failed(ref m) if m == "video is private"));

    let (state, message) = rec.events().pop().unwrap();
    assert_eq!(state, SliceState::Failed);
    assert!(message.contains("video is private"));
}

#[tokio::test]
async fn fail_without_reason_uses_default() {
    let blade = blade(vec![MockApi::failure(None)], 5);
    let err = blade.slice(URL, None, &Silent).await.unwrap_err();
    assert!(matches!(err, SliceError::Failed(ref m) if m == "Unknown failure"));
}

#[tokio::test]
async fn success_without_urls_is_no_output() {
    let mut record = MockApi::status("success");
    record.result_json = Some(r#"{"resultUrls": []}"#.to_string());
    let blade = blade(vec![record], 5);

    let err = blade.slice(URL, None, &Silent).await.unwrap_err();
    assert!(matches!(err, SliceError::NoOutput));
}

#[tokio::test]
async fn exhausting_attempts_times_out() {
    let api = MockApi::new(vec![]);
    let blade = Blade::new(Box::new(api), options(3));
    let rec = Recorder::new();

    let err = blade.slice(URL, None, &rec).await.unwrap_err();
    assert!(matches!(err, SliceError::Timeout { attempts: 3 }));

    // Initializing, Queued (task locked), three polls, then Failed
    assert_eq!(rec.events().len(), 6);
    assert_eq!(rec.states().last(), Some(&SliceState::Failed));
}

#[tokio::test]
async fn create_failure_is_reported() {
    let api = MockApi::failing_create(SliceError::RateLimited);
    let blade = Blade::new(Box::new(api), options(3));
    let rec = Recorder::new();

    let err = blade.slice(URL, None, &rec).await.unwrap_err();
    assert!(matches!(err, SliceError::RateLimited));
    assert_eq!(
        rec.states(),
        vec![SliceState::Initializing, SliceState::Failed]
    );
}

#[tokio::test]
async fn slice_to_path_writes_file() {
    let api = MockApi::new(vec![MockApi::success("https://cdn/clean.mp4", None)])
        .with_payload(b"frames".to_vec());
    let blade = Blade::new(Box::new(api), options(3));
    let rec = Recorder::new();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out").join("clean.mp4");
    let out = blade.slice(URL, Some(&dest), &rec).await.unwrap();

    assert_eq!(out.output_path.as_deref(), Some(dest.as_path()));
    assert_eq!(std::fs::read(&dest).unwrap(), b"frames");

    let events = rec.events();
    let n = events.len();
    assert_eq!(events[n - 2].0, SliceState::Downloading);
    assert_eq!(events[n - 1].0, SliceState::Complete);
    assert!(events[n - 1].1.starts_with("Saved to "));
}

#[tokio::test]
async fn slice_to_bytes_returns_payload() {
    let api = MockApi::new(vec![MockApi::success("https://cdn/clean.mp4", Some(10))])
        .with_payload(b"video".to_vec());
    let blade = Blade::new(Box::new(api), options(3));
    let rec = Recorder::new();

    let video = blade.slice_to_bytes(URL, &rec).await.unwrap();
    assert_eq!(video.bytes, b"video");
    assert_eq!(video.output.output_url, "https://cdn/clean.mp4");
    assert_eq!(rec.states().last().copied(), Some(SliceState::Complete));
    assert!(rec.states().contains(&SliceState::Downloading));
}

#[tokio::test]
async fn poll_interval_is_respected() {
    let api = MockApi::new(vec![
        MockApi::status("generating"),
        MockApi::success("https://cdn/clean.mp4", None),
    ]);
    let blade = Blade::new(
        Box::new(api),
        SliceOptions {
            max_attempts: 5,
            poll_interval: Duration::from_millis(50),
        },
    );

    let start = std::time::Instant::now();
    blade.slice(URL, None, &Silent).await.unwrap();
    // Sleeps before every status check, including the first
    assert!(start.elapsed() >= Duration::from_millis(100));
}

// ── against the HTTP client ───────────────────────────────────────

#[tokio::test]
async fn full_flow_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/jobs/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": {"taskId": "http-task-1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/recordInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": {
                "state": "success",
                "resultJson": format!(
                    "{{\"resultUrls\":[\"{}/files/clean.mp4\"]}}",
                    server.uri()
                ),
                "costTime": 1234
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/clean.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"real bytes".to_vec()))
        .mount(&server)
        .await;

    let api = KieClient::with_base_url("k", format!("{}/api/v1", server.uri()));
    let blade = Blade::new(Box::new(api), options(3));

    let video = blade.slice_to_bytes(URL, &Silent).await.unwrap();
    assert_eq!(video.output.task_id, "http-task-1");
    assert_eq!(video.output.cost_time_ms, Some(1234));
    assert_eq!(video.bytes, b"real bytes");
}

#[tokio::test]
async fn status_error_code_fails_without_polling_on() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/jobs/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 200,
            "data": {"taskId": "gone-task"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/recordInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 404,
            "msg": "task not found",
            "data": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = KieClient::with_base_url("k", format!("{}/api/v1", server.uri()));
    let blade = Blade::new(Box::new(api), options(5));
    let rec = Recorder::new();

    let err = blade.slice(URL, None, &rec).await.unwrap_err();
    assert!(matches!(err, SliceError::Api { code: 404, .. }));
    let (state, message) = rec.events().pop().unwrap();
    assert_eq!(state, SliceState::Failed);
    assert!(message.contains("task not found"));
}
