use soragiri::history::{History, NewRecord, Source, Status};

fn record<'a>(url: &'a str, status: Status, detail: &'a str) -> NewRecord<'a> {
    NewRecord {
        source: Source::Discord,
        url,
        task_id: None,
        status,
        detail,
        cost_time_ms: None,
    }
}

#[test]
fn persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let history = History::open(&path).unwrap();
        history
            .record(&record(
                "https://sora.chatgpt.com/p/1",
                Status::Success,
                "https://cdn/clean.mp4",
            ))
            .unwrap();
    }

    let history = History::open(&path).unwrap();
    let recent = history.recent(5).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].source, "discord");
    assert_eq!(recent[0].detail, "https://cdn/clean.mp4");
    assert!(recent[0].task_id.is_none());
}

#[test]
fn failures_are_counted_separately() {
    let history = History::in_memory().unwrap();
    history
        .record(&record("a", Status::Failed, "rate limited, the blade needs rest"))
        .unwrap();
    history
        .record(&record("b", Status::Success, "https://cdn/b.mp4"))
        .unwrap();

    assert_eq!(history.count(Status::Success).unwrap(), 1);
    assert_eq!(history.count(Status::Failed).unwrap(), 1);
    assert_eq!(history.recent(10).unwrap()[0].url, "b");
}

#[test]
fn clear_then_record_again() {
    let history = History::in_memory().unwrap();
    history.record(&record("a", Status::Success, "x")).unwrap();
    history.clear().unwrap();
    history.record(&record("b", Status::Success, "y")).unwrap();

    let recent = history.recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].url, "b");
}
