use super::*;
use contentlens_core::{ChatEvent, EventLog, StreamOutcome};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn event_stream(lines: &[&str]) -> ResponseTemplate {
    let body: String = lines.iter().map(|line| format!("data: {line}\n\n")).collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

#[test]
fn chat_reply_streams_over_http() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/conversations/c1/messages"))
            .and(header("authorization", "Bearer jwt"))
            .and(body_json(json!({"content": "Why did reads drop?"})))
            .respond_with(event_stream(&[
                r#"{"type": "start"}"#,
                r#"{"type": "chunk", "content": "Publishing time "}"#,
                r#"{"type": "chunk", "content": "moved to 2am."}"#,
                r#"{"type": "done"}"#,
            ]))
            .expect(1)
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("jwt"));

        let mut log = EventLog::default();
        let outcome = h
            .client
            .send_message("c1", "Why did reads drop?", &mut log)
            .await;
        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(log.text(), "Publishing time moved to 2am.");
        assert_eq!(log.events.first(), Some(&ChatEvent::Start));
        assert!(h.drain_events().is_empty());
    });
}

#[test]
fn error_event_reaches_channel_subscriber() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/conversations/c2/messages"))
            .respond_with(event_stream(&[
                r#"{"type": "chunk", "content": "Let me"}"#,
                r#"{"type": "error", "message": "AI provider not configured"}"#,
            ]))
            .mount(&server)
            .await;
        let h = harness(&server, Some("jwt"));

        let mut rx = h.client.send_message_streaming("c2", "hello");
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ChatEvent::Chunk {
                    content: "Let me".into()
                },
                ChatEvent::Error {
                    message: "AI provider not configured".into()
                },
            ]
        );
    });
}

#[test]
fn rejected_stream_does_not_touch_session() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/conversations/c3/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("jwt"));

        let mut log = EventLog::default();
        let outcome = h.client.send_message("c3", "hi", &mut log).await;
        assert_eq!(outcome, StreamOutcome::Failed);
        assert!(matches!(log.events.as_slice(), [ChatEvent::Error { .. }]));
        assert!(h.client.session().is_logged_in());
        assert!(h.drain_events().is_empty());
    });
}
