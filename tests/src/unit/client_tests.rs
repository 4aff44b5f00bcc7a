use super::*;
use contentlens_core::models::{AnalysisCreate, ExportFormat};
use contentlens_core::{ApiError, FileUpload, TransportError};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn analyses_query_carries_dataset_and_paging() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/analyses"))
            .and(query_param("dataset_id", "ds1"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "10"))
            .and(header("authorization", "Bearer jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, Some("jwt"));

        let analyses = h.client.get_analyses(Some("ds1"), 2, 10).await.expect("analyses");
        assert!(analyses.is_empty());
    });
}

#[test]
fn dataset_upload_is_multipart_and_starts_pending() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/datasets/upload"))
            .and(body_string_contains("name=\"name\""))
            .and(body_string_contains("filename=\"posts.csv\""))
            .and(body_string_contains("March posts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(dataset_json("d1", "pending"))),
            )
            .expect(1)
            .mount(&server)
            .await;
        let h = harness(&server, Some("jwt"));

        let upload = FileUpload::new("posts.csv", b"data_id,read_7d\n1,120\n".to_vec());
        let dataset = h
            .client
            .upload_dataset("March posts", upload)
            .await
            .expect("upload");
        assert_eq!(
            dataset.status,
            contentlens_core::models::DatasetStatus::Pending
        );
    });
}

#[test]
fn expired_session_is_cleared_and_redirects() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/datasets"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})),
            )
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("stale"));
        assert!(h.storage.path().join("token").exists());

        let err = h.client.get_datasets(1, 20).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthorized {
                session_expired: true,
                ..
            }
        ));
        assert!(!h.client.session().is_logged_in());
        assert!(!h.storage.path().join("token").exists());
        assert_eq!(
            h.drain_events(),
            vec![
                ClientEvent::RedirectToLogin,
                ClientEvent::Notification {
                    message: "Session expired, please log in again".into()
                },
            ]
        );
    });
}

#[test]
fn bad_credentials_keep_server_message() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Incorrect username or password"})),
            )
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("old"));

        let credentials = contentlens_core::models::Credentials {
            username: "alice".into(),
            password: "nope".into(),
        };
        assert!(h.client.login(&credentials).await.is_err());
        assert!(h.client.session().is_logged_in());
        assert_eq!(h.notifications(), vec!["Incorrect username or password"]);
    });
}

#[test]
fn application_error_code_rejects_despite_http_ok() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/analyses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"code": 4001, "message": "Dataset is still processing", "data": null}),
            ))
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("jwt"));

        let err = h
            .client
            .create_analysis(&AnalysisCreate {
                dataset_id: "d1".into(),
                name: None,
                config: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Application { code: 4001, .. }));
        assert_eq!(h.notifications(), vec!["Dataset is still processing"]);
    });
}

#[test]
fn timed_out_get_is_retried_once() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/settings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(json!({})))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;
        let mut settings = settings_for(&server.uri());
        settings.timeout = Duration::from_millis(100);
        let mut h = harness_with(settings, Some("jwt"));

        let err = h.client.get_settings().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(TransportError::Timeout)));
        let received = server.received_requests().await.expect("recording enabled");
        assert_eq!(received.len(), 2);
        assert_eq!(
            h.notifications(),
            vec!["Request timed out, please try again later"]
        );
    });
}

#[test]
fn unreachable_backend_notifies_once() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let mut h = harness_with(settings_for(&format!("http://127.0.0.1:{port}")), None);

        let err = h.client.get_exports().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(
            h.notifications(),
            vec!["Unable to reach the server, check that the backend is running"]
        );
    });
}

/// Answers every connection with headers promising 200 bytes, sends a few,
/// then hangs up. Returns the port and a counter of accepted connections.
fn truncating_server() -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                  Content-Length: 200\r\nConnection: close\r\n\r\n{\"code\": 200, \"da",
            );
        }
    });
    (port, hits)
}

#[test]
fn get_cut_off_mid_body_is_retried() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let (port, hits) = truncating_server();
        let mut h = harness_with(settings_for(&format!("http://127.0.0.1:{port}")), None);

        let err = h.client.get_exports().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(TransportError::Connect(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(
            h.notifications(),
            vec!["Unable to reach the server, check that the backend is running"]
        );
    });
}

#[test]
fn export_download_writes_file() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/exports/a1/export"))
            .and(query_param("format", "pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(json!({"export_id": "e1"}))),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/exports/e1/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"%PDF-1.7 fake".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;
        let h = harness(&server, Some("jwt"));

        let created = h
            .client
            .create_export("a1", ExportFormat::Pdf)
            .await
            .expect("export");
        let target = h.storage.path().join("out").join("report.pdf");
        let written = h
            .client
            .download_export_to(&created.export_id, &target)
            .await
            .expect("download");
        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&target).expect("file"), b"%PDF-1.7 fake");
    });
}

#[test]
fn missing_export_maps_to_fixed_message() {
    let runtime = test_runtime();
    runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/exports/nope/status"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Export not found"})),
            )
            .mount(&server)
            .await;
        let mut h = harness(&server, Some("jwt"));

        let err = h.client.get_export_status("nope").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(h.notifications(), vec!["Resource not found"]);
    });
}
