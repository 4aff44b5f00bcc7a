mod cli_tests;
mod client_tests;
mod store_tests;
mod stream_tests;

use contentlens_core::config::{ClientSettings, RetryPolicy};
use contentlens_core::{ApiClient, ClientEvent, EventBus, LocalStorage, Session};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::MockServer;

pub const CREATED_AT: &str = "2025-03-01T08:30:00";

fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

/// A client wired to a mock server over real HTTP, with its session kept in
/// a temp dir that lives as long as the harness.
struct Harness {
    client: ApiClient,
    events: UnboundedReceiver<ClientEvent>,
    storage: TempDir,
}

impl Harness {
    fn drain_events(&mut self) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    fn notifications(&mut self) -> Vec<String> {
        self.drain_events()
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::Notification { message } => Some(message),
                ClientEvent::RedirectToLogin => None,
            })
            .collect()
    }
}

fn settings_for(base: &str) -> ClientSettings {
    ClientSettings::for_base_url(&format!("{base}/api/v1"))
        .expect("settings")
        .with_retry(RetryPolicy {
            max_retries: 1,
            delay_ms: 0,
        })
}

fn harness_with(settings: ClientSettings, token: Option<&str>) -> Harness {
    let storage = TempDir::new().expect("temp dir");
    let session = Session::new(LocalStorage::new(storage.path().to_path_buf()));
    if let Some(token) = token {
        session.set_token(token).expect("token");
    }
    let (bus, events) = EventBus::channel();
    let client = ApiClient::builder(settings, session)
        .events(bus)
        .build()
        .expect("client");
    Harness {
        client,
        events,
        storage,
    }
}

fn harness(server: &MockServer, token: Option<&str>) -> Harness {
    harness_with(settings_for(&server.uri()), token)
}

fn envelope(data: Value) -> Value {
    json!({"code": 200, "message": "success", "data": data})
}

fn dataset_json(id: &str, status: &str) -> Value {
    json!({
        "id": id, "name": format!("Dataset {id}"), "original_filename": "posts.xlsx",
        "status": status, "row_count": 0,
        "created_at": CREATED_AT, "updated_at": CREATED_AT
    })
}

fn user_json() -> Value {
    json!({
        "id": "u1", "username": "alice", "email": "alice@example.com",
        "is_active": true, "created_at": CREATED_AT
    })
}
