use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use contentlens_core::config::{ClientSettings, RetryPolicy};
use contentlens_core::{
    telemetry, ApiClient, AuthStore, DatasetStore, EventBus, EventLog, LocalStorage,
    ScriptedTransport, Session, StreamOutcome, TransportError,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Automation helpers for ContentLens")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a lightweight smoke test that exercises the ContentLens core logic.
    Smoke,
}

fn main() -> Result<()> {
    telemetry::init_tracing(EnvFilter::new("info"))?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke => smoke_test(),
    }
}

fn smoke_test() -> Result<()> {
    let runtime = Runtime::new()?;
    let temp_dir = TempDir::new()?;
    let transport = ScriptedTransport::new();
    let created_at = "2025-03-01T08:30:00";
    transport
        .push_json(200, json!({"code": 200, "data": {"access_token": "smoke-token"}}))
        .push_json(200, json!({"code": 200, "data": {
            "id": "u1", "username": "smoke", "email": "smoke@example.com",
            "created_at": created_at
        }}))
        .push_failure(TransportError::Timeout)
        .push_json(200, json!({"code": 200, "data": {"items": [{
            "id": "d1", "name": "Smoke set", "original_filename": "smoke.xlsx",
            "status": "completed", "row_count": 3,
            "created_at": created_at, "updated_at": created_at
        }], "total": 1}}))
        .push_stream(200, [
            "data: {\"type\": \"start\"}\n\n",
            "data: {\"type\": \"chunk\", \"content\": \"pong\"}\n\n",
            "data: {\"type\": \"done\"}\n\n",
        ]);

    let settings = ClientSettings::for_base_url("http://smoke.invalid/api/v1")?
        .with_retry(RetryPolicy {
            max_retries: 1,
            delay_ms: 0,
        })
        .with_storage_dir(temp_dir.path().to_path_buf());
    let session = Session::new(LocalStorage::new(settings.storage_dir.clone()));
    let (events, mut receiver) = EventBus::channel();
    let client = ApiClient::builder(settings, session)
        .events(events)
        .transport(Arc::new(transport.clone()))
        .build()?;

    runtime.block_on(async {
        let auth = AuthStore::new(client.clone());
        let user = auth.login("smoke", "secret").await?;
        ensure!(user.is_some(), "login did not load the user");

        let datasets = DatasetStore::new(client.clone());
        datasets.fetch_datasets(1, 20).await?;
        ensure!(datasets.total() == 1, "dataset list not loaded");

        let mut log = EventLog::default();
        let outcome = client.send_message("c1", "ping from xtask", &mut log).await;
        ensure!(outcome == StreamOutcome::Completed, "chat stream ended with {outcome:?}");

        info!(
            requests = transport.request_count(),
            reply = %log.text(),
            "smoke test finished"
        );
        Ok::<(), anyhow::Error>(())
    })?;

    ensure!(
        receiver.try_recv().is_err(),
        "smoke run emitted unexpected notifications"
    );
    Ok(())
}
