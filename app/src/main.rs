use clap::Parser;
use contentlens::output::spawn_event_printer;
use contentlens::{run, Cli, Context};
use contentlens_core::telemetry;
use contentlens_core::{ApiClient, ApiError, ClientSettings, EventBus, LocalStorage, Session};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing::debug;

fn main() -> ExitCode {
    if let Err(err) = telemetry::init_tracing(telemetry::env_filter("warn")) {
        eprintln!("failed to initialise logging: {err}");
    }
    let cli = Cli::parse();

    let outcome = Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run_cli(cli)));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !already_reported(&err) {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let mut settings = ClientSettings::load().map_err(|err| anyhow::anyhow!(err.user_message()))?;
    if let Some(base_url) = &cli.base_url {
        settings = settings
            .with_base_url(base_url)
            .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    }
    debug!(base_url = %settings.base_url, "using backend");

    let session = Session::new(LocalStorage::new(settings.storage_dir.clone()));
    let (events, receiver) = EventBus::channel();
    let printer = spawn_event_printer(receiver);
    let client = ApiClient::builder(settings, session)
        .events(events)
        .build()
        .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;

    let ctx = Context::new(client, cli.json);
    let result = run(cli.command, &ctx).await;
    drop(ctx);
    printer.await.ok();
    result
}

/// Failures that came back from the backend were already printed by the
/// event printer; local ones were not.
fn already_reported(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ApiError>(),
        Some(api_err) if !matches!(api_err, ApiError::Io(_) | ApiError::Storage(_))
    )
}
