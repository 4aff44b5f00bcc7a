use crate::cli::{
    AnalysisCommand, ChatCommand, Command, DatasetCommand, ExportCommand, PostCommand,
    SettingsCommand,
};
use crate::output::{self, print_json, StdoutReply};
use anyhow::{bail, Context as _, Result};
use contentlens_core::models::{
    AiOutputUpdate, ConversationCreate, ContextType, ExportState, SettingsUpdate,
};
use contentlens_core::{
    guard, AnalysisStore, ApiClient, AuthStore, ConversationFilter, DatasetStore, FileUpload,
    Navigation, StreamOutcome,
};
use tracing::debug;

/// Client plus the stores that commands read and update.
pub struct Context {
    pub client: ApiClient,
    pub auth: AuthStore,
    pub datasets: DatasetStore,
    pub analyses: AnalysisStore,
    pub json: bool,
}

impl Context {
    pub fn new(client: ApiClient, json: bool) -> Self {
        Self {
            auth: AuthStore::new(client.clone()),
            datasets: DatasetStore::new(client.clone()),
            analyses: AnalysisStore::new(client.clone()),
            client,
            json,
        }
    }
}

/// The view a command stands for, checked against the login gate before it
/// runs.
fn route_for(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } | Command::Register { .. } | Command::Logout => "/login",
        Command::Whoami | Command::Datasets(_) => "/datasets",
        Command::Analyses(_) => "/analyses",
        Command::Posts(_) => "/posts/_",
        Command::Exports(_) => "/exports",
        Command::Settings(_) => "/settings",
        Command::Screenshot { .. } => "/screenshot",
        Command::Chat(_) => "/chat/_",
    }
}

pub async fn run(command: Command, ctx: &Context) -> Result<()> {
    if let Navigation::Redirect(target) = guard(route_for(&command), ctx.auth.is_logged_in()) {
        debug!(%target, "navigation gate redirected");
        if target == "/login" {
            bail!("not logged in; run `contentlens login` first");
        }
    }

    match command {
        Command::Login { username, password } => {
            let user = ctx.auth.login(&username, &password).await?;
            match user {
                Some(user) => println!("Logged in as {} <{}>", user.username, user.email),
                None => println!("Logged in as {username}"),
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = ctx.auth.register(&username, &email, &password).await?;
            println!("Registered {}; log in to continue", user.username);
        }
        Command::Logout => {
            ctx.auth.logout();
            println!("Logged out");
        }
        Command::Whoami => match ctx.auth.fetch_user().await {
            Some(user) if ctx.json => print_json(&user)?,
            Some(user) => println!("{} <{}> ({})", user.username, user.email, user.id),
            None => bail!("could not load the current user"),
        },
        Command::Datasets(command) => datasets(command, ctx).await?,
        Command::Analyses(command) => analyses(command, ctx).await?,
        Command::Posts(command) => posts(command, ctx).await?,
        Command::Exports(command) => exports(command, ctx).await?,
        Command::Settings(command) => settings(command, ctx).await?,
        Command::Screenshot { file } => {
            let upload = FileUpload::from_path(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let analysis = ctx.client.analyze_screenshot(upload).await?;
            if ctx.json {
                print_json(&analysis)?;
            } else {
                println!("Summary\n  {}", analysis.summary);
                for (heading, items) in [
                    ("Strengths", &analysis.strengths),
                    ("Weaknesses", &analysis.weaknesses),
                    ("Suggestions", &analysis.suggestions),
                ] {
                    if !items.is_empty() {
                        println!("{heading}");
                        items.iter().for_each(|item| println!("  - {item}"));
                    }
                }
            }
        }
        Command::Chat(command) => chat(command, ctx).await?,
    }
    Ok(())
}

async fn datasets(command: DatasetCommand, ctx: &Context) -> Result<()> {
    match command {
        DatasetCommand::List { paging } => {
            ctx.datasets.fetch_datasets(paging.page, paging.page_size).await?;
            let datasets = ctx.datasets.datasets();
            if ctx.json {
                return print_json(&datasets);
            }
            datasets
                .iter()
                .for_each(|dataset| println!("{}", output::dataset_line(dataset)));
            println!("{} of {} datasets", datasets.len(), ctx.datasets.total());
        }
        DatasetCommand::Show { id } => {
            let dataset = ctx.datasets.fetch_dataset(&id).await?;
            print_json(&dataset)?;
        }
        DatasetCommand::Upload { name, file } => {
            let upload = FileUpload::from_path(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let dataset = ctx.datasets.upload_dataset(&name, upload).await?;
            println!("{}", output::dataset_line(&dataset));
        }
        DatasetCommand::Delete { id } => {
            ctx.datasets.delete_dataset(&id).await?;
            println!("Deleted dataset {id}");
        }
    }
    Ok(())
}

async fn analyses(command: AnalysisCommand, ctx: &Context) -> Result<()> {
    let store = &ctx.analyses;
    match command {
        AnalysisCommand::List { dataset, paging } => {
            store
                .fetch_analyses(dataset.as_deref(), paging.page, paging.page_size)
                .await?;
            let analyses = store.analyses();
            if ctx.json {
                return print_json(&analyses);
            }
            analyses
                .iter()
                .for_each(|analysis| println!("{}", output::analysis_line(analysis)));
        }
        AnalysisCommand::Create { dataset, name } => {
            let analysis = store.create_analysis(&dataset, name.as_deref(), None).await?;
            println!("{}", output::analysis_line(&analysis));
        }
        AnalysisCommand::Show { id } => {
            let analysis = store.fetch_analysis(&id).await?;
            if ctx.json {
                return print_json(&analysis);
            }
            println!("{}", output::analysis_line(&analysis));
            if let Some(error) = &analysis.error_message {
                println!("  error: {error}");
            }
        }
        AnalysisCommand::Results {
            id,
            performance,
            page,
            page_size,
        } => {
            store
                .fetch_results(&id, performance.as_deref(), page, page_size)
                .await?;
            let results = store.results();
            if ctx.json {
                return print_json(&results);
            }
            results
                .iter()
                .for_each(|result| println!("{}", output::result_line(result)));
        }
        AnalysisCommand::Ai { id } => {
            store.trigger_ai(&id).await?;
            println!("AI review started for {id}");
        }
        AnalysisCommand::Stop { id } => {
            store.stop_analysis(&id).await?;
            println!("Stopped {id}");
        }
        AnalysisCommand::Delete { id } => {
            store.delete_analysis(&id).await?;
            println!("Deleted analysis {id}");
        }
    }
    Ok(())
}

async fn posts(command: PostCommand, ctx: &Context) -> Result<()> {
    let client = &ctx.client;
    match command {
        PostCommand::Show { id } => {
            let post = ctx.analyses.fetch_post(&id).await?;
            print_json(&post)?;
        }
        PostCommand::AiOutput { id, analysis } => {
            match ctx.analyses.fetch_ai_output(&id, &analysis).await {
                Some(ai_output) if ctx.json => print_json(&ai_output)?,
                Some(ai_output) => output::print_ai_output(&ai_output),
                None => println!("No AI output for post {id} yet"),
            }
        }
        PostCommand::History { id, analysis } => {
            let history = client.get_post_ai_output_history(&id, &analysis).await?;
            if ctx.json {
                return print_json(&history);
            }
            for entry in &history {
                println!(
                    "{}  {:<10} {}",
                    entry.id,
                    entry.action.as_deref().unwrap_or("-"),
                    entry.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        PostCommand::Rollback {
            id,
            analysis,
            history,
        } => {
            let ai_output = client.rollback_post_ai_output(&id, &analysis, &history).await?;
            output::print_ai_output(&ai_output);
        }
        PostCommand::EditSummary {
            id,
            analysis,
            summary,
        } => {
            let update = AiOutputUpdate {
                summary: Some(summary),
                ..AiOutputUpdate::default()
            };
            let ai_output = client.update_post_ai_output(&id, &analysis, &update).await?;
            output::print_ai_output(&ai_output);
        }
        PostCommand::Result { id, analysis } => {
            let result = client.get_post_analysis_result(&id, &analysis).await?;
            print_json(&result)?;
        }
    }
    Ok(())
}

async fn exports(command: ExportCommand, ctx: &Context) -> Result<()> {
    let client = &ctx.client;
    match command {
        ExportCommand::List => {
            let exports = client.get_exports().await?;
            if ctx.json {
                return print_json(&exports);
            }
            exports
                .iter()
                .for_each(|export| println!("{}", output::export_line(export)));
        }
        ExportCommand::Create { analysis, format } => {
            let created = client.create_export(&analysis, format.into()).await?;
            println!("Export {} queued", created.export_id);
        }
        ExportCommand::Status { id } => {
            let status = client.get_export_status(&id).await?;
            println!("{}  {}", status.id, output::label(&status.status));
            if status.status == ExportState::Failed {
                if let Some(error) = status.error_message {
                    println!("  error: {error}");
                }
            }
        }
        ExportCommand::Download { id, out } => {
            let bytes = client.download_export_to(&id, &out).await?;
            println!("Saved {bytes} bytes to {}", out.display());
        }
    }
    Ok(())
}

async fn settings(command: SettingsCommand, ctx: &Context) -> Result<()> {
    let client = &ctx.client;
    match command {
        SettingsCommand::Show => {
            let settings = client.get_settings().await?;
            if ctx.json {
                return print_json(&settings);
            }
            println!("provider: {}", settings.ai_provider);
            println!("deepseek key: {}", yes_no(settings.has_deepseek_key));
            println!("openai key: {}", yes_no(settings.has_openai_key));
            println!("iflow key: {}", yes_no(settings.has_iflow_key));
            if let Some(model) = &settings.iflow_model {
                println!("iflow model: {model}");
            }
        }
        SettingsCommand::Set {
            provider,
            deepseek_key,
            openai_key,
            iflow_key,
            iflow_model,
        } => {
            let update = SettingsUpdate {
                ai_provider: provider,
                deepseek_api_key: deepseek_key,
                openai_api_key: openai_key,
                iflow_api_key: iflow_key,
                iflow_model,
            };
            let settings = client.update_settings(&update).await?;
            println!("Settings saved; provider is {}", settings.ai_provider);
        }
        SettingsCommand::TestKey => {
            let outcome = client.test_api_key().await?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

async fn chat(command: ChatCommand, ctx: &Context) -> Result<()> {
    let client = &ctx.client;
    match command {
        ChatCommand::New { title, analysis } => {
            let context_type = if analysis.is_some() {
                ContextType::Analysis
            } else {
                ContextType::General
            };
            let conversation = client
                .create_conversation(&ConversationCreate {
                    title,
                    context_type,
                    context_analysis_id: analysis,
                    context_analysis_result_id: None,
                })
                .await?;
            println!("{}", output::conversation_line(&conversation));
        }
        ChatCommand::FromResult { result } => {
            let conversation = client.create_conversation_from_analysis_result(&result).await?;
            println!("{}", output::conversation_line(&conversation));
        }
        ChatCommand::List { context, analysis } => {
            let conversations = client
                .get_conversations(&ConversationFilter {
                    context_type: context.map(Into::into),
                    context_analysis_id: analysis,
                    ..ConversationFilter::default()
                })
                .await?;
            if ctx.json {
                return print_json(&conversations);
            }
            conversations
                .iter()
                .for_each(|conversation| println!("{}", output::conversation_line(conversation)));
        }
        ChatCommand::Show { id } => {
            let detail = client.get_conversation(&id).await?;
            if ctx.json {
                return print_json(&detail);
            }
            output::print_conversation(&detail);
        }
        ChatCommand::Send { id, message } => {
            let mut reply = StdoutReply::default();
            match client.send_message(&id, &message, &mut reply).await {
                StreamOutcome::Completed => {}
                StreamOutcome::Ended => debug!("reply ended without a done event"),
                StreamOutcome::Failed => {
                    bail!(reply.failed.unwrap_or_else(|| "chat reply failed".to_string()))
                }
            }
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "configured"
    } else {
        "not set"
    }
}
