use anyhow::Result;
use chrono::{DateTime, Utc};
use contentlens_core::models::{
    AiOutput, Analysis, AnalysisResult, Conversation, ConversationDetail, Dataset, ExportRecord,
    Message,
};
use contentlens_core::{ChatStreamHandler, ClientEvent};
use serde::Serialize;
use std::io::Write;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Wire name of a serde enum value, e.g. `ai_processing`.
pub fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(_) => "?".to_string(),
    }
}

fn stamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn dataset_line(dataset: &Dataset) -> String {
    let mut line = format!(
        "{}  {:<24} {:<10} {:>6} rows  {}",
        dataset.id,
        dataset.name,
        label(&dataset.status),
        dataset.row_count,
        stamp(&dataset.created_at)
    );
    if let Some(error) = &dataset.error_message {
        line.push_str(&format!("  ({error})"));
    }
    line
}

pub fn analysis_line(analysis: &Analysis) -> String {
    let name = analysis.name.as_deref().unwrap_or("(unnamed)");
    let mut line = format!(
        "{}  {:<24} {:<13} {}",
        analysis.id,
        name,
        label(&analysis.status),
        stamp(&analysis.created_at)
    );
    if analysis.status.is_active() && !analysis.progress.is_empty() {
        line.push_str(&format!("  [{}]", analysis.progress));
    }
    line
}

pub fn result_line(result: &AnalysisResult) -> String {
    let performance = result.performance.as_deref().unwrap_or("-");
    let post = result.post_data_id.as_deref().unwrap_or(&result.post_id);
    let mut line = format!("{}  post {:<16} {:<8}", result.id, post, performance);
    if let Some(data) = &result.result_data {
        if !data.problem_metrics.is_empty() {
            line.push_str(&format!("  weak: {}", data.problem_metrics.join(", ")));
        }
        if !data.highlight_metrics.is_empty() {
            line.push_str(&format!("  strong: {}", data.highlight_metrics.join(", ")));
        }
    }
    line
}

pub fn export_line(export: &ExportRecord) -> String {
    format!(
        "{}  {:<24} {:<6} {:<10} {}",
        export.id,
        export.analysis_name.as_deref().unwrap_or(&export.analysis_id),
        label(&export.format),
        label(&export.status),
        stamp(&export.created_at)
    )
}

pub fn conversation_line(conversation: &Conversation) -> String {
    format!(
        "{}  {:<32} {:<15} {}",
        conversation.id,
        conversation.title.as_deref().unwrap_or("New conversation"),
        label(&conversation.context_type),
        stamp(&conversation.updated_at)
    )
}

pub fn print_ai_output(output: &AiOutput) {
    if let Some(summary) = &output.summary {
        println!("Summary\n  {summary}");
    }
    for (heading, items) in [
        ("Strengths", &output.strengths),
        ("Weaknesses", &output.weaknesses),
        ("Suggestions", &output.suggestions),
    ] {
        if let Some(items) = items.as_ref().filter(|items| !items.is_empty()) {
            println!("{heading}");
            for item in items {
                println!("  - {item}");
            }
        }
    }
}

fn message_block(message: &Message) -> String {
    format!("[{}] {}\n{}\n", label(&message.role), stamp(&message.created_at), message.content)
}

pub fn print_conversation(detail: &ConversationDetail) {
    println!("{}", conversation_line(&detail.conversation));
    for message in &detail.messages {
        println!("\n{}", message_block(message));
    }
}

/// Prints client side effects to stderr until every sender is gone.
pub fn spawn_event_printer(mut events: UnboundedReceiver<ClientEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ClientEvent::Notification { message } => eprintln!("error: {message}"),
                ClientEvent::RedirectToLogin => {
                    eprintln!("Run `contentlens login` to start a new session.")
                }
            }
        }
    })
}

/// Writes a streamed reply to stdout as it arrives.
#[derive(Default)]
pub struct StdoutReply {
    pub failed: Option<String>,
}

impl ChatStreamHandler for StdoutReply {
    fn on_chunk(&mut self, content: &str) {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{content}").ok();
        stdout.flush().ok();
    }

    fn on_done(&mut self) {
        println!();
    }

    fn on_error(&mut self, message: &str) {
        println!();
        self.failed = Some(message.to_owned());
    }
}
