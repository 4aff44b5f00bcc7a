use clap::{Args, Parser, Subcommand, ValueEnum};
use contentlens_core::models::{ContextType, ExportFormat};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "contentlens",
    version,
    about = "Command line client for the ContentLens analytics backend"
)]
pub struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long, global = true, env = "CONTENTLENS_API_BASE_URL")]
    pub base_url: Option<String>,
    /// Print raw JSON instead of the summary view.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session token.
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "CONTENTLENS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long, short)]
        username: String,
        #[arg(long, short)]
        email: String,
        #[arg(long, short, env = "CONTENTLENS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the logged in user.
    Whoami,
    #[command(subcommand)]
    Datasets(DatasetCommand),
    #[command(subcommand)]
    Analyses(AnalysisCommand),
    #[command(subcommand)]
    Posts(PostCommand),
    #[command(subcommand)]
    Exports(ExportCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Ask the AI provider to review a post screenshot.
    Screenshot { file: PathBuf },
    #[command(subcommand)]
    Chat(ChatCommand),
}

#[derive(Args, Debug, Clone, Copy)]
pub struct Paging {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub page_size: u32,
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    List {
        #[command(flatten)]
        paging: Paging,
    },
    Show { id: String },
    /// Upload a spreadsheet export of post metrics.
    Upload {
        #[arg(long, short)]
        name: String,
        file: PathBuf,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum AnalysisCommand {
    List {
        #[arg(long)]
        dataset: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    Create {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        name: Option<String>,
    },
    Show { id: String },
    Results {
        id: String,
        /// Only results in this performance bucket, e.g. `high` or `low`.
        #[arg(long)]
        performance: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
    },
    /// Start AI review of an analysis.
    Ai { id: String },
    Stop { id: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PostCommand {
    Show { id: String },
    AiOutput {
        id: String,
        #[arg(long)]
        analysis: String,
    },
    History {
        id: String,
        #[arg(long)]
        analysis: String,
    },
    Rollback {
        id: String,
        #[arg(long)]
        analysis: String,
        #[arg(long)]
        history: String,
    },
    /// Replace the summary of a post's AI output.
    EditSummary {
        id: String,
        #[arg(long)]
        analysis: String,
        summary: String,
    },
    Result {
        id: String,
        #[arg(long)]
        analysis: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    List,
    Create {
        analysis: String,
        #[arg(long, value_enum, default_value_t = FormatArg::Excel)]
        format: FormatArg,
    },
    Status { id: String },
    Download {
        id: String,
        #[arg(long, short)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        deepseek_key: Option<String>,
        #[arg(long)]
        openai_key: Option<String>,
        #[arg(long)]
        iflow_key: Option<String>,
        #[arg(long)]
        iflow_model: Option<String>,
    },
    TestKey,
}

#[derive(Subcommand, Debug)]
pub enum ChatCommand {
    New {
        #[arg(long)]
        title: Option<String>,
        /// Scope the conversation to an analysis.
        #[arg(long)]
        analysis: Option<String>,
    },
    /// Open a conversation about one analysis result.
    FromResult { result: String },
    List {
        #[arg(long, value_enum)]
        context: Option<ContextArg>,
        #[arg(long)]
        analysis: Option<String>,
    },
    Show { id: String },
    /// Send a message and stream the reply to stdout.
    Send { id: String, message: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Excel,
    Pdf,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Excel => ExportFormat::Excel,
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextArg {
    General,
    Analysis,
    AnalysisResult,
}

impl From<ContextArg> for ContextType {
    fn from(value: ContextArg) -> Self {
        match value {
            ContextArg::General => ContextType::General,
            ContextArg::Analysis => ContextType::Analysis,
            ContextArg::AnalysisResult => ContextType::AnalysisResult,
        }
    }
}
