//! Records mirrored from the analytics backend.
//!
//! The backend owns every lifecycle field; the client only keeps the latest
//! snapshot it fetched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DatasetStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub original_filename: String,
    pub status: DatasetStatus,
    #[serde(default)]
    pub row_count: i64,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub dataset_id: String,
    pub data_id: String,
    #[serde(default, with = "timestamp::option")]
    pub publish_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_link: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub post_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub style_info: Option<String>,
    #[serde(default)]
    pub read_7d: Option<f64>,
    #[serde(default)]
    pub interact_7d: Option<f64>,
    #[serde(default)]
    pub visit_7d: Option<f64>,
    #[serde(default)]
    pub want_7d: Option<f64>,
    #[serde(default)]
    pub read_14d: Option<f64>,
    #[serde(default)]
    pub interact_14d: Option<f64>,
    #[serde(default)]
    pub visit_14d: Option<f64>,
    #[serde(default)]
    pub want_14d: Option<f64>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    AiProcessing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AnalysisStatus {
    /// Whether the backend will still move this analysis forward.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Analyzing | Self::AiProcessing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analysis {
    pub id: String,
    pub dataset_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisCreate {
    pub dataset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultData {
    pub performance: String,
    #[serde(default)]
    pub problem_metrics: Vec<String>,
    #[serde(default)]
    pub highlight_metrics: Vec<String>,
    #[serde(default)]
    pub compare_to_avg: BTreeMap<String, String>,
    #[serde(default)]
    pub percentile_ranks: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub id: String,
    pub analysis_id: String,
    pub post_id: String,
    #[serde(default)]
    pub performance: Option<String>,
    #[serde(default)]
    pub result_data: Option<ResultData>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub post_data_id: Option<String>,
    #[serde(default)]
    pub post_content_type: Option<String>,
    #[serde(default)]
    pub post_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiOutput {
    pub id: String,
    pub analysis_result_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub strengths: Option<Vec<String>>,
    #[serde(default)]
    pub weaknesses: Option<Vec<String>>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Partial edit of an AI output; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AiOutputUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiOutputHistory {
    pub id: String,
    pub ai_output_id: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub strengths: Option<Vec<String>>,
    #[serde(default)]
    pub weaknesses: Option<Vec<String>>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostAnalysisResult {
    pub analysis_result_id: String,
    #[serde(default)]
    pub performance: Option<String>,
    #[serde(default)]
    pub result_data: Option<Value>,
    #[serde(default)]
    pub ai_output: Option<AiOutput>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Excel,
    Pdf,
    Json,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportRecord {
    pub id: String,
    pub analysis_id: String,
    #[serde(default)]
    pub analysis_name: Option<String>,
    pub format: ExportFormat,
    pub status: ExportState,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportStatus {
    pub id: String,
    pub status: ExportState,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExportCreated {
    pub export_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub id: String,
    pub user_id: String,
    pub ai_provider: String,
    #[serde(default)]
    pub has_deepseek_key: bool,
    #[serde(default)]
    pub has_openai_key: bool,
    #[serde(default)]
    pub has_iflow_key: bool,
    #[serde(default)]
    pub iflow_model: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepseek_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iflow_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iflow_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenshotAnalysis {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub tokens_used: Option<TokenUsage>,
    #[serde(default)]
    pub image_path: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    #[default]
    General,
    Analysis,
    AnalysisResult,
}

impl ContextType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Analysis => "analysis",
            Self::AnalysisResult => "analysis_result",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub context_type: ContextType,
    #[serde(default)]
    pub context_analysis_id: Option<String>,
    #[serde(default)]
    pub context_analysis_result_id: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub context_type: ContextType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_analysis_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_analysis_result_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, alias = "metadata")]
    pub extra_data: Option<Value>,
    #[serde(default)]
    pub tokens_used: Option<Value>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Backend timestamps come either offset-qualified or naive; naive ones are UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&value.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn naive_and_offset_timestamps_parse() {
        let naive = timestamp::parse("2025-03-01T08:30:00.123456").unwrap();
        let offset = timestamp::parse("2025-03-01T09:30:00+01:00").unwrap();
        assert_eq!(naive.timestamp(), offset.timestamp());
        assert_eq!(
            timestamp::parse("2025-03-01T08:30:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()
        );
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn analysis_status_reads_snake_case() {
        let analysis: Analysis = serde_json::from_value(json!({
            "id": "a1",
            "dataset_id": "ds1",
            "status": "ai_processing",
            "progress": "40%",
            "created_at": "2025-01-02T03:04:05"
        }))
        .unwrap();
        assert_eq!(analysis.status, AnalysisStatus::AiProcessing);
        assert!(analysis.status.is_active());
        assert!(analysis.completed_at.is_none());
    }

    #[test]
    fn unknown_status_does_not_fail_decoding() {
        let dataset: Dataset = serde_json::from_value(json!({
            "id": "ds1",
            "name": "March",
            "original_filename": "march.xlsx",
            "status": "archived",
            "row_count": 12,
            "created_at": "2025-01-02T03:04:05",
            "updated_at": "2025-01-02T03:04:05"
        }))
        .unwrap();
        assert_eq!(dataset.status, DatasetStatus::Unknown);
    }

    #[test]
    fn conversation_detail_flattens_summary_fields() {
        let detail: ConversationDetail = serde_json::from_value(json!({
            "id": "c1",
            "title": null,
            "context_type": "analysis_result",
            "created_at": "2025-01-02T03:04:05",
            "updated_at": "2025-01-02T03:04:05",
            "messages": [{
                "id": "m1",
                "role": "assistant",
                "content": "hi",
                "metadata": {"source": "stream"},
                "created_at": "2025-01-02T03:04:06"
            }]
        }))
        .unwrap();
        assert_eq!(detail.conversation.context_type, ContextType::AnalysisResult);
        assert_eq!(detail.messages[0].role, MessageRole::Assistant);
        assert!(detail.messages[0].extra_data.is_some());
    }

    #[test]
    fn partial_updates_skip_absent_fields() {
        let update = AiOutputUpdate {
            summary: Some("tighter hook".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"summary": "tighter hook"})
        );
    }
}
