use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{AiOutput, AiOutputHistory, AiOutputUpdate, Post, PostAnalysisResult};
use serde_json::json;

impl ApiClient {
    pub async fn get_post(&self, post_id: &str) -> Result<Post, ApiError> {
        self.request(ApiRequest::get("/posts").segment(post_id)).await
    }

    pub async fn get_post_ai_output(
        &self,
        post_id: &str,
        analysis_id: &str,
    ) -> Result<AiOutput, ApiError> {
        self.request(
            ApiRequest::get("/posts")
                .segment(post_id)
                .segment("ai-output")
                .query("analysis_id", analysis_id),
        )
        .await
    }

    pub async fn update_post_ai_output(
        &self,
        post_id: &str,
        analysis_id: &str,
        update: &AiOutputUpdate,
    ) -> Result<AiOutput, ApiError> {
        self.request(
            ApiRequest::put("/posts")
                .segment(post_id)
                .segment("ai-output")
                .query("analysis_id", analysis_id)
                .json(serde_json::to_value(update)?),
        )
        .await
    }

    pub async fn get_post_ai_output_history(
        &self,
        post_id: &str,
        analysis_id: &str,
    ) -> Result<Vec<AiOutputHistory>, ApiError> {
        self.request(
            ApiRequest::get("/posts")
                .segment(post_id)
                .segment("ai-output")
                .segment("history")
                .query("analysis_id", analysis_id),
        )
        .await
    }

    pub async fn rollback_post_ai_output(
        &self,
        post_id: &str,
        analysis_id: &str,
        history_id: &str,
    ) -> Result<AiOutput, ApiError> {
        self.request(
            ApiRequest::post("/posts")
                .segment(post_id)
                .segment("ai-output")
                .segment("rollback")
                .query("analysis_id", analysis_id)
                .json(json!({ "history_id": history_id })),
        )
        .await
    }

    pub async fn get_post_analysis_result(
        &self,
        post_id: &str,
        analysis_id: &str,
    ) -> Result<PostAnalysisResult, ApiError> {
        self.request(
            ApiRequest::get("/posts")
                .segment(post_id)
                .segment("analysis-result")
                .query("analysis_id", analysis_id),
        )
        .await
    }
}
