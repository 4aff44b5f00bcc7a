use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{Analysis, AnalysisCreate, AnalysisResult};

impl ApiClient {
    pub async fn create_analysis(&self, analysis: &AnalysisCreate) -> Result<Analysis, ApiError> {
        self.request(ApiRequest::post("/analyses").json(serde_json::to_value(analysis)?))
            .await
    }

    /// `GET /analyses`, optionally narrowed to one dataset.
    pub async fn get_analyses(
        &self,
        dataset_id: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Analysis>, ApiError> {
        self.request(
            ApiRequest::get("/analyses")
                .query_opt("dataset_id", dataset_id)
                .query("page", page)
                .query("page_size", page_size),
        )
        .await
    }

    pub async fn get_analysis(&self, analysis_id: &str) -> Result<Analysis, ApiError> {
        self.request(ApiRequest::get("/analyses").segment(analysis_id))
            .await
    }

    /// Result pages can be large; this call uses the extended timeout.
    pub async fn get_analysis_results(
        &self,
        analysis_id: &str,
        performance: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<AnalysisResult>, ApiError> {
        self.request(
            ApiRequest::get("/analyses")
                .segment(analysis_id)
                .segment("results")
                .query("page", page)
                .query("page_size", page_size)
                .query_opt("performance", performance)
                .extended_timeout(),
        )
        .await
    }

    pub async fn trigger_ai_analysis(&self, analysis_id: &str) -> Result<(), ApiError> {
        self.request::<serde_json::Value>(
            ApiRequest::post("/analyses").segment(analysis_id).segment("ai"),
        )
        .await
        .map(drop)
    }

    pub async fn stop_analysis(&self, analysis_id: &str) -> Result<(), ApiError> {
        self.request::<serde_json::Value>(
            ApiRequest::post("/analyses").segment(analysis_id).segment("stop"),
        )
        .await
        .map(drop)
    }

    pub async fn delete_analysis(&self, analysis_id: &str) -> Result<(), ApiError> {
        self.request::<serde_json::Value>(ApiRequest::delete("/analyses").segment(analysis_id))
            .await
            .map(drop)
    }
}
