use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{Settings, SettingsUpdate};

impl ApiClient {
    pub async fn get_settings(&self) -> Result<Settings, ApiError> {
        self.request(ApiRequest::get("/settings")).await
    }

    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings, ApiError> {
        self.request(ApiRequest::put("/settings").json(serde_json::to_value(update)?))
            .await
    }

    /// Asks the backend to validate the configured provider key.
    pub async fn test_api_key(&self) -> Result<serde_json::Value, ApiError> {
        self.request(ApiRequest::post("/settings/test-api-key")).await
    }
}
