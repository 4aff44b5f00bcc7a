use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::ScreenshotAnalysis;
use crate::transport::{FileUpload, FormPart};

impl ApiClient {
    /// Upload an image for AI review. The backend rejects non-image types.
    pub async fn analyze_screenshot(
        &self,
        file: FileUpload,
    ) -> Result<ScreenshotAnalysis, ApiError> {
        self.request(
            ApiRequest::post("/screenshots/analyze")
                .multipart(vec![FormPart::file("file", file)])
                .extended_timeout(),
        )
        .await
    }
}
