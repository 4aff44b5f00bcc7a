use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{Dataset, Page};
use crate::transport::{FileUpload, FormPart};

impl ApiClient {
    /// Multipart upload with `name` and `file` fields, on the extended timeout.
    pub async fn upload_dataset(&self, name: &str, file: FileUpload) -> Result<Dataset, ApiError> {
        self.request(
            ApiRequest::post("/datasets/upload")
                .multipart(vec![FormPart::text("name", name), FormPart::file("file", file)])
                .extended_timeout(),
        )
        .await
    }

    pub async fn get_datasets(&self, page: u32, page_size: u32) -> Result<Page<Dataset>, ApiError> {
        self.request(
            ApiRequest::get("/datasets")
                .query("page", page)
                .query("page_size", page_size),
        )
        .await
    }

    pub async fn get_dataset(&self, dataset_id: &str) -> Result<Dataset, ApiError> {
        self.request(ApiRequest::get("/datasets").segment(dataset_id))
            .await
    }

    pub async fn delete_dataset(&self, dataset_id: &str) -> Result<(), ApiError> {
        self.request::<serde_json::Value>(ApiRequest::delete("/datasets").segment(dataset_id))
            .await
            .map(drop)
    }
}
