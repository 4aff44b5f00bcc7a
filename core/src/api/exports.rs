use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{ExportCreated, ExportFormat, ExportRecord, ExportStatus};
use std::path::Path;

impl ApiClient {
    pub async fn get_exports(&self) -> Result<Vec<ExportRecord>, ApiError> {
        self.request(ApiRequest::get("/exports")).await
    }

    pub async fn create_export(
        &self,
        analysis_id: &str,
        format: ExportFormat,
    ) -> Result<ExportCreated, ApiError> {
        self.request(
            ApiRequest::post("/exports")
                .segment(analysis_id)
                .segment("export")
                .query("format", format.as_str()),
        )
        .await
    }

    pub async fn get_export_status(&self, export_id: &str) -> Result<ExportStatus, ApiError> {
        self.request(ApiRequest::get("/exports").segment(export_id).segment("status"))
            .await
    }

    /// Raw file bytes; the download route is not enveloped.
    pub async fn download_export(&self, export_id: &str) -> Result<Vec<u8>, ApiError> {
        self.request_bytes(
            ApiRequest::get("/exports")
                .segment(export_id)
                .segment("download")
                .extended_timeout(),
        )
        .await
    }

    pub async fn download_export_to(
        &self,
        export_id: &str,
        target: &Path,
    ) -> Result<u64, ApiError> {
        let bytes = self.download_export(export_id).await?;
        if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, &bytes).await?;
        tracing::info!(export_id, path = %target.display(), bytes = bytes.len(), "export saved");
        Ok(bytes.len() as u64)
    }
}
