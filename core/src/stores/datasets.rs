use super::{LoadingGuard, Revision};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::Dataset;
use crate::transport::FileUpload;
use parking_lot::RwLock;
use tokio::sync::watch;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Default)]
struct DatasetState {
    datasets: Vec<Dataset>,
    total: u64,
    current: Option<Dataset>,
}

pub struct DatasetStore {
    client: ApiClient,
    state: RwLock<DatasetState>,
    loading: RwLock<bool>,
    revision: Revision,
}

impl DatasetStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: RwLock::new(DatasetState::default()),
            loading: RwLock::new(false),
            revision: Revision::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn datasets(&self) -> Vec<Dataset> {
        self.state.read().datasets.clone()
    }

    pub fn total(&self) -> u64 {
        self.state.read().total
    }

    pub fn current(&self) -> Option<Dataset> {
        self.state.read().current.clone()
    }

    pub fn loading(&self) -> bool {
        *self.loading.read()
    }

    pub async fn fetch_datasets(&self, page: u32, page_size: u32) -> Result<(), ApiError> {
        let _loading = LoadingGuard::start(&self.loading, &self.revision);
        let page = self.client.get_datasets(page, page_size).await?;
        {
            let mut state = self.state.write();
            state.datasets = page.items;
            state.total = page.total;
        }
        self.revision.bump();
        Ok(())
    }

    pub async fn fetch_dataset(&self, dataset_id: &str) -> Result<Dataset, ApiError> {
        let dataset = self.client.get_dataset(dataset_id).await?;
        self.state.write().current = Some(dataset.clone());
        self.revision.bump();
        Ok(dataset)
    }

    /// Uploads leave the list alone; callers refetch to see the new entry.
    pub async fn upload_dataset(&self, name: &str, file: FileUpload) -> Result<Dataset, ApiError> {
        self.client.upload_dataset(name, file).await
    }

    pub async fn delete_dataset(&self, dataset_id: &str) -> Result<(), ApiError> {
        self.client.delete_dataset(dataset_id).await?;
        {
            let mut state = self.state.write();
            state.datasets.retain(|dataset| dataset.id != dataset_id);
            state.total = state.total.saturating_sub(1);
        }
        self.revision.bump();
        Ok(())
    }
}
