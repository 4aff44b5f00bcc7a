use super::{LoadingGuard, Revision};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{AiOutput, Analysis, AnalysisCreate, AnalysisResult, Post};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

pub const DEFAULT_RESULTS_PAGE_SIZE: u32 = 50;

#[derive(Default)]
struct AnalysisState {
    analyses: Vec<Analysis>,
    current: Option<Analysis>,
    results: Vec<AnalysisResult>,
    current_post: Option<Post>,
    current_ai_output: Option<AiOutput>,
}

pub struct AnalysisStore {
    client: ApiClient,
    state: RwLock<AnalysisState>,
    loading: RwLock<bool>,
    revision: Revision,
}

impl AnalysisStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: RwLock::new(AnalysisState::default()),
            loading: RwLock::new(false),
            revision: Revision::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn analyses(&self) -> Vec<Analysis> {
        self.state.read().analyses.clone()
    }

    pub fn current(&self) -> Option<Analysis> {
        self.state.read().current.clone()
    }

    pub fn results(&self) -> Vec<AnalysisResult> {
        self.state.read().results.clone()
    }

    pub fn current_post(&self) -> Option<Post> {
        self.state.read().current_post.clone()
    }

    pub fn current_ai_output(&self) -> Option<AiOutput> {
        self.state.read().current_ai_output.clone()
    }

    pub fn loading(&self) -> bool {
        *self.loading.read()
    }

    pub async fn fetch_analyses(
        &self,
        dataset_id: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<(), ApiError> {
        let _loading = LoadingGuard::start(&self.loading, &self.revision);
        let analyses = self.client.get_analyses(dataset_id, page, page_size).await?;
        self.state.write().analyses = analyses;
        self.revision.bump();
        Ok(())
    }

    /// Loads one analysis as current and refreshes its entry in the list,
    /// if listed.
    pub async fn fetch_analysis(&self, analysis_id: &str) -> Result<Analysis, ApiError> {
        let analysis = self.client.get_analysis(analysis_id).await?;
        {
            let mut state = self.state.write();
            if let Some(entry) = state.analyses.iter_mut().find(|a| a.id == analysis.id) {
                *entry = analysis.clone();
            }
            state.current = Some(analysis.clone());
        }
        self.revision.bump();
        Ok(analysis)
    }

    pub async fn create_analysis(
        &self,
        dataset_id: &str,
        name: Option<&str>,
        config: Option<Value>,
    ) -> Result<Analysis, ApiError> {
        self.client
            .create_analysis(&AnalysisCreate {
                dataset_id: dataset_id.to_owned(),
                name: name.map(str::to_owned),
                config,
            })
            .await
    }

    pub async fn fetch_results(
        &self,
        analysis_id: &str,
        performance: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<(), ApiError> {
        let _loading = LoadingGuard::start(&self.loading, &self.revision);
        let results = self
            .client
            .get_analysis_results(analysis_id, performance, page, page_size)
            .await?;
        self.state.write().results = results;
        self.revision.bump();
        Ok(())
    }

    pub async fn trigger_ai(&self, analysis_id: &str) -> Result<(), ApiError> {
        self.client.trigger_ai_analysis(analysis_id).await
    }

    pub async fn stop_analysis(&self, analysis_id: &str) -> Result<(), ApiError> {
        self.client.stop_analysis(analysis_id).await
    }

    pub async fn delete_analysis(&self, analysis_id: &str) -> Result<(), ApiError> {
        self.client.delete_analysis(analysis_id).await
    }

    pub async fn fetch_post(&self, post_id: &str) -> Result<Post, ApiError> {
        let post = self.client.get_post(post_id).await?;
        self.state.write().current_post = Some(post.clone());
        self.revision.bump();
        Ok(post)
    }

    /// A post without AI output yet is normal, so any failure resets the
    /// cached output to `None` instead of erroring.
    pub async fn fetch_ai_output(&self, post_id: &str, analysis_id: &str) -> Option<AiOutput> {
        let output = match self.client.get_post_ai_output(post_id, analysis_id).await {
            Ok(output) => Some(output),
            Err(err) => {
                debug!(%err, post_id, analysis_id, "no AI output available");
                None
            }
        };
        self.state.write().current_ai_output = output.clone();
        self.revision.bump();
        output
    }
}
