pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod stores;
pub mod stream;
pub mod telemetry;
pub mod transport;

pub use api::chat::ConversationFilter;
pub use client::{ApiClient, ApiClientBuilder, ApiRequest};
pub use config::{ClientSettings, ConfigError, RetryPolicy};
pub use error::{ApiError, StorageError, TransportError};
pub use events::{ClientEvent, EventBus};
pub use middleware::{AuthLayer, Middleware, Next, RetryLayer};
pub use navigation::{guard, Navigation, Route};
pub use session::Session;
pub use storage::LocalStorage;
pub use stores::{AnalysisStore, AuthStore, DatasetStore};
pub use stream::{read_event_stream, ChatEvent, ChatStreamHandler, EventLog, StreamOutcome};
pub use transport::{FileUpload, ReqwestTransport, ScriptedTransport, Transport};
