//! One module per backend resource. Each call maps to a verb, a path and
//! its parameters; transport, auth and error handling live in
//! [`ApiClient`](crate::client::ApiClient).

pub mod analyses;
pub mod auth;
pub mod chat;
pub mod datasets;
pub mod exports;
pub mod posts;
pub mod screenshots;
pub mod settings;
