use super::Revision;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Credentials, Registration, User};
use tokio::sync::watch;
use tracing::{info, warn};

/// Login state on top of the shared [`Session`](crate::session::Session).
pub struct AuthStore {
    client: ApiClient,
    revision: Revision,
}

impl AuthStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            revision: Revision::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.client.session().token()
    }

    pub fn user(&self) -> Option<User> {
        self.client.session().user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.session().is_logged_in()
    }

    /// Exchange credentials for a token, persist it, then load the profile.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, ApiError> {
        let response = self
            .client
            .login(&Credentials {
                username: username.to_owned(),
                password: password.to_owned(),
            })
            .await?;
        self.client.session().set_token(response.access_token)?;
        self.revision.bump();
        info!(username, "logged in");
        Ok(self.fetch_user().await)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        self.client
            .register(&Registration {
                username: username.to_owned(),
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .await
    }

    /// Refresh the profile for the stored token. Does nothing without a
    /// token; a 401 logs out, other failures leave the state as it was.
    pub async fn fetch_user(&self) -> Option<User> {
        if !self.is_logged_in() {
            return None;
        }
        match self.client.current_user().await {
            Ok(user) => {
                self.client.session().set_user(Some(user.clone()));
                self.revision.bump();
                Some(user)
            }
            Err(err) => {
                if err.status() == Some(401) {
                    self.logout();
                } else {
                    warn!(%err, "failed to load current user");
                }
                None
            }
        }
    }

    pub fn logout(&self) {
        if let Err(err) = self.client.session().clear() {
            warn!(%err, "failed to remove persisted token");
        }
        self.revision.bump();
    }
}
