use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::models::{Credentials, LoginResponse, Registration, User};
use serde_json::json;

impl ApiClient {
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.request(ApiRequest::post("/auth/login").json(json!({
            "username": credentials.username,
            "password": credentials.password,
        })))
        .await
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        self.request(ApiRequest::post("/auth/register").json(json!({
            "username": registration.username,
            "email": registration.email,
            "password": registration.password,
        })))
        .await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.request(ApiRequest::get("/auth/me")).await
    }
}
