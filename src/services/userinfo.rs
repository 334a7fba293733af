//! The signed-in user's profile and enabled features.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::context::Context;
use crate::error::Result;
use crate::fetch::{ApiClient, Transport};

const BASE_PATH: &str = "v1/self";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u32,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default)]
    pub features: Vec<String>,
    pub user: User,
}

pub struct UserInfoClient<C = Transport> {
    client: Arc<C>,
}

impl UserInfoClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::clone(config.transport()))
    }
}

impl<C: ApiClient> UserInfoClient<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Fetches the current user.
    #[tracing::instrument(skip_all)]
    pub async fn get(&self, ctx: &Context) -> Result<UserInfoResponse> {
        let req = self
            .client
            .new_request::<()>(ctx, Method::GET, BASE_PATH, "", None)?;
        self.client.send_json(req).await
    }
}
