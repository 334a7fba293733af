//! Team management.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::context::Context;
use crate::error::Result;
use crate::fetch::{ApiClient, Transport};

const BASE_PATH: &str = "v1/teams";

/// Body of a team creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamCreateParameters {
    pub name: String,
    pub organization_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub account_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

pub struct TeamsClient<C = Transport> {
    client: Arc<C>,
}

impl TeamsClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::clone(config.transport()))
    }
}

impl<C: ApiClient> TeamsClient<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self, ctx, params), fields(name = %params.name))]
    pub async fn create(&self, ctx: &Context, params: &TeamCreateParameters) -> Result<Team> {
        let req = self
            .client
            .new_request(ctx, Method::POST, BASE_PATH, "", Some(params))?;
        self.client.send_json(req).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &Context, id: Uuid) -> Result<Team> {
        let req = self
            .client
            .new_request::<()>(ctx, Method::GET, BASE_PATH, &id.to_string(), None)?;
        self.client.send_json(req).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, id: Uuid) -> Result<()> {
        let req = self
            .client
            .new_request::<()>(ctx, Method::DELETE, BASE_PATH, &id.to_string(), None)?;
        self.client.send(req).await
    }
}
