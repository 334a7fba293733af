//! Team permissions on repositories within an organization.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fetch::{ApiClient, Transport};

const BASE_PATH: &str = "v1/repoPermissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Admin,
    Read,
    Write,
    View,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Admin => "admin",
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::View => "view",
        };
        f.write_str(s)
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Permission::Admin),
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "view" => Ok(Permission::View),
            other => Err(format!("unknown permission {other:?}, expected admin|read|write|view")),
        }
    }
}

/// Grants `permission` on `repository` to a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermission {
    pub repository: String,
    pub permission: Permission,
}

#[derive(Debug, Serialize)]
struct PermissionBody {
    permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPermission {
    #[serde(default)]
    pub account_id: u32,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub repository_id: Option<Uuid>,
    #[serde(default)]
    pub repository_name: String,
    pub privilege: Permission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionList {
    #[serde(default)]
    pub permissions: Vec<RepositoryPermission>,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub count: u32,
}

/// Page selection for [`RepositoryPermissionsClient::list_page`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl ListOptions {
    /// The sub-path suffix selecting this page, empty when nothing is set.
    fn query(&self) -> Result<String> {
        let query = serde_urlencoded::to_string(self).map_err(|e| Error::Request(e.to_string()))?;
        Ok(if query.is_empty() {
            query
        } else {
            format!("?{query}")
        })
    }
}

pub struct RepositoryPermissionsClient<C = Transport> {
    client: Arc<C>,
}

impl RepositoryPermissionsClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::clone(config.transport()))
    }
}

impl<C: ApiClient> RepositoryPermissionsClient<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    fn prefix(organization: &str, team: Uuid) -> String {
        format!("{BASE_PATH}/{organization}/teams/{team}")
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn create(
        &self,
        ctx: &Context,
        organization: &str,
        team: Uuid,
        params: &CreatePermission,
    ) -> Result<()> {
        let body = PermissionBody {
            permission: params.permission,
        };
        let req = self.client.new_request(
            ctx,
            Method::PUT,
            &Self::prefix(organization, team),
            &params.repository,
            Some(&body),
        )?;
        self.client.send(req).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(
        &self,
        ctx: &Context,
        organization: &str,
        team: Uuid,
        repository: &str,
    ) -> Result<()> {
        let req = self.client.new_request::<()>(
            ctx,
            Method::DELETE,
            &Self::prefix(organization, team),
            repository,
            None,
        )?;
        self.client.send(req).await
    }

    pub async fn list(&self, ctx: &Context, organization: &str, team: Uuid) -> Result<PermissionList> {
        self.list_page(ctx, organization, team, ListOptions::default())
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_page(
        &self,
        ctx: &Context,
        organization: &str,
        team: Uuid,
        options: ListOptions,
    ) -> Result<PermissionList> {
        let req = self.client.new_request::<()>(
            ctx,
            Method::GET,
            &Self::prefix(organization, team),
            &options.query()?,
            None,
        )?;
        self.client.send_json(req).await
    }
}
