//! Typed clients for the individual API services.
//!
//! Each client is generic over [`ApiClient`](crate::fetch::ApiClient) and
//! defaults to the production [`Transport`](crate::fetch::Transport);
//! `from_config` wires one up from a shared [`Config`](crate::Config).

pub mod gitsources;
pub mod repository_permissions;
pub mod teams;
pub mod userinfo;

pub use gitsources::{GitSourcesClient, LoginResponse};
pub use repository_permissions::{
    CreatePermission, ListOptions, Permission, PermissionList, RepositoryPermission,
    RepositoryPermissionsClient,
};
pub use teams::{Team, TeamCreateParameters, TeamsClient};
pub use userinfo::{User, UserInfoClient, UserInfoResponse};
