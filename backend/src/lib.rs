pub mod auth;
pub mod config;
pub mod graphql;
pub mod models;
pub mod routes;
pub mod store;

pub use auth::{authorize, AuthError, JwksClient, Profile};
pub use config::Config;
pub use graphql::{build_schema, AppSchema, Caller};
pub use models::{Role, User};
pub use store::{StoreError, UserStore};

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub jwks_client: JwksClient,
    pub store: Arc<UserStore>,
    pub schema: AppSchema,
}
