//! Error types for the client.

use crate::api_client::ApiClientError;
use crate::config::ConfigError;
use crate::session::SessionStoreError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Session(#[from] SessionStoreError),
    #[error("no user_id in session store {0}; sign in first")]
    MissingUser(String),
}
