use propdesk_client::ApiError;

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid user data structure")]
    InvalidUserData,

    #[error("Authentication check timed out after {0}ms")]
    CheckTimeout(u64),

    #[error("Login response did not include a token")]
    MissingToken,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// True when the backend rejected the session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, SessionError::Api(err) if err.is_auth_expired())
    }
}
