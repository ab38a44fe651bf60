//! # PropDesk Session
//!
//! Client-side session for the PropDesk dashboards.
//!
//! - [`storage`]: `KeyValueStore` backends (`MemoryStore`, `FileStore`)
//! - [`cookies`]: The cookie mirror read by the edge guard
//! - [`tokens`]: `TokenStorage`, the single write path for token, role and user
//! - [`user`]: `UserRecord` and the ordered user-envelope decode
//! - [`role`]: The role chain (`roles[0]`, `role`, stored tag, path)
//! - [`state`]: `AuthState`, the per-tab auth holder
//! - [`sync`]: Cross-tab logout detection
//! - [`ui`]: Progress and notice state fed by the API client
//!
//! # Example
//!
//! ```ignore
//! let storage = Arc::new(TokenStorage::new(FileStore::open(&config.storage_dir)?, &config));
//! let session = Session::open(storage, ApiConfig::from_env(), config, navigator)?;
//! let _sync = session.start_sync();
//!
//! if session.auth.check_auth().await {
//!     println!("Signed in as {:?}", session.auth.current_role());
//! }
//! ```

pub mod cookies;
pub mod error;
pub mod role;
pub mod state;
pub mod storage;
pub mod sync;
pub mod tokens;
pub mod ui;
pub mod user;

use std::sync::Arc;

use propdesk_client::ApiClient;
use propdesk_config::{ApiConfig, SessionConfig};
use propdesk_core::Navigator;

// Re-export commonly used types at crate root
pub use cookies::{Cookie, CookieJar, SameSite};
pub use error::SessionError;
pub use role::{RoleSource, derive_role};
pub use state::{AuthSnapshot, AuthState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{SessionSync, SyncHandle, SyncOutcome};
pub use tokens::{MirrorSnapshot, SessionTokens, StorageEvent, TokenStorage};
pub use ui::{UiSnapshot, UiState};
pub use user::{UserEnvelope, UserRecord, decode_user};

/// One tab: storage, UI state, API client and auth holder wired together.
#[derive(Debug, Clone)]
pub struct Session {
    pub storage: Arc<TokenStorage>,
    pub ui: Arc<UiState>,
    pub auth: Arc<AuthState>,
}

impl Session {
    pub fn open(
        storage: Arc<TokenStorage>,
        api: ApiConfig,
        config: SessionConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        let ui = Arc::new(UiState::new());
        let tokens = Arc::new(SessionTokens::new(
            Arc::clone(&storage),
            Arc::clone(&navigator),
        ));
        let client = ApiClient::new(api, tokens)?.with_feedback(ui.clone());
        let auth = Arc::new(AuthState::new(
            Arc::clone(&storage),
            client,
            navigator,
            config,
        ));

        Ok(Self { storage, ui, auth })
    }

    pub fn client(&self) -> &ApiClient {
        self.auth.client()
    }

    /// Starts cross-tab sync at the configured poll interval.
    pub fn start_sync(&self) -> SyncHandle {
        let interval = self.auth.config().poll_interval();
        Arc::new(SessionSync::new(Arc::clone(&self.auth), interval)).start()
    }
}
