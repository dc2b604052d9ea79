use async_trait::async_trait;

use crate::manager::TokenLifecycleManager;

/// Read-only access to the current access token.
///
/// This is what a playback engine is handed when it needs to authenticate;
/// it can never write or renew credentials through it.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}

#[async_trait]
impl TokenSource for TokenLifecycleManager {
    async fn access_token(&self) -> Option<String> {
        self.current_token()
    }
}
