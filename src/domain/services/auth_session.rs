#[cfg(test)]
#[path = "auth_session_test.rs"]
mod tests;

use tokio::sync::watch;

use crate::domain::models::Identity;
use crate::domain::models::IdentityProvider;

/// Holds the signed in identity and broadcasts every session change.
pub struct AuthSession {
    tx: watch::Sender<Option<Identity>>,
}

impl Default for AuthSession {
    fn default() -> AuthSession {
        return AuthSession::new(None);
    }
}

impl AuthSession {
    pub fn new(identity: Option<Identity>) -> AuthSession {
        let (tx, _rx) = watch::channel(identity);
        return AuthSession { tx };
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::info!(user_id = identity.user_id, "Signed in");
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        if self.tx.borrow().is_none() {
            return;
        }

        tracing::info!("Signed out");
        self.tx.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        return self.tx.subscribe();
    }
}

impl IdentityProvider for AuthSession {
    fn current(&self) -> Option<Identity> {
        return self.tx.borrow().clone();
    }
}
