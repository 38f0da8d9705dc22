use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use shared_models::auth::{Identity, User};

/// The signed-in patient of one client session.
///
/// Created signed-out, filled on sign-in, cleared on sign-out. Every change
/// is broadcast to subscribers. Cloning shares the same session.
#[derive(Clone, Debug)]
pub struct SessionContext {
    sender: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let session = Self::new();
        session.sign_in(identity);
        session
    }

    pub fn from_user(user: &User) -> Self {
        Self::signed_in(Identity::from(user))
    }

    pub fn sign_in(&self, identity: Identity) {
        info!("Session signed in as {}", identity.uid);
        self.sender.send_replace(Some(identity));
    }

    /// Returns the identity that was signed in, if any.
    pub fn sign_out(&self) -> Option<Identity> {
        let previous = self.sender.send_replace(None);
        if let Some(identity) = &previous {
            info!("Session signed out ({})", identity.uid);
        }
        previous
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.sender.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Change notifications for sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.sender.subscribe()
    }
}
