//! Explicit session context shared by every gateway.
//!
//! Token lookups are a function of this injected handle; there is no
//! process-wide auth state.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use aquaroute_core::UserId;

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Delivery driver.
    Repartidor,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    user: Option<SessionUser>,
}

/// Cheaply cloneable handle to the current session.
///
/// Clones observe each other's `sign_in`/`sign_out`.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Session>>,
}

impl SessionContext {
    /// A signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>, user: SessionUser) -> Self {
        let ctx = Self::new();
        ctx.sign_in(token, user);
        ctx
    }

    pub fn sign_in(&self, token: impl Into<String>, user: SessionUser) {
        let mut session = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        session.token = Some(token.into());
        session.user = Some(user);
    }

    pub fn sign_out(&self) {
        let mut session = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        session.token = None;
        session.user = None;
    }

    /// Bearer token for the next request, if signed in.
    pub fn bearer(&self) -> Option<String> {
        self.inner.read().ok().and_then(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.inner.read().ok().and_then(|s| s.user.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.inner.read().ok().and_then(|s| s.user.as_ref().map(|u| u.id))
    }

    pub fn is_signed_in(&self) -> bool {
        self.bearer().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> SessionUser {
        SessionUser {
            id: UserId::new(4),
            name: "Rosa".to_string(),
            email: "rosa@example.com".to_string(),
            role: Role::Repartidor,
        }
    }

    #[test]
    fn clones_share_sign_in_state() {
        let ctx = SessionContext::new();
        let gateway_view = ctx.clone();
        assert!(!gateway_view.is_signed_in());

        ctx.sign_in("tok-1", driver());
        assert_eq!(gateway_view.bearer().as_deref(), Some("tok-1"));
        assert_eq!(gateway_view.user_id(), Some(UserId::new(4)));

        ctx.sign_out();
        assert!(gateway_view.bearer().is_none());
        assert!(gateway_view.user().is_none());
    }
}
