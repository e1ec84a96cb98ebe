//! The current authentication outcome.

use serde::Serialize;
use utoipa::ToSchema;

use crate::identity::{AuthError, Principal, SessionEvent};

/// Effective display state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the first provider notification.
    Loading,
    /// A principal is signed in.
    Authenticated,
    /// Nobody is signed in.
    Unauthenticated,
    /// The provider failed to determine the session state.
    Failed,
}

/// Latest authentication outcome as seen by the session watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    principal: Option<Principal>,
    error: Option<AuthError>,
    loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::loading()
    }
}

impl Session {
    /// A session that has not heard from the provider yet.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            principal: None,
            error: None,
            loading: true,
        }
    }

    /// A settled session with nobody signed in.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            principal: None,
            error: None,
            loading: false,
        }
    }

    /// A settled session for `principal`.
    #[must_use]
    pub const fn signed_in(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            error: None,
            loading: false,
        }
    }

    /// A settled, fail-closed session carrying `error`.
    #[must_use]
    pub const fn failed(error: AuthError) -> Self {
        Self {
            principal: None,
            error: Some(error),
            loading: false,
        }
    }

    /// The session that results from applying `event`.
    #[must_use]
    pub fn from_event(event: SessionEvent) -> Self {
        match event {
            SessionEvent::SignedIn(principal) => Self::signed_in(principal),
            SessionEvent::SignedOut => Self::signed_out(),
            SessionEvent::Failed(error) => Self::failed(error),
        }
    }

    /// Whether the session is still waiting for the provider.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The signed-in principal, unless the session is loading or failed.
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        if self.loading || self.error.is_some() {
            return None;
        }
        self.principal.as_ref()
    }

    /// Whether the session is authenticated and free of errors.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }

    /// The last error surfaced by the provider, if not yet dismissed.
    #[must_use]
    pub const fn error(&self) -> Option<&AuthError> {
        self.error.as_ref()
    }

    /// The single effective display state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.loading {
            SessionState::Loading
        } else if self.error.is_some() {
            SessionState::Failed
        } else if self.principal.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Clears the error after the user acknowledged it.
    ///
    /// Returns `true` if there was an error to clear.
    pub fn clear_error(&mut self) -> bool {
        self.error.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SignInMethod;

    fn principal() -> Principal {
        Principal {
            uid: "u1".into(),
            email: Some("a@b.com".into()),
            display_name: None,
            photo_url: None,
            email_verified: false,
            sign_in_method: SignInMethod::Password,
        }
    }

    #[test]
    fn test_new_session_is_loading() {
        let session = Session::default();
        assert_eq!(session.state(), SessionState::Loading);
        assert!(session.principal().is_none());
    }

    #[test]
    fn test_events_settle_the_session() {
        let session = Session::from_event(SessionEvent::SignedIn(principal()));
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.principal().map(|p| p.uid.as_str()), Some("u1"));

        let session = Session::from_event(SessionEvent::SignedOut);
        assert_eq!(session.state(), SessionState::Unauthenticated);

        let session = Session::from_event(SessionEvent::Failed(AuthError::NetworkFailed));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.error(), Some(&AuthError::NetworkFailed));
        assert!(!session.is_loading());
    }

    #[test]
    fn test_failed_session_never_exposes_principal() {
        let mut session = Session::signed_in(principal());
        session.error = Some(AuthError::NetworkFailed);
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_clear_error() {
        let mut session = Session::failed(AuthError::RateLimited);
        assert!(session.clear_error());
        assert!(!session.clear_error());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }
}
