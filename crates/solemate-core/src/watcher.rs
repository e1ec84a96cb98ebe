//! Session watcher.
//!
//! Owns the single live subscription to the identity provider and publishes
//! the latest [`Session`] on a `tokio::sync::watch` channel. Observers (the
//! [`NavigationGate`]) read the published value, never the raw notification
//! channel.
//!
//! Every activation gets a fresh epoch. Updates re-check the epoch while
//! holding the watch channel's lock, and teardown bumps it under the same
//! lock, so a notification that is in flight when [`SessionWatcher::deactivate`]
//! runs is discarded instead of applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gate::NavigationGate;
use crate::identity::{AuthError, IdentityProvider, SessionEvent, Subscription, SubscriptionId};
use crate::session::Session;

/// Errors from watcher lifecycle calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatcherError {
    /// `activate` was called while a subscription is already live.
    #[error("Session watcher is already active; deactivate it before activating again")]
    AlreadyActive,
}

struct ActiveSubscription {
    id: SubscriptionId,
    task: JoinHandle<()>,
}

/// Translates identity provider notifications into [`Session`] values.
pub struct SessionWatcher {
    provider: Arc<dyn IdentityProvider>,
    session: watch::Sender<Session>,
    epoch: Arc<AtomicU64>,
    active: Option<ActiveSubscription>,
    torn_down: bool,
}

impl SessionWatcher {
    /// Creates an inactive watcher. The session starts out loading.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (session, _) = watch::channel(Session::loading());
        Self {
            provider,
            session,
            epoch: Arc::new(AtomicU64::new(0)),
            active: None,
            torn_down: false,
        }
    }

    /// Registers the listener and starts applying notifications.
    ///
    /// Must be called from within a tokio runtime. If the provider refuses
    /// the subscription, the session settles as unauthenticated with the
    /// provider's error instead of staying in loading.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::AlreadyActive`] if a subscription is live; the
    /// existing subscription is left untouched.
    pub fn activate(&mut self) -> Result<(), WatcherError> {
        if self.active.is_some() {
            warn!("Ignoring second activation of session watcher");
            return Err(WatcherError::AlreadyActive);
        }

        self.torn_down = false;
        let epoch = self.begin_epoch();

        match self.provider.subscribe() {
            Ok(Subscription { id, events }) => {
                info!(subscription = id.0, epoch, "Session watcher activated");
                let task = tokio::spawn(consume(
                    events,
                    self.session.clone(),
                    Arc::clone(&self.epoch),
                    epoch,
                ));
                self.active = Some(ActiveSubscription { id, task });
            }
            Err(err) => {
                error!(error = %err, code = err.code(), "Identity provider subscription failed");
                self.session.send_replace(Session::failed(err));
            }
        }

        Ok(())
    }

    /// Unregisters the listener.
    ///
    /// Safe to call repeatedly; the provider's unsubscribe runs at most once
    /// per activation. Returns `true` if a live subscription was released.
    pub fn deactivate(&mut self) -> bool {
        self.torn_down = true;
        let Some(active) = self.active.take() else {
            return false;
        };

        // Bump under the watch lock so the consumer cannot apply in between.
        self.session.send_if_modified(|_| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            false
        });
        active.task.abort();
        self.provider.unsubscribe(active.id);

        info!(subscription = active.id.0, "Session watcher deactivated");
        true
    }

    /// Whether a subscription is currently live.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// A receiver that observes every published session.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// A navigation gate driven by this watcher.
    #[must_use]
    pub fn gate(&self) -> NavigationGate {
        NavigationGate::new(self.subscribe())
    }

    /// Clears the surfaced error after the user acknowledged it.
    ///
    /// Does nothing after teardown. Returns `true` if an error was cleared.
    pub fn dismiss_error(&self) -> bool {
        if self.torn_down {
            return false;
        }
        let cleared = self.session.send_if_modified(Session::clear_error);
        if cleared {
            debug!("Session error dismissed");
        }
        cleared
    }

    fn begin_epoch(&self) -> u64 {
        let mut current = 0;
        self.session.send_modify(|session| {
            current = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *session = Session::loading();
        });
        current
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.deactivate();
    }
}

async fn consume(
    mut events: tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
    session: watch::Sender<Session>,
    epoch: Arc<AtomicU64>,
    mine: u64,
) {
    while let Some(event) = events.recv().await {
        debug!(?event, "Session notification received");
        let applied = session.send_if_modified(|current| {
            if epoch.load(Ordering::SeqCst) != mine {
                return false;
            }
            let next = Session::from_event(event);
            if *current == next {
                return false;
            }
            info!(from = ?current.state(), to = ?next.state(), "Session state changed");
            *current = next;
            true
        });
        if !applied && epoch.load(Ordering::SeqCst) != mine {
            debug!("Discarding notification for a torn-down session");
            return;
        }
    }

    // Provider dropped the channel. Never leave the session loading.
    session.send_if_modified(|current| {
        if epoch.load(Ordering::SeqCst) != mine || !current.is_loading() {
            return false;
        }
        warn!("Identity provider closed the notification channel before reporting a session");
        *current = Session::failed(AuthError::Provider {
            code: "subscription-closed".to_string(),
            message: "The identity provider stopped sending session updates.".to_string(),
        });
        true
    });
}
