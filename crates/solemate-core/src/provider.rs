//! In-process identity provider for development and tests.
//!
//! Mirrors the behaviour of the managed backend closely enough to drive the
//! session watcher end to end: the current session is pushed to every new
//! listener immediately, every sign-in or sign-out is broadcast, and the
//! provider's error taxonomy is enforced (unknown account, wrong password,
//! duplicate email, weak password, rate limiting, network outages).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::identity::{
    AuthError, AuthResult, IdentityProvider, NewAccount, Principal, SessionEvent, SignInMethod,
    Subscription, SubscriptionId,
};

/// Failed password attempts allowed before the provider rate-limits an account.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// How long an account stays rate limited after too many failures.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Minimum password length accepted by the provider.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The identity returned by the next interactive Google sign-in.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    /// Google account email.
    pub email: String,
    /// Google profile name.
    pub display_name: Option<String>,
    /// Google avatar URL.
    pub photo_url: Option<String>,
}

struct Account {
    principal: Principal,
    password: Option<String>,
    failed_attempts: u32,
    locked_until: Option<Instant>,
}

impl Account {
    fn new(principal: Principal, password: Option<String>) -> Self {
        Self {
            principal,
            password,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    /// Fails while the lockout is running; an expired lockout starts a fresh count.
    fn check_lockout(&mut self, now: Instant) -> AuthResult<()> {
        match self.locked_until {
            Some(until) if now < until => Err(AuthError::RateLimited),
            Some(_) => {
                self.locked_until = None;
                self.failed_attempts = 0;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn record_failure(&mut self, now: Instant) {
        self.failed_attempts += 1;
        if self.failed_attempts >= MAX_FAILED_ATTEMPTS {
            self.locked_until = Some(now + RATE_LIMIT_WINDOW);
        }
    }
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    current: Option<Principal>,
    listeners: HashMap<SubscriptionId, mpsc::UnboundedSender<SessionEvent>>,
    next_subscription: u64,
    network_down: bool,
    google: Option<GoogleIdentity>,
}

impl State {
    fn broadcast(&mut self, event: &SessionEvent) {
        self.listeners.retain(|id, tx| {
            let alive = tx.send(event.clone()).is_ok();
            if !alive {
                debug!(subscription = id.0, "Dropping closed listener");
            }
            alive
        });
    }

    fn check_network(&self) -> AuthResult<()> {
        if self.network_down {
            return Err(AuthError::NetworkFailed);
        }
        Ok(())
    }

    fn set_current(&mut self, principal: Principal) {
        self.current = Some(principal.clone());
        self.broadcast(&SessionEvent::SignedIn(principal));
    }
}

/// An identity provider that keeps its accounts in memory.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    state: Mutex<State>,
    misconfigured: Option<String>,
}

impl MemoryIdentityProvider {
    /// Creates an empty, correctly configured provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider from configuration.
    ///
    /// A missing API key leaves the provider misconfigured: every
    /// subscription attempt fails.
    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        let misconfigured = config
            .api_key
            .trim()
            .is_empty()
            .then(|| format!("no API key configured for project '{}'", config.project_id));
        if let Some(reason) = &misconfigured {
            warn!(reason = %reason, "Identity provider is misconfigured");
        }
        Self {
            state: Mutex::default(),
            misconfigured,
        }
    }

    /// Simulates losing or regaining connectivity to the backend.
    pub fn set_network_available(&self, available: bool) {
        self.lock().network_down = !available;
    }

    /// Sets the identity the next interactive sign-in returns.
    ///
    /// `None` makes the interactive flow behave as if the user closed it.
    pub fn set_google_identity(&self, identity: Option<GoogleIdentity>) {
        self.lock().google = identity;
    }

    /// Pushes a failure notification to every listener.
    pub fn emit_failure(&self, error: AuthError) {
        self.lock().broadcast(&SessionEvent::Failed(error));
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str) -> AuthResult<()> {
    if crate::account::is_valid_email(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn subscribe(&self) -> AuthResult<Subscription> {
        if let Some(reason) = &self.misconfigured {
            return Err(AuthError::Misconfigured(reason.clone()));
        }

        let mut state = self.lock();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;

        let (tx, events) = mpsc::unbounded_channel();
        let initial = state
            .current
            .clone()
            .map_or(SessionEvent::SignedOut, SessionEvent::SignedIn);
        // The receiver is still in scope, so this cannot fail.
        let _ = tx.send(initial);
        state.listeners.insert(id, tx);

        debug!(subscription = id.0, "Listener registered");
        Ok(Subscription { id, events })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.lock().listeners.remove(&id).is_some() {
            debug!(subscription = id.0, "Listener removed");
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<Principal> {
        let mut state = self.lock();
        state.check_network()?;
        check_email(email)?;

        let account = state
            .accounts
            .get_mut(&account_key(email))
            .ok_or(AuthError::UnknownAccount)?;

        let now = Instant::now();
        account.check_lockout(now)?;
        if account.password.as_deref() != Some(password) {
            account.record_failure(now);
            if account.locked_until.is_some() {
                warn!(attempts = account.failed_attempts, "Account rate limited");
            }
            return Err(AuthError::WrongPassword);
        }
        account.failed_attempts = 0;

        let principal = account.principal.clone();
        state.set_current(principal.clone());
        info!(uid = %principal.uid, "Password sign-in succeeded");
        Ok(principal)
    }

    async fn sign_in_with_google(&self) -> AuthResult<Principal> {
        let mut state = self.lock();
        state.check_network()?;
        let identity = state.google.clone().ok_or(AuthError::Cancelled)?;

        let principal = state
            .accounts
            .entry(account_key(&identity.email))
            .or_insert_with(|| {
                Account::new(
                    Principal {
                        uid: Uuid::new_v4().to_string(),
                        email: Some(identity.email.clone()),
                        display_name: identity.display_name.clone(),
                        photo_url: identity.photo_url.clone(),
                        email_verified: true,
                        sign_in_method: SignInMethod::Google,
                    },
                    None,
                )
            })
            .principal
            .clone();
        let principal = Principal {
            sign_in_method: SignInMethod::Google,
            ..principal
        };

        state.set_current(principal.clone());
        info!(uid = %principal.uid, "Google sign-in succeeded");
        Ok(principal)
    }

    async fn create_account(&self, account: NewAccount) -> AuthResult<Principal> {
        let mut state = self.lock();
        state.check_network()?;
        check_email(&account.email)?;
        if account.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let key = account_key(&account.email);
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse);
        }

        let principal = Principal {
            uid: Uuid::new_v4().to_string(),
            email: Some(account.email.trim().to_string()),
            display_name: Some(account.display_name.trim().to_string()),
            photo_url: None,
            email_verified: false,
            sign_in_method: SignInMethod::Password,
        };
        state
            .accounts
            .insert(key, Account::new(principal.clone(), Some(account.password)));

        state.set_current(principal.clone());
        info!(uid = %principal.uid, "Account created");
        Ok(principal)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let mut state = self.lock();
        state.check_network()?;
        if let Some(principal) = state.current.take() {
            info!(uid = %principal.uid, "Signed out");
        }
        state.broadcast(&SessionEvent::SignedOut);
        Ok(())
    }
}
