//! Navigation gate.
//!
//! Pure selection of the view hierarchy to mount for a [`Session`]:
//!
//! | loading | authenticated | error | flow            |
//! |---------|---------------|-------|-----------------|
//! | true    | -             | -     | Loading         |
//! | false   | true          | false | Authenticated   |
//! | false   | any           | true  | Unauthenticated |
//! | false   | false         | false | Unauthenticated |

use serde::Serialize;
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::session::{Session, SessionState};

/// Top-level view hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Transient splash while the session settles.
    Loading,
    /// Sign-in and sign-up screens.
    Unauthenticated,
    /// The main tabbed application.
    Authenticated,
}

/// A screen mounted by a [`Flow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Loading splash.
    Splash,
    /// Email/password and Google sign-in.
    Login,
    /// Account creation.
    SignUp,
    /// Turn-by-turn navigation.
    Navigate,
    /// Smart-shoe pairing.
    Device,
    /// Obstacle detection.
    Detection,
    /// Emergency contacts and location sharing.
    Emergency,
    /// App settings.
    Settings,
}

const LOADING_SCREENS: &[Screen] = &[Screen::Splash];
const AUTH_SCREENS: &[Screen] = &[Screen::Login, Screen::SignUp];
const APP_TABS: &[Screen] = &[
    Screen::Navigate,
    Screen::Device,
    Screen::Detection,
    Screen::Emergency,
    Screen::Settings,
];

impl Flow {
    /// Selects the flow for `session`. Never returns `Authenticated` for a
    /// session that carries an error.
    #[must_use]
    pub const fn for_session(session: &Session) -> Self {
        match session.state() {
            SessionState::Loading => Self::Loading,
            SessionState::Authenticated => Self::Authenticated,
            SessionState::Unauthenticated | SessionState::Failed => Self::Unauthenticated,
        }
    }

    /// Screens this flow mounts, in display order.
    #[must_use]
    pub const fn screens(self) -> &'static [Screen] {
        match self {
            Self::Loading => LOADING_SCREENS,
            Self::Unauthenticated => AUTH_SCREENS,
            Self::Authenticated => APP_TABS,
        }
    }

    /// The screen shown when the flow is mounted.
    #[must_use]
    pub const fn initial_screen(self) -> Screen {
        self.screens()[0]
    }

    /// Whether `screen` belongs to this flow.
    #[must_use]
    pub fn contains(self, screen: Screen) -> bool {
        self.screens().contains(&screen)
    }
}

/// Observes the session watcher and selects the flow to display.
///
/// Holds no state of its own beyond the session receiver; every query is
/// recomputed from the latest published session.
#[derive(Debug, Clone)]
pub struct NavigationGate {
    sessions: watch::Receiver<Session>,
}

impl NavigationGate {
    /// Creates a gate over a session receiver.
    #[must_use]
    pub const fn new(sessions: watch::Receiver<Session>) -> Self {
        Self { sessions }
    }

    /// The flow for the latest session.
    #[must_use]
    pub fn current(&self) -> Flow {
        Flow::for_session(&self.sessions.borrow())
    }

    /// Waits for the next session change and returns its flow.
    ///
    /// Returns `None` once the watcher is gone.
    pub async fn changed(&mut self) -> Option<Flow> {
        self.sessions.changed().await.ok()?;
        Some(Flow::for_session(&self.sessions.borrow_and_update()))
    }
}
