//! # solemate-server
//!
//! HTTP host for the SoleMate smart-shoe companion.
//!
//! The server plays the part of the app's root view: it owns the session
//! watcher for its whole lifetime, exposes the flow the navigation gate
//! selects, and serves the screens' actions as JSON endpoints.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
