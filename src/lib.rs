//! Admin console client for the bazaro food marketplace.
//!
//! Two cooperating pieces: [`session::SessionManager`] owns the persisted
//! token record, its expiry rules and the refresh/inactivity timers, and
//! [`flow::LoginFlow`] drives the two-step login handshake (password,
//! then an emailed verification code) against the platform API.

pub mod api;
pub mod cli;
pub mod flow;
pub mod session;
