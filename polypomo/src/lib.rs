//! Pomodoro timer daemon for status bars
//!
//! One long-lived process owns the timer state and serves short-lived
//! clients over a Unix domain socket; see [`polypomo_ipc`] for the wire
//! protocol.

pub mod config;
pub mod daemon;
pub mod ipc;
pub mod notifier;
pub mod phase;
pub mod reminder;
pub mod timer;
