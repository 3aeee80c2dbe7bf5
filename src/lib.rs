//! Fennec tab host: the tab registry, its engine message bridge, listener
//! fan-out and session persistence.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod command_handler;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;
