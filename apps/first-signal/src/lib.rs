//! # first-signal
//!
//! Host application for the First Signal cognitive engine: a clap CLI over
//! a local decision log and an axum HTTP API consumed by the UI.
//!
//! The engine itself lives in `signal-core`; this crate owns the async
//! runtime, the shared lock around the [`signal_core::Session`], file and
//! redb storage selection, and configuration loading.

pub mod api;
pub mod cli;
pub mod config;
