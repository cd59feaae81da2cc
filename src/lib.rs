//! TestRail synchronization library.
//!
//! Provides plan synchronization (reuse-or-create of a run plan cloned from a
//! base plan), result recording, and rotating two-generation suite backups
//! against a TestRail instance.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod services;
