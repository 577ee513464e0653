//! Core types for prodsuite.
//!
//! This crate is shared by the HTTP server and the admin CLI:
//! - domain documents (notes, lists, trackers, drawings, journals, folders)
//! - `reminder` recurrence math
//! - `permissions` feature gating rules
//! - `storage` SQLite persistence
//! - `config` global configuration

pub mod config;
pub mod drawing;
pub mod error;
pub mod folder;
pub mod id;
pub mod journal;
pub mod list;
pub mod note;
pub mod permissions;
pub mod push;
pub mod reminder;
pub mod settings;
pub mod storage;
pub mod tags;
pub mod tracker;

pub use config::SuiteConfig;
pub use error::{SuiteError, SuiteResult};
pub use storage::Storage;
