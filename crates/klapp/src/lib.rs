//! Klapp crate - Client engine for the KLAPP parent messaging API
//!
//! This crate provides UI-independent functionality including:
//! - Account settings and credential loading
//! - API client with token renewal, unread queries and read receipts
//! - Scheduled inbox polling with degraded-state reporting
//! - Command handlers for mutations (mark read)
//!
//! This crate has zero UI dependencies.

pub mod actions;
pub mod api;
pub mod config;
pub mod models;
pub mod poll;

pub use actions::ActionHandler;
pub use api::{KlappAuth, KlappClient, KlappError};
pub use config::{Account, DEFAULT_LOOKBACK_DAYS, DEFAULT_POLL_INTERVAL_SECS, KlappSettings};
pub use models::{InboxReport, InboxSnapshot, MessageBrief, MessageDetail, MessageId};
pub use poll::Poller;
