//! Core domain types and utilities for pagechat.
//!
//! This crate provides the identifier types and shared file
//! utilities used by the relay and its libraries.

pub mod fs;
pub mod id;

pub use fs::write_atomic;
pub use id::{ConversationId, InboxId, MessageId};
