//! pagechat relay server.
//!
//! This crate serves the `/api/fetch` endpoint that posts to and reads
//! from the group conversation registered for a URL.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod tls;
