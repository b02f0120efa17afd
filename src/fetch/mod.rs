//! Outbound HTTP seam shared by the spreadsheet source and the counter store.
//!
//! Everything talks to [`HttpClient`] rather than `reqwest::Client`, so credentials are
//! layered on with wrappers and tests can answer requests in-process.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
