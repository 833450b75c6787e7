//! # Quire
//!
//! A small blog backend: an admin-authenticated JSON API for posts, users
//! and feed subscriptions, plus a background scheduler that republishes
//! RSS/Atom entries as posts.
//!
//! ## Architecture
//!
//! ```text
//! HTTP ─→ api (auth gates) ─→ store
//! Scheduler ─→ Fetcher → Normalizer → store
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve on :8080 with the default admin (admin@example.com / admin123)
//! quire serve
//!
//! # Run one ingestion cycle and exit
//! quire ingest
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together store, fetcher,
/// normalizer, token manager and password hasher.
pub mod app;

/// HTTP routes, handlers and the authentication middleware.
pub mod api;

/// Credential hashing and session tokens.
pub mod auth;

/// Configuration file and environment overlay.
pub mod config;

/// Background scheduler for periodic ingestion.
pub mod daemon;

/// Command-line interface using clap.
pub mod cli;

/// Core domain models.
///
/// - [`Post`](domain::Post): an article, authored or ingested
/// - [`Feed`](domain::Feed): a polled RSS/Atom subscription
/// - [`User`](domain::User): an account that can log in
pub mod domain;

/// HTTP fetching of feed documents.
pub mod fetcher;

/// One ingestion cycle over every enabled feed.
pub mod ingest;

/// Feed sniffing, parsing and markup stripping.
pub mod normalizer;

/// Database persistence.
pub mod store;
