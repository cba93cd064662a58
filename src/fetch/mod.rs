//! Resilient HTTP fetching
//!
//! This module wraps the HTTP client used by every pipeline stage:
//! - randomized user-agent selection per attempt
//! - jittered inter-request delay to avoid synchronized bursts
//! - exponential-backoff retry for transport and HTTP-status failures
//! - optional robots.txt gating, loaded once per client
//! - optional outbound proxy
//!
//! A [`Fetcher`] owns its underlying connection pool; dropping it releases
//! the client on every exit path, which is the scoped lifetime each pipeline
//! stage relies on.

mod client;

pub use client::{backoff_delay, request_jitter, FetchConfig, Fetcher, DEFAULT_USER_AGENTS};
