//! Synchronous API client core for the Mapbox tokens service.
//!
//! # Overview
//! One HTTP round trip per call: build the absolute URL, attach the
//! `access_token` query parameter, execute through the configured transport,
//! and classify the status. Successful responses come back with the body
//! unread for the caller to decode; anything outside [200, 399] is drained
//! and converted into a structured [`ApiError`].
//!
//! # Design
//! - `MapboxClient` holds only the base URL, an optional access token, and
//!   the transport; there is no mutable state between calls, so sharing
//!   across threads is safe.
//! - The transport is an explicit dependency ([`HttpTransport`]), defaulting
//!   to a freshly constructed `ureq` agent rather than a process-wide
//!   global; tests substitute canned doubles.
//! - No retries and no backoff: every outcome is reported synchronously to
//!   the immediate caller, never swallowed.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::{MapboxClient, MAPBOX_ENDPOINT};
pub use error::{ApiError, ClientError};
pub use http::{HttpResponse, HttpTransport};
pub use types::{CreateToken, Token, UpdateToken};
