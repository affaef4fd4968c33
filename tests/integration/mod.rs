//! Integration tests
//!
//! HTTP, WebSocket and end-to-end scenario tests against the full router.

#[cfg(feature = "ssr")]
mod api;
#[cfg(feature = "ssr")]
mod realtime;
#[cfg(feature = "ssr")]
mod scenario_test;
