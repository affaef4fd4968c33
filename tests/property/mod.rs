//! Property-based tests
//!
//! Randomized histories over a small id pool exercise the engine's
//! hierarchy invariants and the service's versioning and fan-out.

#[cfg(feature = "ssr")]
mod store_proptest;
