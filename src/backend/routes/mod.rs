//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation, tracing layer and fallback
//! - **`document_routes`** - Document, mutation and subscription endpoints
//!
//! # Route Types
//!
//! - `GET /health` - liveness probe
//! - `/documents/...` - see `document_routes`
//!
//! Unknown paths answer with the standard JSON error body and 404.

/// Main router creation
pub mod router;

/// Document endpoints
pub mod document_routes;

// Re-export commonly used functions
pub use router::create_router;
