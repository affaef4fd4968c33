//! Server Module
//!
//! This module contains all server-side code for initializing and configuring
//! the Axum HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - `AppState` and `FromRef` implementations
//! - **`config`** - `ServerConfig` loading (defaults, TOML, environment)
//! - **`init`** - state construction, router creation, background tasks
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `ServerConfig::load`
//! 2. **State Creation**: document service, optional generator
//! 3. **Router Creation**: routes, tracing layer, fallback
//! 4. **Background Tasks**: periodic subscriber cleanup
//!
//! # Example
//!
//! ```rust,no_run
//! use xfcanvas::backend::server::{build_state, create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load()?;
//! let addr = config.socket_addr()?;
//! let app = create_app(build_state(config, None));
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use init::{build_state, create_app};
pub use state::AppState;
