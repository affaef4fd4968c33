/**
 * xfcanvas Server Entry Point
 *
 * Loads configuration, initializes tracing and serves the document API.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let config = xfcanvas::backend::ServerConfig::load()?;

    // RUST_LOG wins over the configured default filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("[Server] Server initialization started");

    let addr = config.socket_addr()?;
    let state = xfcanvas::backend::build_state(config, None);
    let app = xfcanvas::backend::create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Server] Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin xfcanvas-server --features ssr");
    std::process::exit(1);
}
