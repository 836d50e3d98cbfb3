//! FlintKV - A Minimal In-Memory Key-Value Server
//!
//! This is the main entry point for the FlintKV server.
//! It sets up the TCP listener, the shared store, and the command table,
//! then hands each accepted connection to its own task.

use flintkv::commands::CommandRegistry;
use flintkv::connection::{handle_connection, ConnectionStats};
use flintkv::storage::Store;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: flintkv::DEFAULT_HOST.to_string(),
            port: flintkv::DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = args.next().unwrap_or_else(|| {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    });
                }
                "--port" | "-p" => {
                    let value = args.next().unwrap_or_else(|| {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    });
                    config.port = value.parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("FlintKV version {}", flintkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", arg);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
FlintKV - A Minimal In-Memory Key-Value Server

USAGE:
    flintkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>    Port to listen on (default: 6379)
    -v, --version        Print version information
        --help           Print this help message

EXAMPLES:
    flintkv                        # Start on 127.0.0.1:6379
    flintkv --port 6380            # Start on port 6380
    flintkv --host 0.0.0.0         # Listen on all interfaces

CONNECTING:
    Use redis-cli or any Redis client to connect:
    $ redis-cli -p 6379
    127.0.0.1:6379> PING
    PONG
    127.0.0.1:6379> SET visits 41
    OK
    127.0.0.1:6379> INCR visits
    (integer) 42
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
    ███████╗██╗     ██╗███╗   ██╗████████╗██╗  ██╗██╗   ██╗
    ██╔════╝██║     ██║████╗  ██║╚══██╔══╝██║ ██╔╝██║   ██║
    █████╗  ██║     ██║██╔██╗ ██║   ██║   █████╔╝ ██║   ██║
    ██╔══╝  ██║     ██║██║╚██╗██║   ██║   ██╔═██╗ ╚██╗ ██╔╝
    ██║     ███████╗██║██║ ╚████║   ██║   ██║  ██╗ ╚████╔╝
    ╚═╝     ╚══════╝╚═╝╚═╝  ╚═══╝   ╚═╝   ╚═╝  ╚═╝  ╚═══╝

FlintKV v{} - Minimal In-Memory Key-Value Server
──────────────────────────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        flintkv::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    // Shared state: one command table, one store, one set of counters.
    let registry = Arc::new(CommandRegistry::new());
    info!(commands = registry.len(), "Command table initialized");

    let store = Arc::new(Mutex::new(Store::new()));
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&registry), Arc::clone(&store), Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        protocol_errors = stats.protocol_errors.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    registry: Arc<CommandRegistry>,
    store: Arc<Mutex<Store>>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let registry = Arc::clone(&registry);
                let store = Arc::clone(&store);
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, registry, store, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
