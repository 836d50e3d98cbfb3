//! Client Connection Module
//!
//! Every accepted socket gets its own async task, so thousands of clients
//! can be served concurrently while each connection stays sequential:
//! requests on one socket are answered strictly in the order they arrive.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                      (main.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌───────────┐   ┌────────────┐   ┌────────┐   ┌─────────┐ │
//! │  │ Read into │──>│ Parse RESP │──>│ Decode │──>│ Execute │ │
//! │  │  buffer   │   │   frame    │   │command │   │ on store│ │
//! │  └───────────┘   └────────────┘   └────────┘   └────┬────┘ │
//! │                                                     ▼      │
//! │                                             ┌────────────┐ │
//! │                                             │ Send reply │ │
//! │                                             └────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Tokio for non-blocking network operations
//! - **Buffer Management**: BytesMut accumulation with a hard size cap
//! - **Pipelining**: Multiple commands per TCP segment, replies in order
//! - **Desync Discipline**: Malformed framing gets one final error frame,
//!   then the connection is dropped rather than re-synchronized by guessing
//!
//! ## Example
//!
//! ```ignore
//! use flintkv::commands::CommandRegistry;
//! use flintkv::connection::{handle_connection, ConnectionStats};
//! use flintkv::storage::Store;
//! use std::sync::{Arc, Mutex};
//!
//! let registry = Arc::new(CommandRegistry::new());
//! let store = Arc::new(Mutex::new(Store::new()));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, registry, store, stats));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
