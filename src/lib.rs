//! # FlintKV - A Minimal In-Memory Key-Value Server
//!
//! FlintKV is a small key-value store that speaks the Redis wire protocol
//! (RESP). It keeps the moving parts deliberately few: one parser, one
//! command table, one hash map behind one lock, one task per connection.
//!
//! ## Features
//!
//! - **Redis Wire Protocol**: Full RESP framing with binary-safe bulk strings
//! - **Pipelining**: Any number of commands per write, replies in order
//! - **Strict Framing**: Malformed input never desynchronizes the stream;
//!   the offending connection is told why and then dropped
//! - **Async I/O**: Built on Tokio, one lightweight task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          FlintKV                               │
//! │                                                                │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────┐        │
//! │  │ TCP Server  │───>│ Connection  │───>│ RESP Parser  │        │
//! │  │ (Listener)  │    │  Handler    │    │ (pure fn)    │        │
//! │  └─────────────┘    └─────────────┘    └──────┬───────┘        │
//! │                                               │ RespValue      │
//! │                                               ▼                │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────┐        │
//! │  │    Store    │<───│  Command    │<───│   Command    │        │
//! │  │ Mutex<map>  │    │  Registry   │    │   Decoder    │        │
//! │  └─────────────┘    └─────────────┘    └──────────────┘        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flintkv::commands::CommandRegistry;
//! use flintkv::connection::{handle_connection, ConnectionStats};
//! use flintkv::storage::Store;
//! use std::sync::{Arc, Mutex};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(CommandRegistry::new());
//!     let store = Arc::new(Mutex::new(Store::new()));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         tokio::spawn(handle_connection(
//!             stream,
//!             addr,
//!             Arc::clone(&registry),
//!             Arc::clone(&store),
//!             Arc::clone(&stats),
//!         ));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PING`
//! - `ECHO message`
//! - `SET key value`
//! - `GET key`
//! - `INCR key`
//! - `DEL key`
//!
//! Command names are case-insensitive; keys and values are arbitrary bytes.
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP frame types, parser, and serializer
//! - [`commands`]: frame-to-command decoding and the dispatch table
//! - [`storage`]: the key-value table and its integer arithmetic
//! - [`connection`]: per-client I/O loop and connection statistics
//!
//! ## Design Highlights
//!
//! ### One Lock, No Surprises
//!
//! All data lives in a single `HashMap` behind a `Mutex`. Commands execute
//! one at a time, which makes read-modify-write commands like `INCR`
//! atomic without any further machinery. The lock is held only for the
//! synchronous execution of one command, never across an await point.
//!
//! ### Pure Parsing
//!
//! The parser is a pure function from bytes to `(frame, consumed)`. It
//! never blocks, never reads a socket, and reports "incomplete" as a
//! value rather than an error, so callers can keep buffering until a
//! frame is whole. Feeding it a prefix of a valid message is always
//! `Ok(None)`, never a failure.
//!
//! ### Strict Where It Must Be
//!
//! Length headers are canonical decimals: `:007` and `$03` are protocol
//! errors, not lenient parses. Once framing is broken there is no safe
//! way to find the next message boundary, so the connection is closed
//! after a final diagnostic reply.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{Command, CommandRegistry};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse, ParseError, RespValue};
pub use storage::Store;

/// The default port FlintKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host FlintKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of FlintKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
