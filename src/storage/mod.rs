//! In-memory storage.
//!
//! A single flat table owned by the server and handed to command handlers as
//! `&mut Store`. Connection fan-out wraps the store in `Arc<Mutex<..>>` and
//! locks it for exactly one command execution at a time, which is the only
//! synchronization the storage layer relies on.
//!
//! ## Example
//!
//! ```
//! use flintkv::storage::Store;
//! use bytes::Bytes;
//!
//! let mut store = Store::new();
//! store.set(Bytes::from("name"), Bytes::from("alice"));
//! assert_eq!(store.get(&Bytes::from("name")), Some(Bytes::from("alice")));
//! assert_eq!(store.incr(&Bytes::from("hits")), Ok(1));
//! ```

pub mod store;

// Re-export the store type
pub use store::Store;
