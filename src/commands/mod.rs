//! Command processing: decode, dispatch, execute.
//!
//! ## Architecture
//!
//! ```text
//! Client Request (RESP array of bulk strings)
//!       │
//!       ▼
//! ┌──────────────────┐
//! │  RESP Parser     │  (protocol module)
//! └────────┬─────────┘
//!          │ RespValue
//!          ▼
//! ┌──────────────────┐
//! │  Command         │  (this module: TryFrom<RespValue>)
//! │  name + args     │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ CommandRegistry  │  (this module: name → handler fn)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      Store       │  (storage module)
//! └──────────────────┘
//! ```
//!
//! Shape violations (not an array, nulls, wrong element kinds) fail at the
//! `Command` decoding step with a [`DecodeError`] and never reach a handler.
//! Semantic failures (unknown name, wrong arity, non-integer INCR target)
//! come back from the registry as ordinary RESP error replies.

pub mod command;
pub mod registry;

// Re-export the types the connection layer works with
pub use command::{Command, DecodeError};
pub use registry::CommandRegistry;
