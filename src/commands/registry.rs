//! Command registry and executor.
//!
//! ## Supported Commands
//!
//! - `PING` - Test the connection, no arguments
//! - `ECHO message` - Return the message unchanged
//! - `SET key value` - Store a value, overwriting any previous one
//! - `GET key` - Fetch a value, null bulk string when absent
//! - `INCR key` - Interpret the value as an integer and add one
//! - `DEL key` - Remove a key, reporting whether it existed
//!
//! ## Architecture
//!
//! ```text
//!  Command ──> CommandRegistry::execute ──> handler fn ──> RespValue
//!                      │                        │
//!                      │ name lookup            │ arity check, then
//!                      ▼                        ▼
//!               immutable fn table          &mut Store
//! ```
//!
//! The registry is built once at startup and shared by reference; there is
//! no global table and nothing about it mutates after construction. Every
//! handler validates its own arity before touching the store, so a
//! rejected command never leaves a partial write behind. Semantic failures
//! (bad arity, unknown name, non-integer INCR target) are ordinary
//! [`RespValue::Error`] replies; only malformed requests upstream of the
//! registry terminate a connection.

use crate::commands::Command;
use crate::protocol::RespValue;
use crate::storage::Store;
use std::collections::HashMap;

/// Signature shared by all command handlers.
type CommandFn = fn(&Command, &mut Store) -> RespValue;

/// Immutable mapping from upper-cased command name to handler.
pub struct CommandRegistry {
    table: HashMap<&'static str, CommandFn>,
}

impl CommandRegistry {
    /// Builds the registry with every supported command.
    pub fn new() -> Self {
        let mut table: HashMap<&'static str, CommandFn> = HashMap::new();
        table.insert("PING", ping);
        table.insert("ECHO", echo);
        table.insert("SET", set);
        table.insert("GET", get);
        table.insert("INCR", incr);
        table.insert("DEL", del);
        Self { table }
    }

    /// Executes one command against the store and returns the reply.
    ///
    /// Lookup is exact: the decoder has already upper-cased the name. An
    /// unknown name is a normal error reply, not a connection-level failure.
    pub fn execute(&self, command: &Command, store: &mut Store) -> RespValue {
        match self.table.get(command.name.as_str()) {
            Some(handler) => handler(command, store),
            None => RespValue::error(format!("ERR unknown command '{}'", command.name)),
        }
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The arity failure reply every handler shares.
fn wrong_arity(name: &str) -> RespValue {
    RespValue::error(format!(
        "ERR wrong number of arguments for '{}' command",
        name
    ))
}

/// PING
fn ping(command: &Command, _store: &mut Store) -> RespValue {
    if !command.args.is_empty() {
        return wrong_arity(&command.name);
    }
    RespValue::pong()
}

/// ECHO message
fn echo(command: &Command, _store: &mut Store) -> RespValue {
    if command.args.len() != 1 {
        return wrong_arity(&command.name);
    }
    RespValue::bulk_string(command.args[0].clone())
}

/// SET key value
fn set(command: &Command, store: &mut Store) -> RespValue {
    if command.args.len() != 2 {
        return wrong_arity(&command.name);
    }
    store.set(command.args[0].clone(), command.args[1].clone());
    RespValue::ok()
}

/// GET key
fn get(command: &Command, store: &mut Store) -> RespValue {
    if command.args.len() != 1 {
        return wrong_arity(&command.name);
    }
    match store.get(&command.args[0]) {
        Some(value) => RespValue::bulk_string(value),
        None => RespValue::null(),
    }
}

/// INCR key
fn incr(command: &Command, store: &mut Store) -> RespValue {
    if command.args.len() != 1 {
        return wrong_arity(&command.name);
    }
    match store.incr(&command.args[0]) {
        Ok(n) => RespValue::integer(n),
        Err(e) => RespValue::error(format!("ERR {}", e)),
    }
}

/// DEL key
fn del(command: &Command, store: &mut Store) -> RespValue {
    if command.args.len() != 1 {
        return wrong_arity(&command.name);
    }
    if store.remove(&command.args[0]) {
        RespValue::integer(1)
    } else {
        RespValue::integer(0)
    }
}
