//! Request decoding: RESP value → [`Command`].
//!
//! Clients speak a single request shape: a non-null array of non-null bulk
//! strings, where element 0 is the command word and the rest are its
//! arguments. Anything else (a bare integer, a null array, a simple string
//! where a bulk string belongs) is a protocol violation, not a command
//! error, and is rejected here before any handler runs.
//!
//! The command name is upper-cased at decode time so lookup and error
//! messages are case-insensitive; arguments stay raw bytes because RESP bulk
//! strings are binary-safe.

use crate::protocol::RespValue;
use bytes::Bytes;
use thiserror::Error;

/// Reasons a well-formed RESP value can still fail to be a command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// The request was not a non-null array.
    #[error("expected a non-null array of bulk strings")]
    ExpectedArray,

    /// The array was empty: there is no command name to dispatch on.
    #[error("empty command array")]
    MissingName,

    /// Element 0 was not a non-null bulk string.
    #[error("command name must be a non-null bulk string")]
    InvalidName,

    /// The command name bytes were not valid UTF-8.
    #[error("command name is not valid UTF-8")]
    NameNotUtf8,

    /// An argument was not a non-null bulk string.
    #[error("argument {0} must be a non-null bulk string")]
    InvalidArgument(usize),
}

/// One decoded client request, built per request and dropped after execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Upper-cased command word, e.g. `GET`.
    pub name: String,
    /// Arguments in wire order, binary-safe.
    pub args: Vec<Bytes>,
}

impl TryFrom<RespValue> for Command {
    type Error = DecodeError;

    fn try_from(value: RespValue) -> Result<Self, DecodeError> {
        let items = match value {
            RespValue::Array(items) => items,
            _ => return Err(DecodeError::ExpectedArray),
        };

        let mut items = items.into_iter();

        let name = match items.next() {
            Some(RespValue::BulkString(raw)) => std::str::from_utf8(&raw)
                .map_err(|_| DecodeError::NameNotUtf8)?
                .to_uppercase(),
            Some(_) => return Err(DecodeError::InvalidName),
            None => return Err(DecodeError::MissingName),
        };

        let mut args = Vec::with_capacity(items.len());
        for (index, item) in items.enumerate() {
            match item {
                RespValue::BulkString(raw) => args.push(raw),
                // Argument indices in diagnostics count from 1, after the name.
                _ => return Err(DecodeError::InvalidArgument(index + 1)),
            }
        }

        Ok(Command { name, args })
    }
}
