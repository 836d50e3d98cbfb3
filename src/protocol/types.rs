//! RESP (Redis Serialization Protocol) value model.
//!
//! Every value on the wire starts with a one-byte type tag and ends with
//! CRLF (`\r\n`):
//!
//! - `+` Simple String: `+OK\r\n`
//! - `-` Error: `-ERR unknown command\r\n`
//! - `:` Integer: `:1000\r\n`
//! - `$` Bulk String: `$5\r\nhello\r\n`, null form `$-1\r\n`
//! - `*` Array: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`, null form `*-1\r\n`
//!
//! Bulk strings are binary-safe: the length header, not a terminator scan,
//! bounds the payload. Null bulk strings and null arrays are distinct values
//! in the protocol and stay distinct variants here, so re-encoding a parsed
//! value reproduces the original bytes exactly.

use bytes::Bytes;
use std::fmt;

/// The CRLF line terminator used throughout RESP.
pub const CRLF: &[u8] = b"\r\n";

/// RESP type tag bytes.
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A single RESP protocol value.
///
/// Produced by the parser for incoming data and by command handlers for
/// outgoing responses. Each variant carries only the payload that exists for
/// its kind; null bulk strings and null arrays are their own variants rather
/// than flags on the non-null kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary-safe text; must not contain CR or LF.
    /// Format: `+<text>\r\n`
    SimpleString(String),

    /// An error condition, delivered to clients like a simple string.
    /// Format: `-<message>\r\n`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<decimal>\r\n`
    Integer(i64),

    /// Binary-safe string, length-prefixed.
    /// Format: `$<length>\r\n<payload>\r\n`
    BulkString(Bytes),

    /// The null bulk string, `$-1\r\n`. Returned by GET for an absent key.
    Null,

    /// Ordered sequence of values of any kind, including nested arrays.
    /// Format: `*<count>\r\n<element>...`
    Array(Vec<RespValue>),

    /// The null array, `*-1\r\n`. Distinct from an empty array `*0\r\n`.
    NullArray,
}

impl RespValue {
    /// Creates a simple string value.
    ///
    /// # Example
    /// ```
    /// use flintkv::protocol::types::RespValue;
    /// let ok = RespValue::simple_string("OK");
    /// ```
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates an error value.
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates an integer value.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a bulk string value.
    ///
    /// # Example
    /// ```
    /// use flintkv::protocol::types::RespValue;
    /// use bytes::Bytes;
    /// let bulk = RespValue::bulk_string(Bytes::from("hello"));
    /// ```
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Creates the null bulk string.
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Creates an array value.
    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// Creates the null array.
    pub fn null_array() -> Self {
        RespValue::NullArray
    }

    /// The canonical `+OK\r\n` reply.
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// The canonical `+PONG\r\n` reply.
    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes this value into its wire representation.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes this value into an existing buffer, avoiding an extra
    /// allocation when responses are batched.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => {
                buf.extend_from_slice(b"$-1");
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
            RespValue::NullArray => {
                buf.extend_from_slice(b"*-1");
                buf.extend_from_slice(CRLF);
            }
        }
    }
}

impl fmt::Display for RespValue {
    /// Human-readable rendering in the style of redis-cli, used by trace
    /// logging. Not the wire format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            RespValue::Null | RespValue::NullArray => write!(f, "(nil)"),
            RespValue::Array(values) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    writeln!(f)?;
                    for (i, v) in values.iter().enumerate() {
                        writeln!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_string_serialize() {
        assert_eq!(RespValue::simple_string("OK").serialize(), b"+OK\r\n");
    }

    #[test]
    fn test_error_serialize() {
        let value = RespValue::error("ERR unknown command 'FOO'");
        assert_eq!(value.serialize(), b"-ERR unknown command 'FOO'\r\n");
    }

    #[test]
    fn test_integer_serialize() {
        assert_eq!(RespValue::integer(1000).serialize(), b":1000\r\n");
        assert_eq!(RespValue::integer(-42).serialize(), b":-42\r\n");
        assert_eq!(RespValue::integer(0).serialize(), b":0\r\n");
    }

    #[test]
    fn test_bulk_string_serialize() {
        let value = RespValue::bulk_string(Bytes::from("hello"));
        assert_eq!(value.serialize(), b"$5\r\nhello\r\n");
    }

    #[test]
    fn test_empty_bulk_string_serialize() {
        let value = RespValue::bulk_string(Bytes::new());
        assert_eq!(value.serialize(), b"$0\r\n\r\n");
    }

    #[test]
    fn test_binary_bulk_string_serialize() {
        // Payload bytes pass through untouched, CRLF included.
        let value = RespValue::bulk_string(Bytes::from_static(b"a\r\nb\x00"));
        assert_eq!(value.serialize(), b"$5\r\na\r\nb\x00\r\n");
    }

    #[test]
    fn test_null_serialize() {
        assert_eq!(RespValue::null().serialize(), b"$-1\r\n");
    }

    #[test]
    fn test_null_array_serialize() {
        assert_eq!(RespValue::null_array().serialize(), b"*-1\r\n");
    }

    #[test]
    fn test_null_and_null_array_are_distinct() {
        assert_ne!(RespValue::null(), RespValue::null_array());
        assert_ne!(RespValue::null().serialize(), RespValue::null_array().serialize());
    }

    #[test]
    fn test_array_serialize() {
        let value = RespValue::array(vec![
            RespValue::bulk_string(Bytes::from("GET")),
            RespValue::bulk_string(Bytes::from("name")),
        ]);
        assert_eq!(value.serialize(), b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
    }

    #[test]
    fn test_empty_array_serialize() {
        assert_eq!(RespValue::array(vec![]).serialize(), b"*0\r\n");
    }

    #[test]
    fn test_nested_array_serialize() {
        let value = RespValue::array(vec![
            RespValue::integer(1),
            RespValue::array(vec![RespValue::integer(2), RespValue::integer(3)]),
        ]);
        assert_eq!(value.serialize(), b"*2\r\n:1\r\n*2\r\n:2\r\n:3\r\n");
    }

    #[test]
    fn test_ok_and_pong() {
        assert_eq!(RespValue::ok().serialize(), b"+OK\r\n");
        assert_eq!(RespValue::pong().serialize(), b"+PONG\r\n");
    }

    #[test]
    fn test_serialize_into_appends() {
        let mut buf = Vec::new();
        RespValue::ok().serialize_into(&mut buf);
        RespValue::integer(1).serialize_into(&mut buf);
        assert_eq!(buf, b"+OK\r\n:1\r\n");
    }
}
