//! Incremental RESP parser.
//!
//! [`parse`] attempts to decode exactly one value from the front of a byte
//! buffer and reports one of three outcomes:
//!
//! - `Ok(Some((value, consumed)))`: a complete value was decoded and
//!   occupied exactly `consumed` bytes of the buffer
//! - `Ok(None)`: the buffer holds a valid prefix of a message that has not
//!   fully arrived; append more bytes and retry from the same offset
//! - `Err(ParseError)`: the bytes cannot be the start of a RESP message
//!
//! The caller owns framing: on success it advances its buffer by `consumed`
//! and may call [`parse`] again on the remainder (clients pipeline requests
//! back to back), and on `None` it performs the blocking read that the
//! parser itself never does. The parser keeps no state between calls and
//! never reads past the end of the buffer.
//!
//! Header integers (the `:` value line and the `$`/`*` length lines) must
//! be canonical decimals: at most one leading `+` or `-`, no leading zeros
//! unless the value is exactly `0`. `$-1\r\n` and `*-1\r\n` are the null
//! sentinels; every other negative length is a protocol error.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while parsing RESP data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The first byte is not one of the five RESP type tags.
    #[error("invalid type byte: {0:#04x}")]
    UnknownPrefix(u8),

    /// A header line is not a canonical decimal integer.
    #[error("invalid integer header: {0}")]
    InvalidInteger(String),

    /// A simple string or error line is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// A bulk string declared a negative length other than -1.
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// An array declared a negative element count other than -1.
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Malformed framing: missing trailing CRLF, stray CR/LF inside a line,
    /// nesting or element-count limits exceeded.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A bulk string declared a length above [`MAX_BULK_SIZE`].
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum declared length of a single bulk string (512 MB, same as Redis).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth before parsing is aborted.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Maximum declared element count for a single array.
pub const MAX_ARRAY_ELEMENTS: usize = 1024 * 1024;

/// Attempts to parse one RESP value from the front of `buf`.
///
/// `buf` is never mutated and never read past its end; incomplete input is
/// reported, not awaited, so the function is safe to call on whatever bytes
/// happen to be buffered.
///
/// # Returns
///
/// - `Ok(Some((value, consumed)))`: a complete value and its exact size
/// - `Ok(None)`: incomplete data, retry with more bytes
/// - `Err(e)`: malformed data; the buffer cannot become valid by growing
///
/// # Example
///
/// ```
/// use flintkv::protocol::parser::parse;
/// use flintkv::protocol::types::RespValue;
///
/// let buffer = b"+OK\r\n:1\r\n";
/// let (value, consumed) = parse(buffer).unwrap().unwrap();
/// assert_eq!(value, RespValue::simple_string("OK"));
/// assert_eq!(consumed, 5);
///
/// // The caller advances by `consumed` and parses the next message.
/// let (value, _) = parse(&buffer[consumed..]).unwrap().unwrap();
/// assert_eq!(value, RespValue::integer(1));
/// ```
pub fn parse(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    parse_value(buf, 0)
}

/// Recursive worker behind [`parse`]; `depth` counts enclosing arrays.
fn parse_value(buf: &[u8], depth: usize) -> ParseResult<Option<(RespValue, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }

    if depth > MAX_NESTING_DEPTH {
        return Err(ParseError::ProtocolError(format!(
            "array nesting exceeds depth limit of {}",
            MAX_NESTING_DEPTH
        )));
    }

    // The tag is validated before looking for the header terminator: a
    // buffer holding only an invalid tag byte is already malformed.
    match buf[0] {
        prefix::SIMPLE_STRING => parse_simple_string(buf),
        prefix::ERROR => parse_error(buf),
        prefix::INTEGER => parse_integer(buf),
        prefix::BULK_STRING => parse_bulk_string(buf),
        prefix::ARRAY => parse_array(buf, depth),
        other => Err(ParseError::UnknownPrefix(other)),
    }
}

/// Parses a simple string: `+<text>\r\n`
fn parse_simple_string(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    debug_assert!(buf[0] == prefix::SIMPLE_STRING);

    match read_text_line(buf)? {
        Some((text, consumed)) => Ok(Some((RespValue::SimpleString(text), consumed))),
        None => Ok(None),
    }
}

/// Parses an error: `-<message>\r\n`
fn parse_error(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    debug_assert!(buf[0] == prefix::ERROR);

    match read_text_line(buf)? {
        Some((text, consumed)) => Ok(Some((RespValue::Error(text), consumed))),
        None => Ok(None),
    }
}

/// Parses an integer: `:<decimal>\r\n`
fn parse_integer(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    debug_assert!(buf[0] == prefix::INTEGER);

    let (header, consumed) = match header_line(buf) {
        Some(found) => found,
        None => return Ok(None),
    };
    let n = parse_decimal(header)?;
    Ok(Some((RespValue::Integer(n), consumed)))
}

/// Parses a bulk string: `$<length>\r\n<payload>\r\n`, or `$-1\r\n` for null.
fn parse_bulk_string(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    debug_assert!(buf[0] == prefix::BULK_STRING);

    let (header, header_consumed) = match header_line(buf) {
        Some(found) => found,
        None => return Ok(None),
    };

    let declared = parse_decimal(header)?;
    if declared == -1 {
        return Ok(Some((RespValue::Null, header_consumed)));
    }
    if declared < 0 {
        return Err(ParseError::InvalidBulkLength(declared));
    }

    let length = declared as usize;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    // The payload is length-bounded, never terminator-scanned, so CR/LF
    // bytes inside it are plain data.
    let total = header_consumed + length + 2;
    if buf.len() < total {
        return Ok(None);
    }

    if &buf[header_consumed + length..total] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string payload missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[header_consumed..header_consumed + length]);
    Ok(Some((RespValue::BulkString(data), total)))
}

/// Parses an array: `*<count>\r\n<element>...`, or `*-1\r\n` for null.
///
/// Recurses once per declared element on the remaining slice; the first
/// child that is incomplete or malformed short-circuits the whole array.
fn parse_array(buf: &[u8], depth: usize) -> ParseResult<Option<(RespValue, usize)>> {
    debug_assert!(buf[0] == prefix::ARRAY);

    let (header, header_consumed) = match header_line(buf) {
        Some(found) => found,
        None => return Ok(None),
    };

    let declared = parse_decimal(header)?;
    if declared == -1 {
        return Ok(Some((RespValue::NullArray, header_consumed)));
    }
    if declared < 0 {
        return Err(ParseError::InvalidArrayLength(declared));
    }

    let count = declared as usize;
    if count > MAX_ARRAY_ELEMENTS {
        return Err(ParseError::ProtocolError(format!(
            "array of {} elements exceeds the {} element limit",
            count, MAX_ARRAY_ELEMENTS
        )));
    }

    // Capacity is clamped: a 14-byte header must not reserve megabytes.
    let mut elements = Vec::with_capacity(count.min(64));
    let mut consumed = header_consumed;

    for _ in 0..count {
        match parse_value(&buf[consumed..], depth + 1)? {
            Some((value, used)) => {
                elements.push(value);
                consumed += used;
            }
            None => return Ok(None),
        }
    }

    Ok(Some((RespValue::Array(elements), consumed)))
}

/// Splits off the header line that follows the type tag.
///
/// Returns the header content (terminator excluded) and the byte count
/// through the terminator, or `None` while the CRLF has not arrived.
fn header_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    find_crlf(&buf[1..]).map(|pos| (&buf[1..1 + pos], 1 + pos + 2))
}

/// Reads a `+`/`-` line frame as owned text.
///
/// The content is bounded by the first CRLF, so it can still carry a bare CR
/// (one not followed by LF) or a bare LF; both are malformed. Content must
/// be valid UTF-8.
fn read_text_line(buf: &[u8]) -> ParseResult<Option<(String, usize)>> {
    let (content, consumed) = match header_line(buf) {
        Some(found) => found,
        None => return Ok(None),
    };

    if content.contains(&b'\r') || content.contains(&b'\n') {
        return Err(ParseError::ProtocolError(
            "bare CR or LF inside a line frame".to_string(),
        ));
    }

    let text = std::str::from_utf8(content)
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?
        .to_string();
    Ok(Some((text, consumed)))
}

/// Parses a canonical decimal header: at most one leading `+` or `-`, no
/// leading zero unless the value is exactly 0, ASCII digits otherwise.
///
/// Stricter than `str::parse::<i64>`, which also accepts forms like `007`
/// that a conforming RESP peer never emits.
fn parse_decimal(line: &[u8]) -> ParseResult<i64> {
    let digits = match line.first() {
        None => return Err(ParseError::InvalidInteger("empty header".to_string())),
        Some(b'+') | Some(b'-') => &line[1..],
        Some(_) => line,
    };

    if digits.is_empty() {
        return Err(ParseError::InvalidInteger("sign without digits".to_string()));
    }
    if digits[0] == b'0' && digits.len() > 1 {
        return Err(ParseError::InvalidInteger("leading zero".to_string()));
    }
    if !digits.iter().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidInteger("non-digit character".to_string()));
    }

    // Every byte is ASCII at this point; str::parse has only overflow left
    // to report.
    std::str::from_utf8(line)
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?
        .parse()
        .map_err(|_| ParseError::InvalidInteger("out of range".to_string()))
}

/// Finds the first CRLF pair, returning the index of the `\r`.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    for i in 0..buf.len().saturating_sub(1) {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            return Some(i);
        }
    }
    None
}
