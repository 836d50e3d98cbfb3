//! RESP wire protocol: value model, parser, and encoder.
//!
//! RESP (Redis Serialization Protocol) is the binary-safe, line-oriented
//! format this server speaks. Incoming bytes go through [`parser::parse`],
//! which decodes one value at a time and tells the caller exactly how many
//! bytes it used; outgoing [`types::RespValue`]s serialize themselves back
//! into wire form.
//!
//! ## Example
//!
//! ```
//! use flintkv::protocol::{parse, RespValue};
//! use bytes::Bytes;
//!
//! // Decoding a request
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (request, consumed) = parse(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! // Encoding a response
//! let response = RespValue::bulk_string(Bytes::from("value"));
//! assert_eq!(response.serialize(), b"$5\r\nvalue\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used items for convenience
pub use parser::{parse, ParseError, ParseResult};
pub use types::RespValue;
