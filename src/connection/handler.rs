//! Per-connection I/O loop.
//!
//! Each client gets one handler task that owns a read buffer and walks the
//! request pipeline until the client goes away:
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌────────────────────────────────────┐
//!    │            Main Loop               │
//!    │                                    │
//!    │  ┌───────────────────────────────┐ │
//!    │  │ Parse one frame from buffer   │ │──── need more data ──┐
//!    │  └──────────────┬────────────────┘ │                      │
//!    │                 ▼                  │   ┌────────────────┐ │
//!    │  ┌───────────────────────────────┐ │   │ read from the  │◄┘
//!    │  │ Decode frame into a Command   │ │   │ socket, append │
//!    │  └──────────────┬────────────────┘ │   └────────────────┘
//!    │                 ▼                  │
//!    │  ┌───────────────────────────────┐ │
//!    │  │ Execute under the store lock  │ │
//!    │  └──────────────┬────────────────┘ │
//!    │                 ▼                  │
//!    │  ┌───────────────────────────────┐ │
//!    │  │ Serialize and send the reply  │ │
//!    │  └──────────────┬────────────────┘ │
//!    │                 ▼                  │
//!    │            [loop back]             │
//!    └────────────────────────────────────┘
//! ```
//!
//! TCP is a byte stream: one read may contain half a command or several
//! commands. The buffer accumulates until [`parse`] reports a complete
//! frame, and `consumed` alone decides how far the buffer advances, so
//! pipelined requests are answered strictly in arrival order.
//!
//! Error discipline: semantic command failures are replies, not errors;
//! the connection keeps going. A parse or decode failure means the byte
//! stream itself can no longer be trusted; the handler sends one final
//! `ERR protocol error` frame and drops the connection rather than guess
//! where the next request begins.

use crate::commands::{Command, CommandRegistry, DecodeError};
use crate::protocol::{parse, ParseError, RespValue};
use crate::storage::Store;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum bytes buffered for a single pending command (1 MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Process-wide connection counters, shared by every handler task.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands executed
    pub commands_processed: AtomicU64,
    /// Connections terminated for malformed requests
    pub protocol_errors: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed RESP framing
    #[error("parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Well-framed value that is not a valid command shape
    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),

    /// Client disconnected between commands
    #[error("client disconnected")]
    ClientDisconnected,

    /// Stream ended in the middle of a command
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A single pending command outgrew the buffer cap
    #[error("buffer size limit exceeded")]
    BufferFull,
}

/// State for one client connection: socket, read buffer, and handles to the
/// shared registry, store, and counters.
pub struct ConnectionHandler {
    /// Buffered writer around the TCP stream
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Accumulates incoming bytes until a full frame is present
    buffer: BytesMut,

    /// Command table, shared by reference across connections
    registry: Arc<CommandRegistry>,

    /// The shared store; locked once per command execution
    store: Arc<Mutex<Store>>,

    /// Shared connection counters
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    /// Creates a handler for an accepted connection and counts it as open.
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        registry: Arc<CommandRegistry>,
        store: Arc<Mutex<Store>>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            registry,
            store,
            stats,
        }
    }

    /// Runs the connection to completion, logging how it ended.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The parse-decode-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            // Drain every complete request already buffered before touching
            // the socket again; pipelined replies must go out in order.
            loop {
                let frame = match self.try_parse_frame() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(err) => {
                        self.reject_protocol_violation(&err.to_string()).await;
                        return Err(ConnectionError::ParseError(err));
                    }
                };

                let response = match Command::try_from(frame) {
                    Ok(command) => self.execute(&command),
                    Err(err) => {
                        self.reject_protocol_violation(&err.to_string()).await;
                        return Err(ConnectionError::DecodeError(err));
                    }
                };

                self.stats.command_processed();
                self.send_response(&response).await?;
            }

            self.read_more_data().await?;
        }
    }

    /// Attempts to cut one complete frame off the front of the buffer.
    fn try_parse_frame(&mut self) -> Result<Option<RespValue>, ParseError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match parse(&self.buffer)? {
            Some((frame, consumed)) => {
                // The parser's byte count is the only framing authority.
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    frame = %frame,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed frame"
                );
                Ok(Some(frame))
            }
            None => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete frame, need more data"
                );
                Ok(None)
            }
        }
    }

    /// Executes one command while holding the store lock.
    ///
    /// The guard never crosses an await: execution is synchronous, and the
    /// reply is sent after the lock is released.
    fn execute(&self, command: &Command) -> RespValue {
        let mut store = self.store.lock().unwrap();
        self.registry.execute(command, &mut store)
    }

    /// Sends the final error frame for a malformed request, best effort.
    ///
    /// After a framing violation the remaining buffered bytes have no
    /// trustworthy start offset, so the caller must drop the connection
    /// instead of resuming.
    async fn reject_protocol_violation(&mut self, reason: &str) {
        self.stats.protocol_error();
        warn!(client = %self.addr, reason = %reason, "Protocol violation, closing connection");

        let notice = RespValue::error(format!("ERR protocol error: {}", reason));
        if let Err(e) = self.send_response(&notice).await {
            debug!(client = %self.addr, error = %e, "Could not deliver protocol error notice");
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // EOF: clean between commands, an error in the middle of one.
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        trace!(client = %self.addr, bytes = n, "Read data");
        Ok(())
    }

    /// Serializes and sends one reply.
    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }
}

/// Spawn entry point: runs a connection to completion and swallows the
/// outcome, logging anything unexpected.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<CommandRegistry>,
    store: Arc<Mutex<Store>>,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, registry, store, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_test::assert_ok;

    async fn create_test_server() -> (SocketAddr, Arc<Mutex<Store>>, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry = Arc::new(CommandRegistry::new());
        let store = Arc::new(Mutex::new(Store::new()));
        let stats = Arc::new(ConnectionStats::new());

        let accept_registry = Arc::clone(&registry);
        let accept_store = Arc::clone(&store);
        let accept_stats = Arc::clone(&stats);

        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                tokio::spawn(handle_connection(
                    stream,
                    client_addr,
                    Arc::clone(&accept_registry),
                    Arc::clone(&accept_store),
                    Arc::clone(&accept_stats),
                ));
            }
        });

        (addr, store, stats)
    }

    /// Reads exactly as many bytes as `expected` and compares them.
    async fn expect_reply(client: &mut TcpStream, expected: &[u8]) {
        let mut buf = vec![0u8; expected.len()];
        timeout(Duration::from_secs(5), client.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buf, expected);
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        expect_reply(&mut client, b"+PONG\r\n").await;
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$5\r\nalice\r\n")
            .await
            .unwrap();
        expect_reply(&mut client, b"+OK\r\n").await;

        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
            .await
            .unwrap();
        expect_reply(&mut client, b"$5\r\nalice\r\n").await;
    }

    #[tokio::test]
    async fn test_get_missing_returns_null() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$7\r\nmissing\r\n")
            .await
            .unwrap();
        expect_reply(&mut client, b"$-1\r\n").await;
    }

    #[tokio::test]
    async fn test_command_split_across_writes() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        // First half of an ECHO command, cut inside a bulk string header.
        client.write_all(b"*2\r\n$4\r\nEC").await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        client.write_all(b"HO\r\n$5\r\nhello\r\n").await.unwrap();
        expect_reply(&mut client, b"$5\r\nhello\r\n").await;
    }

    #[tokio::test]
    async fn test_pipelined_commands_reply_in_order() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client
            .write_all(
                b"*3\r\n$3\r\nSET\r\n$2\r\nk1\r\n$2\r\nv1\r\n\
                  *3\r\n$3\r\nSET\r\n$2\r\nk2\r\n$2\r\nv2\r\n\
                  *2\r\n$3\r\nGET\r\n$2\r\nk1\r\n\
                  *2\r\n$3\r\nGET\r\n$2\r\nk2\r\n",
            )
            .await
            .unwrap();

        expect_reply(&mut client, b"+OK\r\n+OK\r\n$2\r\nv1\r\n$2\r\nv2\r\n").await;
    }

    #[tokio::test]
    async fn test_command_error_keeps_connection_usable() {
        let (addr, _, stats) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"*1\r\n$4\r\nECHO\r\n").await.unwrap();
        expect_reply(
            &mut client,
            b"-ERR wrong number of arguments for 'ECHO' command\r\n",
        )
        .await;

        client.write_all(b"*1\r\n$4\r\nNOPE\r\n").await.unwrap();
        expect_reply(&mut client, b"-ERR unknown command 'NOPE'\r\n").await;

        // Semantic failures are replies, not protocol violations.
        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        expect_reply(&mut client, b"+PONG\r\n").await;
        assert_eq!(stats.protocol_errors.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_malformed_framing_closes_connection() {
        let (addr, _, stats) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        // 'H' is not a RESP type tag; inline commands are not spoken here.
        client.write_all(b"HELLO\r\n").await.unwrap();
        expect_reply(
            &mut client,
            b"-ERR protocol error: invalid type byte: 0x48\r\n",
        )
        .await;

        // The server hangs up after the notice.
        let mut buf = [0u8; 16];
        let n = timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.protocol_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_non_array_request_closes_connection() {
        let (addr, _, _) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        // A well-framed integer is still not a command.
        client.write_all(b":5\r\n").await.unwrap();
        expect_reply(
            &mut client,
            b"-ERR protocol error: expected a non-null array of bulk strings\r\n",
        )
        .await;

        let mut buf = [0u8; 16];
        let n = timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_oversized_pending_command_closes_connection() {
        let (addr, _, stats) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        // A single ECHO whose argument alone is twice the buffer cap. The
        // frame never completes; the buffer hits the cap first.
        let payload_len = 2 * MAX_BUFFER_SIZE;
        let header = format!("*2\r\n$4\r\nECHO\r\n${}\r\n", payload_len);
        assert_ok!(client.write_all(header.as_bytes()).await);

        // Stream the payload until it is all sent or the server hangs up
        // mid-transfer and the write fails.
        let chunk = vec![b'x'; 64 * 1024];
        let mut sent = 0;
        while sent < payload_len {
            if client.write_all(&chunk).await.is_err() {
                break;
            }
            sent += chunk.len();
        }

        // No reply, not even an error frame. Closing while payload is
        // still in flight may surface as a reset rather than a clean EOF.
        let mut buf = [0u8; 16];
        match timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .unwrap()
        {
            Ok(n) => assert_eq!(n, 0),
            Err(_) => {}
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.protocol_errors.load(Ordering::Relaxed), 0);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_eof_mid_frame_closes_without_reply() {
        let (addr, _, stats) = create_test_server().await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        // Half an ECHO command, then close the write side for good.
        assert_ok!(client.write_all(b"*2\r\n$4\r\nEC").await);
        assert_ok!(client.shutdown().await);

        let mut buf = [0u8; 16];
        let n = timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);

        // A truncated stream is an I/O condition, not a protocol violation.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.protocol_errors.load(Ordering::Relaxed), 0);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_connection_stats() {
        let (addr, _, stats) = create_test_server().await;

        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);

        let mut client = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        expect_reply(&mut client, b"+PONG\r\n").await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);

        drop(client);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }
}
