use std::io::{ErrorKind, Read};
use std::net::TcpStream;

use bytes::BytesMut;

use crate::codec::{decode_message, Message, VbusConfig};
use crate::error::{Result, VbusError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete live messages from any `Read` stream.
///
/// Partial reads and leading garbage are handled internally. A message
/// with a bad checksum is reported once; the next call resumes at the
/// following SYNC byte.
pub struct LiveReader<T> {
    inner: T,
    buf: BytesMut,
    config: VbusConfig,
}

impl<T: Read> LiveReader<T> {
    /// Create a new live reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, VbusConfig::default())
    }

    /// Create a new live reader with explicit configuration.
    pub fn with_config(inner: T, config: VbusConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(VbusError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = decode_message(&mut self.buf, &self.config)? {
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(VbusError::Io(err)),
            };

            if read == 0 {
                return Err(VbusError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &VbusConfig {
        &self.config
    }
}

impl LiveReader<TcpStream> {
    /// Create a reader for a LAN adapter socket and apply the read timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: VbusConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
