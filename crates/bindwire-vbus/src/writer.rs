use std::io::{ErrorKind, Write};
use std::net::TcpStream;

use bytes::BytesMut;

use crate::codec::{encode, Message, VbusConfig};
use crate::error::{Result, VbusError};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete live messages to any `Write` stream.
///
/// Sink failures surface as [`VbusError::Io`] without retry; only
/// `Interrupted` is resumed.
pub struct LiveWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> LiveWriter<T> {
    /// Create a new live writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a message using its own addressing (blocking).
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        let header = message.header();
        self.send(message, header.destination, header.source)
    }

    /// Encode and send a message with explicit addressing.
    pub fn send(&mut self, message: &Message, destination: u16, source: u16) -> Result<()> {
        self.buf.clear();
        encode(message, destination, source, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(VbusError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(VbusError::Io(err)),
            }
        }

        tracing::trace!(
            protocol = message.protocol(),
            destination,
            source,
            bytes = self.buf.len(),
            "sent VBus message"
        );
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(VbusError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl LiveWriter<TcpStream> {
    /// Create a writer for a LAN adapter socket and apply the write timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: &VbusConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::new(inner))
    }
}
