//! Ports over raw byte streams, such as a serial line, a socket or a device file.
//!
//! Incoming bytes go through a [`Parser`](../../struct.Parser.html), so the source may deliver them
//! in arbitrary chunks, with running status and interleaved realtime bytes.

use crate::{
    message::Message,
    parser::{Parser, ParserConfig},
    ports::{check_sendable, CloseHandle, Input, Output, Port, PortConfig},
    prelude::*,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::io;
use tracing::{debug, trace, warn};

/// The result of asking a byte source for more bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were appended to the buffer.
    Bytes(usize),
    /// Nothing arrived within the allowed wait.
    Empty,
    /// The source has ended and will never produce bytes again.
    Eof,
}

/// Something that produces raw MIDI bytes.
pub trait ByteSource: Send {
    /// Append whatever bytes are available to `buf`.
    ///
    /// With `wait` set to `None` this must not block; otherwise it may wait up to that long for
    /// bytes to arrive.
    fn read_available(&mut self, buf: &mut Vec<u8>, wait: Option<Duration>)
        -> io::Result<ReadOutcome>;

    /// Release the underlying resource. Called once, when the port closes.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Something that consumes raw MIDI bytes.
pub trait ByteSink: Send {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Release the underlying resource. Called once, when the port closes.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteSource for Receiver<Vec<u8>> {
    fn read_available(
        &mut self,
        buf: &mut Vec<u8>,
        wait: Option<Duration>,
    ) -> io::Result<ReadOutcome> {
        let first = match wait {
            None => match self.try_recv() {
                Ok(chunk) => chunk,
                Err(TryRecvError::Empty) => return Ok(ReadOutcome::Empty),
                Err(TryRecvError::Disconnected) => return Ok(ReadOutcome::Eof),
            },
            Some(timeout) => match self.recv_timeout(timeout) {
                Ok(chunk) => chunk,
                Err(RecvTimeoutError::Timeout) => return Ok(ReadOutcome::Empty),
                Err(RecvTimeoutError::Disconnected) => return Ok(ReadOutcome::Eof),
            },
        };
        let mut count = first.len();
        buf.extend_from_slice(&first);
        while let Ok(chunk) = self.try_recv() {
            count += chunk.len();
            buf.extend_from_slice(&chunk);
        }
        Ok(ReadOutcome::Bytes(count))
    }
}

impl ByteSink for Sender<Vec<u8>> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.send(bytes.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "byte receiver disconnected"))
    }
}

/// Adapts any `io::Read` as a byte source.
///
/// Reads block for as long as the reader does, so closing the port from another thread takes
/// effect once the pending read returns.
#[derive(Debug)]
pub struct ReadSource<R>(pub R);

impl<R: io::Read + Send> ByteSource for ReadSource<R> {
    fn read_available(
        &mut self,
        buf: &mut Vec<u8>,
        _wait: Option<Duration>,
    ) -> io::Result<ReadOutcome> {
        let mut chunk = [0; 1024];
        match self.0.read(&mut chunk) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(len) => {
                buf.extend_from_slice(&chunk[..len]);
                Ok(ReadOutcome::Bytes(len))
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(ReadOutcome::Empty)
            }
            Err(err) => Err(err),
        }
    }
}

/// Adapts any `io::Write` as a byte sink. Every message is flushed as soon as it is written.
#[derive(Debug)]
pub struct WriteSink<W>(pub W);

impl<W: io::Write + Send> ByteSink for WriteSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.write_all(bytes)?;
        self.0.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// An input port decoding messages out of a byte source.
pub struct StreamInput<S: ByteSource> {
    name: String,
    source: S,
    parser: Parser,
    config: PortConfig,
    closer: CloseHandle,
    scratch: Vec<u8>,
    eof: bool,
    released: bool,
}

impl<S: ByteSource> StreamInput<S> {
    pub fn new(name: &str, source: S, config: PortConfig) -> StreamInput<S> {
        StreamInput::with_parser(name, source, config, ParserConfig::default())
    }

    pub fn with_parser(
        name: &str,
        source: S,
        config: PortConfig,
        parser: ParserConfig,
    ) -> StreamInput<S> {
        debug!("Opened stream input: {}", name);
        StreamInput {
            name: name.to_string(),
            source,
            parser: Parser::with_config(parser),
            config,
            closer: CloseHandle::new(),
            scratch: Vec::new(),
            eof: false,
            released: false,
        }
    }

    /// Read what the source has to offer into the parser.
    fn fill(&mut self, wait: Option<Duration>) -> Result<()> {
        if self.eof {
            return Ok(());
        }
        self.scratch.clear();
        match self.source.read_available(&mut self.scratch, wait)? {
            ReadOutcome::Bytes(_) => self.parser.feed(&self.scratch),
            ReadOutcome::Empty => {}
            ReadOutcome::Eof => {
                debug!("Stream input reached end of source: {}", self.name);
                self.eof = true;
            }
        }
        Ok(())
    }
}

impl<S: ByteSource> Port for StreamInput<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        let newly = self.closer.close();
        if !self.released {
            self.released = true;
            if let Err(err) = self.source.close() {
                warn!("Failed to close byte source of {}: {}", self.name, err);
            }
        }
        if newly {
            debug!("Closed stream input: {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl<S: ByteSource> Input for StreamInput<S> {
    /// Waits in steps of the configured poll interval, so that closing from another thread is
    /// noticed within one step.
    fn receive(&mut self) -> Result<Message> {
        loop {
            ensure!(!self.is_closed(), Error::PortClosed);
            if let Some(msg) = self.parser.pull() {
                return Ok(msg);
            }
            ensure!(!self.eof, Error::PortClosed);
            self.fill(Some(self.config.poll_interval))?;
        }
    }

    fn poll(&mut self) -> Result<Option<Message>> {
        if self.is_closed() {
            return Ok(None);
        }
        if self.parser.pending() == 0 {
            self.fill(None)?;
        }
        Ok(self.parser.pull())
    }

    fn has_pending(&mut self) -> Result<bool> {
        if self.is_closed() {
            return Ok(false);
        }
        if self.parser.pending() == 0 {
            self.fill(None)?;
        }
        Ok(self.parser.pending() > 0)
    }
}

impl<S: ByteSource> Drop for StreamInput<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: ByteSource> fmt::Debug for StreamInput<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StreamInput")
            .field("name", &self.name)
            .field("pending", &self.parser.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// An output port encoding messages into a byte sink.
pub struct StreamOutput<W: ByteSink> {
    name: String,
    sink: W,
    closer: CloseHandle,
    released: bool,
}

impl<W: ByteSink> StreamOutput<W> {
    pub fn new(name: &str, sink: W) -> StreamOutput<W> {
        debug!("Opened stream output: {}", name);
        StreamOutput {
            name: name.to_string(),
            sink,
            closer: CloseHandle::new(),
            released: false,
        }
    }
}

impl<W: ByteSink> Port for StreamOutput<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        let newly = self.closer.close();
        if !self.released {
            self.released = true;
            if let Err(err) = self.sink.close() {
                warn!("Failed to close byte sink of {}: {}", self.name, err);
            }
        }
        if newly {
            debug!("Closed stream output: {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl<W: ByteSink> Output for StreamOutput<W> {
    fn send(&mut self, msg: &Message) -> Result<()> {
        check_sendable(msg)?;
        ensure!(!self.is_closed(), Error::PortClosed);
        trace!(%msg, "writing to {}", self.name);
        self.sink.write_bytes(&msg.to_bytes())?;
        Ok(())
    }
}

impl<W: ByteSink> Drop for StreamOutput<W> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<W: ByteSink> fmt::Debug for StreamOutput<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StreamOutput")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
