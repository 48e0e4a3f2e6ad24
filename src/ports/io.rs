//! Pairing an input and an output behind one port.

use crate::{
    message::Message,
    ports::{CloseHandle, Input, Output, Port},
    prelude::*,
};
use tracing::debug;

/// A bidirectional port: `receive` and friends go to the input, `send` goes to the output.
///
/// Closing it closes both halves. A close handle of the pair closes both halves as well, which
/// releases a thread blocked in `receive`.
#[derive(Debug)]
pub struct IoPort<I: Input, O: Output> {
    name: String,
    input: I,
    output: O,
    closer: CloseHandle,
}

impl<I: Input, O: Output> IoPort<I, O> {
    pub fn new(input: I, output: O) -> IoPort<I, O> {
        let name = format!("{} / {}", input.name(), output.name());
        let closer = CloseHandle::new();
        closer.link(input.close_handle());
        closer.link(output.close_handle());
        IoPort {
            name,
            input,
            output,
            closer,
        }
    }

    #[inline]
    pub fn input(&self) -> &I {
        &self.input
    }

    #[inline]
    pub fn output(&self) -> &O {
        &self.output
    }
}

impl<I: Input, O: Output> Port for IoPort<I, O> {
    fn name(&self) -> &str {
        &self.name
    }

    /// Closes both halves. A half that fails to release its resource logs the failure, and the
    /// other half is closed regardless.
    fn close(&mut self) {
        let newly = self.closer.close();
        self.input.close();
        self.output.close();
        if newly {
            debug!("Closed io port: {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.closer.is_closed() || (self.input.is_closed() && self.output.is_closed())
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl<I: Input, O: Output> Input for IoPort<I, O> {
    fn receive(&mut self) -> Result<Message> {
        self.input.receive()
    }

    fn poll(&mut self) -> Result<Option<Message>> {
        self.input.poll()
    }

    fn has_pending(&mut self) -> Result<bool> {
        self.input.has_pending()
    }
}

impl<I: Input, O: Output> Output for IoPort<I, O> {
    fn send(&mut self, msg: &Message) -> Result<()> {
        self.output.send(msg)
    }
}

impl<I: Input, O: Output> Drop for IoPort<I, O> {
    fn drop(&mut self) {
        self.close();
    }
}
