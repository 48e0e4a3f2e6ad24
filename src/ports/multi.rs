//! Multiplexing several inputs into one.

use crate::{
    message::Message,
    ports::{CloseHandle, Input, Port, PortConfig},
    prelude::*,
};
use crossbeam_channel::RecvTimeoutError;
use tracing::debug;

/// An input that multiplexes the messages of several inputs.
///
/// Inputs are visited round-robin, so every input with pending messages is eventually drained.
/// Messages of one input keep their order; there is no ordering between different inputs.
///
/// The `*_tagged` methods additionally report which input (by index) each message came from.
///
/// Closing a `MultiPort` does not close its inputs, but dropping it drops them.
pub struct MultiPort {
    name: String,
    ports: Vec<Box<dyn Input + Send>>,
    next: usize,
    config: PortConfig,
    closer: CloseHandle,
}

impl MultiPort {
    pub fn new(ports: Vec<Box<dyn Input + Send>>) -> MultiPort {
        MultiPort::with_config(ports, PortConfig::default())
    }

    pub fn with_config(ports: Vec<Box<dyn Input + Send>>, config: PortConfig) -> MultiPort {
        let name = ports
            .iter()
            .map(|port| port.name())
            .collect::<Vec<_>>()
            .join(", ");
        debug!("Created multi port over {} inputs", ports.len());
        MultiPort {
            name: format!("multi({})", name),
            ports,
            next: 0,
            config,
            closer: CloseHandle::new(),
        }
    }

    /// Add another input, which gets the next index.
    pub fn push(&mut self, port: Box<dyn Input + Send>) {
        self.ports.push(port);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Borrow one of the inputs.
    pub fn port(&self, index: usize) -> Option<&(dyn Input + Send)> {
        self.ports.get(index).map(|port| &**port)
    }

    /// Take the inputs back out, leaving the multi port empty.
    pub fn take_ports(&mut self) -> Vec<Box<dyn Input + Send>> {
        self.next = 0;
        std::mem::take(&mut self.ports)
    }

    /// Return the next ready message and the index of its input, without blocking.
    pub fn poll_tagged(&mut self) -> Result<Option<(usize, Message)>> {
        if self.is_closed() {
            return Ok(None);
        }
        let count = self.ports.len();
        for offset in 0..count {
            let idx = (self.next + offset) % count;
            let port = &mut self.ports[idx];
            if port.is_closed() {
                continue;
            }
            if let Some(msg) = port.poll()? {
                self.next = (idx + 1) % count;
                return Ok(Some((idx, msg)));
            }
        }
        Ok(None)
    }

    /// Wait for the next message from any input, returning the index of its input as well.
    ///
    /// Fails with `Error::PortClosed` once this port is closed, or once every input is closed.
    pub fn receive_tagged(&mut self) -> Result<(usize, Message)> {
        loop {
            ensure!(!self.is_closed(), Error::PortClosed);
            if let Some(tagged) = self.poll_tagged()? {
                return Ok(tagged);
            }
            ensure!(
                self.ports.iter().any(|port| !port.is_closed()),
                Error::PortClosed
            );
            match self.closer.wake().recv_timeout(self.config.poll_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                _ => bail!(Error::PortClosed),
            }
        }
    }

    /// Iterate over the messages that are ready right now, along with the index of their input.
    pub fn iter_pending_tagged(&mut self) -> impl Iterator<Item = Result<(usize, Message)>> + '_ {
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            match self.poll_tagged() {
                Ok(Some(tagged)) => Some(Ok(tagged)),
                Ok(None) => {
                    done = true;
                    None
                }
                Err(err) => {
                    done = true;
                    Some(Err(err))
                }
            }
        })
    }
}

impl Port for MultiPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        if self.closer.close() {
            debug!("Closed multi port: {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl Input for MultiPort {
    fn receive(&mut self) -> Result<Message> {
        self.receive_tagged().map(|(_, msg)| msg)
    }

    fn poll(&mut self) -> Result<Option<Message>> {
        Ok(self.poll_tagged()?.map(|(_, msg)| msg))
    }

    fn has_pending(&mut self) -> Result<bool> {
        if self.is_closed() {
            return Ok(false);
        }
        for port in self.ports.iter_mut() {
            if !port.is_closed() && port.has_pending()? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Drop for MultiPort {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for MultiPort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MultiPort")
            .field("name", &self.name)
            .field("ports", &self.ports.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
