//! In-process loopback ports connected by a channel.

use crate::{
    message::Message,
    ports::{check_sendable, CloseHandle, Input, Output, Port, PortConfig},
    prelude::*,
};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TryRecvError};
use tracing::{debug, trace};

/// Create a connected pair of ports: messages sent on the output arrive at the input, in order.
///
/// Closing the output lets the input drain what was already sent, after which its `receive`
/// fails with `Error::PortClosed`.
pub fn pipe(name: &str, config: PortConfig) -> (ChannelOutput, ChannelInput) {
    let (tx, rx) = match config.capacity {
        Some(cap) => bounded(cap),
        None => unbounded(),
    };
    debug!("Created loopback port pair: {}", name);
    (
        ChannelOutput {
            name: name.to_string(),
            tx: Some(tx),
            closer: CloseHandle::new(),
        },
        ChannelInput {
            name: name.to_string(),
            rx,
            closer: CloseHandle::new(),
        },
    )
}

/// The receiving end of a [`pipe`](fn.pipe.html).
#[derive(Debug)]
pub struct ChannelInput {
    name: String,
    rx: Receiver<Message>,
    closer: CloseHandle,
}

impl Port for ChannelInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        if self.closer.close() {
            debug!("Closed loopback input: {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl Input for ChannelInput {
    fn receive(&mut self) -> Result<Message> {
        ensure!(!self.is_closed(), Error::PortClosed);
        select! {
            recv(self.rx) -> msg => msg.map_err(|_| Error::PortClosed),
            recv(self.closer.wake()) -> _ => Err(Error::PortClosed),
        }
    }

    fn poll(&mut self) -> Result<Option<Message>> {
        if self.is_closed() {
            return Ok(None);
        }
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn has_pending(&mut self) -> Result<bool> {
        Ok(!self.is_closed() && !self.rx.is_empty())
    }
}

impl Drop for ChannelInput {
    fn drop(&mut self) {
        self.close();
    }
}

/// The sending end of a [`pipe`](fn.pipe.html).
#[derive(Debug)]
pub struct ChannelOutput {
    name: String,
    tx: Option<Sender<Message>>,
    closer: CloseHandle,
}

impl Port for ChannelOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        // Dropping the sender lets the input see the disconnection
        self.tx = None;
        if self.closer.close() {
            debug!("Closed loopback output: {}", self.name);
        }
    }

    fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }
}

impl Output for ChannelOutput {
    fn send(&mut self, msg: &Message) -> Result<()> {
        check_sendable(msg)?;
        let tx = match (&self.tx, self.closer.is_closed()) {
            (Some(tx), false) => tx,
            _ => bail!(Error::PortClosed),
        };
        trace!(%msg, "sending on {}", self.name);
        select! {
            send(tx, msg.clone()) -> res => res.map_err(|_| Error::PortClosed),
            recv(self.closer.wake()) -> _ => Err(Error::PortClosed),
        }
    }
}

impl Drop for ChannelOutput {
    fn drop(&mut self) {
        self.close();
    }
}
