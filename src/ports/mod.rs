//! A uniform blocking and non-blocking interface over sources and sinks of MIDI messages.
//!
//! Ports are described by small capability traits rather than a class hierarchy:
//!
//! - [`Port`](trait.Port.html) is what every port can do: report its name and close.
//! - [`Input`](trait.Input.html) ports produce messages, either blocking (`receive`, `iter`) or
//!   not (`poll`, `iter_pending`).
//! - [`Output`](trait.Output.html) ports consume messages through `send`.
//!
//! Concrete ports close themselves when dropped, and closing is always idempotent.
//! A thread blocked in `receive` on a port can be released from another thread through the
//! port's [`CloseHandle`](struct.CloseHandle.html): the blocked call returns
//! `Err(Error::PortClosed)` promptly.

use crate::{
    message::{Message, MidiMessage},
    prelude::*,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub mod channel;
pub mod io;
pub mod multi;
pub mod play;
pub mod stream;

pub use self::{
    channel::{pipe, ChannelInput, ChannelOutput},
    io::IoPort,
    multi::MultiPort,
    play::{play, PlayHandle, PlayOutcome},
    stream::{ByteSink, ByteSource, ReadOutcome, ReadSource, StreamInput, StreamOutput, WriteSink},
};

/// Tunables shared by the concrete ports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PortConfig {
    /// How long a blocking call waits on a source that cannot signal arrivals before looking
    /// again.
    pub poll_interval: Duration,
    /// The number of messages a channel port buffers before `send` blocks.
    /// `None` means unbounded.
    pub capacity: Option<usize>,
}
impl Default for PortConfig {
    fn default() -> PortConfig {
        PortConfig {
            poll_interval: Duration::from_millis(1),
            capacity: None,
        }
    }
}
impl PortConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> PortConfig {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> PortConfig {
        self.capacity = Some(capacity);
        self
    }
}

#[derive(Debug)]
struct CloseState {
    closed: AtomicBool,
    /// Dropped on close, which wakes up everyone selecting on `wake`.
    signal: Mutex<Option<Sender<()>>>,
    wake: Receiver<()>,
    linked: Mutex<Vec<CloseHandle>>,
}

/// A shareable handle that closes a port, possibly from another thread.
///
/// Every clone refers to the same port. Closing is idempotent.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    state: Arc<CloseState>,
}
impl Default for CloseHandle {
    fn default() -> CloseHandle {
        CloseHandle::new()
    }
}
impl CloseHandle {
    pub fn new() -> CloseHandle {
        let (signal, wake) = bounded(0);
        CloseHandle {
            state: Arc::new(CloseState {
                closed: AtomicBool::new(false),
                signal: Mutex::new(Some(signal)),
                wake,
                linked: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Close the port. Returns `true` if this call is the one that closed it.
    pub fn close(&self) -> bool {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.state.signal.lock().take();
        let linked = std::mem::take(&mut *self.state.linked.lock());
        for handle in linked {
            handle.close();
        }
        true
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// A receiver that becomes disconnected once the port is closed, for use in `select!`.
    #[inline]
    pub(crate) fn wake(&self) -> &Receiver<()> {
        &self.state.wake
    }

    /// Close `other` whenever this handle is closed.
    pub(crate) fn link(&self, other: CloseHandle) {
        if self.is_closed() {
            other.close();
        } else {
            self.state.linked.lock().push(other);
        }
    }
}

/// What every port can do.
pub trait Port {
    /// A human-readable name for the port.
    fn name(&self) -> &str;

    /// Close the port. Calling this any number of times is fine, and it never fails.
    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// A handle that closes this port from anywhere, releasing blocked calls.
    fn close_handle(&self) -> CloseHandle;
}

/// A port that produces messages.
pub trait Input: Port {
    /// Wait for the next message.
    ///
    /// Fails with `Error::PortClosed` if the port is closed, either before or during the wait.
    fn receive(&mut self) -> Result<Message>;

    /// Return the next message if one is ready, without blocking.
    ///
    /// Returns `Ok(None)` on a closed port.
    fn poll(&mut self) -> Result<Option<Message>>;

    /// Returns `true` if `poll` would return a message right now.
    fn has_pending(&mut self) -> Result<bool>;

    /// Iterate over the messages that are ready right now, without blocking.
    fn iter_pending(&mut self) -> IterPending<'_, Self>
    where
        Self: Sized,
    {
        IterPending {
            port: self,
            done: false,
        }
    }

    /// Iterate over messages as they arrive, blocking between them, until the port closes.
    fn iter(&mut self) -> Iter<'_, Self>
    where
        Self: Sized,
    {
        Iter {
            port: self,
            done: false,
        }
    }
}

/// Whether a message may be sent to a live port. Meta messages only exist inside tracks.
pub(crate) fn check_sendable(msg: &Message) -> Result<()> {
    ensure!(
        !msg.is_meta(),
        Error::InvalidValue {
            field: "type",
            reason: "meta messages cannot be sent to a port",
        }
    );
    Ok(())
}

/// A port that consumes messages.
pub trait Output: Port {
    /// Send a message. The caller's message is never modified.
    ///
    /// Fails with `Error::PortClosed` on a closed port.
    fn send(&mut self, msg: &Message) -> Result<()>;

    /// Turn off every note on every channel and reset all controllers.
    fn reset(&mut self) -> Result<()> {
        for channel in 0..16 {
            let channel = u4::from_int_lossy(channel);
            for note in 0..128 {
                self.send(&Message::from_midi(MidiMessage::NoteOff {
                    channel,
                    note: u7::from_int_lossy(note),
                    velocity: u7::from_int_lossy(0),
                }))?;
            }
            self.send(&control(channel, 121))?;
        }
        Ok(())
    }

    /// Silence every channel immediately, through "all sound off".
    fn panic(&mut self) -> Result<()> {
        for channel in 0..16 {
            self.send(&control(u4::from_int_lossy(channel), 120))?;
        }
        Ok(())
    }
}

fn control(channel: u4, control: u8) -> Message {
    Message::from_midi(MidiMessage::ControlChange {
        channel,
        control: u7::from_int_lossy(control),
        value: u7::from_int_lossy(0),
    })
}

macro_rules! forward_port {
    ($ty:ty) => {
        impl<P: Port + ?Sized> Port for $ty {
            fn name(&self) -> &str {
                (**self).name()
            }
            fn close(&mut self) {
                (**self).close()
            }
            fn is_closed(&self) -> bool {
                (**self).is_closed()
            }
            fn close_handle(&self) -> CloseHandle {
                (**self).close_handle()
            }
        }
        impl<P: Input + ?Sized> Input for $ty {
            fn receive(&mut self) -> Result<Message> {
                (**self).receive()
            }
            fn poll(&mut self) -> Result<Option<Message>> {
                (**self).poll()
            }
            fn has_pending(&mut self) -> Result<bool> {
                (**self).has_pending()
            }
        }
        impl<P: Output + ?Sized> Output for $ty {
            fn send(&mut self, msg: &Message) -> Result<()> {
                (**self).send(msg)
            }
        }
    };
}
forward_port!(Box<P>);
forward_port!(&mut P);

/// Non-blocking iterator over the messages an input has ready.
///
/// Yields an error at most once, after which it ends.
#[derive(Debug)]
pub struct IterPending<'a, P> {
    port: &'a mut P,
    done: bool,
}
impl<P: Input> Iterator for IterPending<'_, P> {
    type Item = Result<Message>;
    fn next(&mut self) -> Option<Result<Message>> {
        if self.done {
            return None;
        }
        match self.port.poll() {
            Ok(Some(msg)) => Some(Ok(msg)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Blocking iterator over the messages of an input, ending when the port closes.
///
/// Errors other than the port closing are yielded once, after which it ends.
#[derive(Debug)]
pub struct Iter<'a, P> {
    port: &'a mut P,
    done: bool,
}
impl<P: Input> Iterator for Iter<'_, P> {
    type Item = Result<Message>;
    fn next(&mut self) -> Option<Result<Message>> {
        if self.done {
            return None;
        }
        match self.port.receive() {
            Ok(msg) => Some(Ok(msg)),
            Err(Error::PortClosed) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
