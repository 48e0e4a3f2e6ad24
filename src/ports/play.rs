//! Sending a timed sequence of messages to an output in real time.

use crate::{
    message::Message,
    ports::Output,
    prelude::*,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::Instant;
use tracing::debug;

enum PlayCommand {
    Play,
    Pause(Instant),
    Stop,
}

/// Controls a running [`play`](fn.play.html) call from another thread.
///
/// Every clone controls the same playback. Commands are queued, so none is ever lost, but the
/// ones issued while no playback is running are discarded when the next one starts.
#[derive(Debug, Clone)]
pub struct PlayHandle {
    cmd: Sender<PlayCommand>,
    cmd_recv: Receiver<PlayCommand>,
}
impl Default for PlayHandle {
    fn default() -> PlayHandle {
        PlayHandle::new()
    }
}
impl PlayHandle {
    pub fn new() -> PlayHandle {
        let (cmd, cmd_recv) = unbounded();
        PlayHandle { cmd, cmd_recv }
    }

    /// Resume a paused playback.
    pub fn play(&self) {
        self.send(PlayCommand::Play);
    }

    /// Pause playback. Time spent paused does not count towards the schedule.
    pub fn pause(&self) {
        self.send(PlayCommand::Pause(Instant::now()));
    }

    /// Stop playback as soon as possible, even while it waits for the next message.
    pub fn stop(&self) {
        self.send(PlayCommand::Stop);
    }

    fn send(&self, cmd: PlayCommand) {
        // The handle owns a receiver too, so the channel is never disconnected
        let _ = self.cmd.send(cmd);
    }

    /// Throw away commands left over from a previous playback.
    fn discard_stale(&self) {
        let stale = self.cmd_recv.try_iter().count();
        if stale > 0 {
            debug!("Discarding {} stale playback commands", stale);
        }
    }
}

/// How a [`play`](fn.play.html) call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayOutcome {
    /// Every message was sent.
    Finished,
    /// A `PlayHandle` stopped the playback.
    Stopped,
}

struct PlayState<'a> {
    handle: &'a PlayHandle,
    deadline: Instant,
    paused: bool,
}
impl PlayState<'_> {
    /// Returns `true` if playback should stop.
    fn handle_cmd(&mut self, cmd: PlayCommand) -> bool {
        match cmd {
            PlayCommand::Play => self.paused = false,
            PlayCommand::Pause(at) => {
                if !self.paused {
                    self.paused = true;
                    while self.paused {
                        match self.handle.cmd_recv.recv() {
                            Ok(cmd) => {
                                if self.handle_cmd(cmd) {
                                    return true;
                                }
                            }
                            Err(_) => break,
                        }
                    }
                    self.deadline += Instant::now() - at;
                }
            }
            PlayCommand::Stop => return true,
        }
        false
    }

    /// Sleep until the current deadline, handling commands meanwhile.
    /// Returns `true` if playback should stop.
    fn wait(&mut self) -> bool {
        loop {
            while let Ok(cmd) = self.handle.cmd_recv.try_recv() {
                if self.handle_cmd(cmd) {
                    return true;
                }
            }
            let now = Instant::now();
            if now >= self.deadline {
                return false;
            }
            if let Ok(cmd) = self.handle.cmd_recv.recv_timeout(self.deadline - now) {
                if self.handle_cmd(cmd) {
                    return true;
                }
            }
        }
    }
}

/// Send messages to `output`, sleeping `time` seconds before each one.
///
/// The input is usually a [`TimedIter`](../../timing/struct.TimedIter.html) over a merged
/// track. The schedule is kept against absolute deadlines, so that time spent sending does not
/// accumulate as drift. Meta messages are skipped, although their time still counts.
pub fn play<O, I>(messages: I, output: &mut O, handle: &PlayHandle) -> Result<PlayOutcome>
where
    O: Output + ?Sized,
    I: IntoIterator<Item = Message>,
{
    handle.discard_stale();
    let mut state = PlayState {
        handle,
        deadline: Instant::now(),
        paused: false,
    };
    debug!("Starting playback to {}", output.name());
    for msg in messages {
        let delay = Duration::try_from_secs_f64(msg.time().max(0.0)).unwrap_or(Duration::ZERO);
        state.deadline = state.deadline.checked_add(delay).unwrap_or(state.deadline);
        if state.wait() {
            debug!("Playback to {} stopped", output.name());
            return Ok(PlayOutcome::Stopped);
        }
        if msg.is_meta() {
            continue;
        }
        output.send(&msg)?;
    }
    Ok(PlayOutcome::Finished)
}
