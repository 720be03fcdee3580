//! Single-slot handoff from the I2C receive interrupt to the control loop.
//!
//! The receive callback is the only writer: it copies the frame and returns.
//! A frame that arrives before the loop has taken the previous one replaces
//! it. Actuation never happens on the receive side.

use embassy_sync::{
    blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex},
    signal::Signal,
};

use crate::utils::protocol::RawCommand;

/// Frames shorter than this are ignored by the receive callback.
pub const MIN_FRAME_LEN: usize = 2;

/// Mailbox shared with the I2C receive interrupt.
pub static COMMAND_MAILBOX: CommandMailbox<CriticalSectionRawMutex> = CommandMailbox::new();

pub struct CommandMailbox<M: RawMutex> {
    slot: Signal<M, RawCommand>,
}

impl<M: RawMutex> CommandMailbox<M> {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Receive-callback body. Returns `false` when the frame was ignored
    /// (too short, or longer than a [`RawCommand`] holds).
    pub fn on_receive(
        &self,
        bytes: &[u8],
    ) -> bool {
        if bytes.len() < MIN_FRAME_LEN {
            return false;
        }
        match RawCommand::from_slice(bytes) {
            Ok(raw) => {
                self.slot.signal(raw);
                true
            }
            Err(_) => false,
        }
    }

    /// Take the pending frame, if any, clearing the pending flag.
    pub fn take(&self) -> Option<RawCommand> {
        self.slot.try_take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.signaled()
    }
}

impl<M: RawMutex> Default for CommandMailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}
