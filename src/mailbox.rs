//! UI event mailbox
//!
//! The rendering collaborator may report user choices from its own input
//! callbacks. Those choices land in a single-slot mailbox that the frame loop
//! drains once per iteration: the latest pause command wins, and recalibrate
//! and quit requests are sticky flags until drained.

use crate::types::UserCommand;
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything posted since the previous drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inbox {
    pub command: Option<UserCommand>,
    pub recalibrate: bool,
    pub quit: bool,
}

impl Inbox {
    /// Inbox carrying a single pause command
    pub fn with_command(command: UserCommand) -> Self {
        Self {
            command: Some(command),
            ..Self::default()
        }
    }
}

/// Cloneable handle shared between the frame loop and UI callbacks
#[derive(Debug, Clone, Default)]
pub struct UiEvents {
    slot: Arc<Mutex<Inbox>>,
}

impl UiEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a pause-overlay choice, replacing any earlier unread one
    pub fn post(&self, command: UserCommand) {
        self.slot.lock().command = Some(command);
    }

    pub fn request_recalibration(&self) {
        self.slot.lock().recalibrate = true;
    }

    pub fn request_quit(&self) {
        self.slot.lock().quit = true;
    }

    /// Peek at the quit flag without draining
    pub fn is_quit_requested(&self) -> bool {
        self.slot.lock().quit
    }

    /// Drain the mailbox. The quit flag stays set once raised.
    pub fn take(&self) -> Inbox {
        let mut slot = self.slot.lock();
        let inbox = *slot;
        *slot = Inbox {
            quit: inbox.quit,
            ..Inbox::default()
        };
        inbox
    }
}
