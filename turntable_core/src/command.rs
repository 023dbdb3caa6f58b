//! External operations as values, so they can be queued onto the engine's timeline.

use crate::geometry::{SlotIndex, Station};
use crate::status::OpOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartInitialization,
    Stop,
    MoveTo { slot: SlotIndex, station: Station },
    SetCurrentSlot(SlotIndex),
    Dispense(SlotIndex),
    /// Refill, optionally recording the card's QR payload.
    Refill { slot: SlotIndex, qr: Option<String> },
    Reject(SlotIndex),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartInitialization => "start_initialization",
            Command::Stop => "stop",
            Command::MoveTo { .. } => "move_to",
            Command::SetCurrentSlot(_) => "set_current_slot",
            Command::Dispense(_) => "dispense",
            Command::Refill { .. } => "refill",
            Command::Reject(_) => "reject",
        }
    }
}

/// What applying a [`Command`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    MoveStarted { target_qei: u16 },
    Op(OpOutcome),
}
