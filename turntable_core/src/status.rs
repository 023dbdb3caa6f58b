//! Observable status values reported to consumers of the engine.

use std::fmt;

use serde::Serialize;

use crate::geometry::Station;

/// Coarse initialization step, as shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitStep {
    Idle,
    WaitStable,
    FindHome,
    MeasureRound,
    ScanInventory,
    Complete,
    Error,
}

impl InitStep {
    pub fn as_str(self) -> &'static str {
        match self {
            InitStep::Idle => "IDLE",
            InitStep::WaitStable => "WAIT_STABLE",
            InitStep::FindHome => "FIND_HOME",
            InitStep::MeasureRound => "MEASURE_ROUND",
            InitStep::ScanInventory => "SCAN_INVENTORY",
            InitStep::Complete => "COMPLETE",
            InitStep::Error => "ERROR",
        }
    }
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-phase of `SCAN_INVENTORY`; `Idle` outside of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanPhase {
    Idle,
    Paused,
    Waiting,
    Moving,
}

/// Why a dispense/refill/reject was refused. The inventory is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OpRejection {
    /// Dispense or reject on an empty slot.
    NoCard,
    /// Refill on a slot that already holds a card.
    CardPresent,
    /// Alignment interlock: the slot is not parked at a matching station.
    NotAligned { expected: Station },
}

impl fmt::Display for OpRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpRejection::NoCard => f.write_str("slot is empty"),
            OpRejection::CardPresent => f.write_str("slot already holds a card"),
            OpRejection::NotAligned { expected } => {
                write!(f, "slot is not parked at the {}", expected.describe())
            }
        }
    }
}

/// Result of a terminal slot operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpOutcome {
    Done,
    Rejected(OpRejection),
}

impl OpOutcome {
    pub fn is_done(self) -> bool {
        matches!(self, OpOutcome::Done)
    }
}
