use thiserror::Error;

/// Why the initialization sequence stopped in `ERROR`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InitFault {
    #[error("home signal not seen within {0} ms")]
    HomeTimeout(u64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurntableError {
    #[error("slot index {0} out of range 0..10")]
    SlotOutOfRange(usize),
    #[error("unknown station: {0}")]
    UnknownStation(String),
    #[error("initialization failed: {0}")]
    Init(InitFault),
    #[error("move to qei {target} timed out after {after_ms} ms")]
    MoveTimeout { target: u16, after_ms: u64 },
    #[error("operation rejected: {0}")]
    Rejected(String),
    #[error("simulation runner is not running")]
    RunnerStopped,
    #[error("simulated time limit of {0} ms reached")]
    TimeLimit(u64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("inventory: {0}")]
    Inventory(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
