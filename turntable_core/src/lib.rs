#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::must_use_candidate
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Card dispenser turntable simulation engine (hardware-agnostic).
//!
//! A discrete-time model of the dispenser turntable: the motor and its
//! quadrature encoder, the homing/scan initialization sequence, the
//! positioning controller, the ten-slot inventory and the bounded event log.
//! All motor access goes through `turntable_traits::Drive`.
//!
//! ## Architecture
//!
//! - **Geometry**: slot/station angles and encoder conversions (`geometry`)
//! - **Drive**: simulated encoder integrating the motor command (`encoder`)
//! - **Initialization**: settle, home, measure, scan (`init`)
//! - **Positioning**: forward-only move to a (slot, station) target (`positioning`)
//! - **Engine**: `Turntable`, the single owner of all state (`engine`)
//! - **Time**: simulated-time `Scheduler` and the threaded, clock-paced `Runner`
//!
//! ## Timeline
//!
//! Physics and logic ticks run only while the engine is active. External
//! operations are applied between ticks, never during one.

pub mod builder;
pub mod command;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod encoder;
pub mod error;
pub mod geometry;
mod init;
pub mod inventory;
pub mod logger;
pub mod positioning;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod status;
pub mod util;

pub use builder::TurntableBuilder;
pub use command::{Command, Reply};
pub use config::{MotionCfg, SafetyCfg, TimingCfg};
pub use engine::Turntable;
pub use encoder::EncoderModel;
pub use error::{BuildError, InitFault, Result, TurntableError};
pub use geometry::{SLOT_COUNT, SlotIndex, Station};
pub use inventory::{Inventory, Slot};
pub use logger::{EventLog, LogEntry, Severity};
pub use runner::Runner;
pub use scheduler::Scheduler;
pub use snapshot::Snapshot;
pub use status::{InitStep, OpOutcome, OpRejection, ScanPhase};
pub use turntable_traits::{Drive, MotorCommand};
