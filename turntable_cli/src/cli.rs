//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "turntable", version, about = "Card dispenser turntable simulator")]
pub struct Cli {
    /// Path to config TOML (missing file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = "etc/turntable.toml")]
    pub config: PathBuf,

    /// Starting inventory CSV (slot,has_card,qr_data); overrides random seeding
    #[arg(long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Print one JSON object instead of the human summary; log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Options shared by the commands that move the table after homing.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct SlotArgs {
    /// Slot index (0..=9)
    #[arg(long)]
    pub slot: usize,
    /// Skip homing and the inventory scan; the move starts from the off-home start position
    #[arg(long, action = ArgAction::SetTrue)]
    pub skip_init: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the homing and inventory scan sequence to completion
    Init {
        /// Pace ticks against the wall clock on a worker thread (Ctrl-C aborts)
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
    },
    /// Bring a slot to a station
    Move {
        #[command(flatten)]
        slot: SlotArgs,
        /// Station: refill, 1p, 2p or reject
        #[arg(long)]
        station: String,
    },
    /// Position a slot at a dispense port and drop its card
    Dispense {
        #[command(flatten)]
        slot: SlotArgs,
        /// Use the player 2 port instead of player 1
        #[arg(long, action = ArgAction::SetTrue)]
        p2: bool,
    },
    /// Position a slot at the refill port and load a card
    Refill {
        #[command(flatten)]
        slot: SlotArgs,
        /// QR payload to record with the card
        #[arg(long, value_name = "PAYLOAD")]
        qr: Option<String>,
    },
    /// Position a slot at the reject bin and discard its card
    Reject {
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Validate the config and run a full initialization in simulated time
    SelfCheck,
}
