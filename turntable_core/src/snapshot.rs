//! Point-in-time view of the engine for rendering, logging and JSON output.

use serde::Serialize;
use turntable_traits::Drive;

use crate::engine::Turntable;
use crate::geometry::{SlotIndex, Station};
use crate::inventory::Inventory;
use crate::status::{InitStep, ScanPhase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveView {
    pub target_qei: u16,
    pub slot: SlotIndex,
    pub station: Station,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub at_ms: u64,
    pub active: bool,
    pub qei: u16,
    pub motor: String,
    pub init_step: InitStep,
    pub scan_phase: ScanPhase,
    pub scan_count: u8,
    pub target: Option<MoveView>,
    pub current_slot: SlotIndex,
    pub initialized: bool,
    pub inventory: Inventory,
    /// Rendered event-log lines, newest first.
    pub log: Vec<String>,
}

impl Snapshot {
    pub fn capture<D: Drive>(t: &Turntable<D>) -> Self {
        Self {
            at_ms: t.now_ms(),
            active: t.is_active(),
            qei: t.position(),
            motor: t.motor().to_string(),
            init_step: t.init_step(),
            scan_phase: t.scan_phase(),
            scan_count: t.scan_count(),
            target: t.active_move().map(|m| MoveView {
                target_qei: m.target_qei,
                slot: m.slot,
                station: m.station,
            }),
            current_slot: t.current_slot(),
            initialized: t.is_initialized(),
            inventory: t.inventory().clone(),
            log: t.log().lines(),
        }
    }
}
