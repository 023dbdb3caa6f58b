//! The turntable engine (`Turntable`).
//!
//! Owns the drive, inventory and event log, and routes every external
//! operation and every tick through one `&mut self`, so callers never observe
//! a half-applied step. Time is supplied from outside (see `scheduler` and
//! `runner`); the engine itself never reads a clock.

use turntable_traits::{Drive, MotorCommand};

use crate::command::{Command, Reply};
use crate::config::{MotionCfg, SafetyCfg, TimingCfg};
use crate::encoder::EncoderModel;
use crate::error::TurntableError;
use crate::geometry::{SlotIndex, Station, arrived, target_qei};
use crate::init::{InitEvent, InitIo, InitMachine};
use crate::inventory::Inventory;
use crate::logger::EventLog;
use crate::positioning::{ActiveMove, MoveEvent, Positioner};
use crate::snapshot::Snapshot;
use crate::status::{InitStep, OpOutcome, OpRejection, ScanPhase};

pub struct Turntable<D: Drive = EncoderModel> {
    pub(crate) drive: D,
    pub(crate) motion: MotionCfg,
    pub(crate) timing: TimingCfg,
    pub(crate) safety: SafetyCfg,

    pub(crate) active: bool,
    pub(crate) now_ms: u64,
    pub(crate) init: InitMachine,
    pub(crate) positioner: Positioner,
    pub(crate) current_slot: SlotIndex,
    pub(crate) inventory: Inventory,
    pub(crate) log: EventLog,
    pub(crate) initialized: bool,
    pub(crate) last_fault: Option<TurntableError>,
}

impl<D: Drive> core::fmt::Debug for Turntable<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Turntable")
            .field("now_ms", &self.now_ms)
            .field("active", &self.active)
            .field("qei", &self.drive.position())
            .field("motor", &self.drive.command())
            .field("init_step", &self.init.step())
            .field("init_fault", &self.init.fault())
            .field("target_qei", &self.positioner.target())
            .finish_non_exhaustive()
    }
}

impl<D: Drive> Turntable<D> {
    pub(crate) fn from_parts(
        drive: D,
        motion: MotionCfg,
        timing: TimingCfg,
        safety: SafetyCfg,
        inventory: Inventory,
    ) -> Self {
        Self {
            drive,
            motion,
            timing,
            safety,
            active: false,
            now_ms: 0,
            init: InitMachine::default(),
            positioner: Positioner::default(),
            current_slot: SlotIndex::default(),
            inventory,
            log: EventLog::new(),
            initialized: false,
            last_fault: None,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Activate the engine and restart initialization from a displaced position.
    pub fn start_initialization(&mut self) {
        self.active = true;
        self.initialized = false;
        self.last_fault = None;
        self.positioner.clear();
        self.drive.set_command(MotorCommand::Stop);
        self.drive.snap_to(self.motion.start_position);
        self.init.begin(self.now_ms, self.timing.settle_ms);
        self.log.info(
            self.now_ms,
            format!(
                "Initialization started from qei {}",
                self.motion.start_position
            ),
        );
        tracing::info!(
            at_ms = self.now_ms,
            settle_ms = self.timing.settle_ms,
            "engine activated"
        );
    }

    /// Halt both ticks and stop the motor. Inventory and log are kept.
    pub fn stop_simulation(&mut self) {
        self.active = false;
        self.drive.set_command(MotorCommand::Stop);
        self.init.cancel();
        self.positioner.clear();
        tracing::info!(at_ms = self.now_ms, qei = self.drive.position(), "engine stopped");
    }

    // ── Positioning ──────────────────────────────────────────────────────────

    /// Start driving `slot` towards `station`; returns the target encoder count.
    ///
    /// Pre-empts a running initialization without its cleanup.
    pub fn move_to_position(&mut self, slot: usize, station: Station) -> Result<u16, TurntableError> {
        let slot = SlotIndex::try_from(slot)?;
        Ok(self.move_slot(slot, station))
    }

    fn move_slot(&mut self, slot: SlotIndex, station: Station) -> u16 {
        self.init.cancel();
        self.current_slot = slot;
        if matches!(self.last_fault, Some(TurntableError::MoveTimeout { .. })) {
            self.last_fault = None;
        }
        self.positioner.begin(
            &mut self.drive,
            &mut self.log,
            &self.motion,
            slot,
            station,
            self.now_ms,
        )
    }

    pub fn set_current_slot_index(&mut self, slot: usize) -> Result<(), TurntableError> {
        self.current_slot = SlotIndex::try_from(slot)?;
        Ok(())
    }

    // ── Inventory operations ─────────────────────────────────────────────────

    pub fn perform_dispense(&mut self, slot: usize) -> Result<OpOutcome, TurntableError> {
        Ok(self.dispense(SlotIndex::try_from(slot)?))
    }

    pub fn perform_refill(&mut self, slot: usize) -> Result<OpOutcome, TurntableError> {
        Ok(self.refill(SlotIndex::try_from(slot)?, None))
    }

    /// Refill and record the card's QR payload.
    pub fn perform_refill_with_qr(
        &mut self,
        slot: usize,
        qr: impl Into<String>,
    ) -> Result<OpOutcome, TurntableError> {
        Ok(self.refill(SlotIndex::try_from(slot)?, Some(qr.into())))
    }

    pub fn perform_reject(&mut self, slot: usize) -> Result<OpOutcome, TurntableError> {
        Ok(self.reject(SlotIndex::try_from(slot)?))
    }

    fn dispense(&mut self, slot: SlotIndex) -> OpOutcome {
        if let Err(r) = self.alignment_gate(slot, &[Station::Dispense1P, Station::Dispense2P]) {
            return self.refuse("Dispense", slot, r);
        }
        let s = self.inventory.slot_mut(slot);
        if !s.has_card {
            self.log.error(
                self.now_ms,
                format!("Dispense failed: slot {slot} is empty"),
            );
            return OpOutcome::Rejected(OpRejection::NoCard);
        }
        s.has_card = false;
        s.qr_data = None;
        self.log.info(self.now_ms, format!("Slot {slot} card dispensed"));
        OpOutcome::Done
    }

    fn refill(&mut self, slot: SlotIndex, qr: Option<String>) -> OpOutcome {
        if let Err(r) = self.alignment_gate(slot, &[Station::Refill]) {
            return self.refuse("Refill", slot, r);
        }
        let s = self.inventory.slot_mut(slot);
        if s.has_card {
            self.log.error(
                self.now_ms,
                format!("Refill failed: slot {slot} already holds a card"),
            );
            return OpOutcome::Rejected(OpRejection::CardPresent);
        }
        s.has_card = true;
        let msg = match &qr {
            Some(q) => format!("Slot {slot} refilled (QR {q})"),
            None => format!("Slot {slot} refilled"),
        };
        s.qr_data = qr;
        self.log.info(self.now_ms, msg);
        OpOutcome::Done
    }

    fn reject(&mut self, slot: SlotIndex) -> OpOutcome {
        if let Err(r) = self.alignment_gate(slot, &[Station::Reject]) {
            return self.refuse("Reject", slot, r);
        }
        let s = self.inventory.slot_mut(slot);
        if !s.has_card {
            self.log.warn(
                self.now_ms,
                format!("Reject skipped: slot {slot} is empty"),
            );
            return OpOutcome::Rejected(OpRejection::NoCard);
        }
        s.has_card = false;
        s.qr_data = None;
        self.log
            .info(self.now_ms, format!("Slot {slot} card sent to reject bin"));
        OpOutcome::Done
    }

    /// With the interlock enabled, `slot` must be parked at one of `allowed`.
    fn alignment_gate(&self, slot: SlotIndex, allowed: &[Station]) -> Result<(), OpRejection> {
        let expected = allowed.first().copied().unwrap_or(Station::Refill);
        if !self.safety.require_station_alignment {
            return Ok(());
        }
        let parked = self.drive.command() == MotorCommand::Stop
            && self.positioner.target().is_none()
            && !self.init.is_running();
        let pos = self.drive.position();
        let aligned = allowed.iter().any(|&st| {
            arrived(
                pos,
                target_qei(slot, st, self.motion.round),
                self.motion.round,
                self.motion.step,
            )
        });
        if parked && aligned {
            Ok(())
        } else {
            Err(OpRejection::NotAligned { expected })
        }
    }

    fn refuse(&mut self, op: &str, slot: SlotIndex, r: OpRejection) -> OpOutcome {
        if let OpRejection::NotAligned { expected } = r {
            self.log.error(
                self.now_ms,
                format!(
                    "{op} refused: slot {slot} is not parked at the {}",
                    expected.describe()
                ),
            );
        }
        OpOutcome::Rejected(r)
    }

    // ── Ticks ────────────────────────────────────────────────────────────────

    /// Integrate one physics period. No-op while inactive.
    pub fn physics_tick(&mut self) {
        if self.active {
            self.drive.tick();
        }
    }

    /// One pass of the initialization machine and the positioning controller.
    pub fn logic_tick(&mut self) {
        if !self.active {
            return;
        }
        let io = InitIo {
            drive: &mut self.drive,
            log: &mut self.log,
            inventory: &self.inventory,
            motion: &self.motion,
            timing: &self.timing,
            now_ms: self.now_ms,
        };
        match self.init.tick(io) {
            Some(InitEvent::Completed) => {
                self.initialized = true;
                tracing::info!(at_ms = self.now_ms, cards = self.inventory.card_count(), "initialized");
            }
            Some(InitEvent::Failed(fault)) => {
                self.last_fault = Some(TurntableError::Init(fault));
            }
            None => {}
        }
        match self.positioner.tick(
            &mut self.drive,
            &mut self.log,
            &self.motion,
            &self.timing,
            self.now_ms,
        ) {
            Some(MoveEvent::Arrived(mv)) => {
                tracing::debug!(slot = mv.slot.get(), qei = mv.target_qei, "arrived");
            }
            Some(MoveEvent::TimedOut { mv, after_ms }) => {
                self.last_fault = Some(TurntableError::MoveTimeout {
                    target: mv.target_qei,
                    after_ms,
                });
            }
            None => {}
        }
    }

    /// Move the engine's notion of "now"; used by the schedulers before ticking.
    pub(crate) fn sync_time(&mut self, now_ms: u64) {
        debug_assert!(now_ms >= self.now_ms);
        self.now_ms = now_ms;
    }

    /// Apply an external operation at the current simulated time.
    pub fn apply(&mut self, cmd: Command) -> Reply {
        tracing::debug!(command = cmd.name(), at_ms = self.now_ms, "apply");
        match cmd {
            Command::StartInitialization => {
                self.start_initialization();
                Reply::Ack
            }
            Command::Stop => {
                self.stop_simulation();
                Reply::Ack
            }
            Command::MoveTo { slot, station } => Reply::MoveStarted {
                target_qei: self.move_slot(slot, station),
            },
            Command::SetCurrentSlot(slot) => {
                self.current_slot = slot;
                Reply::Ack
            }
            Command::Dispense(slot) => Reply::Op(self.dispense(slot)),
            Command::Refill { slot, qr } => Reply::Op(self.refill(slot, qr)),
            Command::Reject(slot) => Reply::Op(self.reject(slot)),
        }
    }

    // ── Observers ────────────────────────────────────────────────────────────

    pub fn position(&self) -> u16 {
        self.drive.position()
    }

    pub fn motor(&self) -> MotorCommand {
        self.drive.command()
    }

    pub fn init_step(&self) -> InitStep {
        self.init.step()
    }

    pub fn scan_phase(&self) -> ScanPhase {
        self.init.scan_phase()
    }

    pub fn scan_count(&self) -> u8 {
        self.init.scan_count()
    }

    pub fn target_qei(&self) -> Option<u16> {
        self.positioner.target()
    }

    pub fn active_move(&self) -> Option<&ActiveMove> {
        self.positioner.active()
    }

    pub fn current_slot(&self) -> SlotIndex {
        self.current_slot
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True once a full initialization has completed since the last start.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Latched init fault or move timeout, cleared by the next start or move.
    pub fn last_fault(&self) -> Option<&TurntableError> {
        self.last_fault.as_ref()
    }

    pub fn motion(&self) -> &MotionCfg {
        &self.motion
    }

    pub fn timing(&self) -> &TimingCfg {
        &self.timing
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}
