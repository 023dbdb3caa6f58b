//! Initialization sequence: settle, find home, measure one revolution, scan
//! every slot, complete.
//!
//! Each reachable `(step, scan phase)` pair is its own variant, and every
//! wait is an armed deadline that the logic tick compares against simulated
//! time. Nothing here owns a timer.

use turntable_traits::{Drive, MotorCommand};

use crate::config::{MotionCfg, TimingCfg};
use crate::error::InitFault;
use crate::geometry::{SLOT_COUNT, Station, arrived, slot_boundary_qei, slot_facing};
use crate::inventory::Inventory;
use crate::logger::EventLog;
use crate::status::{InitStep, ScanPhase};
use crate::util::{deadline_passed, watchdog_expired};

/// Where the current scan move ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanTarget {
    Boundary(u16),
    /// The tenth move ends back at home, detected through the wrap threshold.
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    Paused { until_ms: u64 },
    Waiting { until_ms: u64 },
    Moving { target: ScanTarget },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InitState {
    Idle,
    WaitStable { until_ms: u64 },
    FindHome { since_ms: u64 },
    MeasureRound,
    Scan(ScanState),
    Complete,
    Error(InitFault),
}

/// Everything a logic tick may touch besides the machine itself.
pub(crate) struct InitIo<'a, D: Drive> {
    pub drive: &'a mut D,
    pub log: &'a mut EventLog,
    pub inventory: &'a Inventory,
    pub motion: &'a MotionCfg,
    pub timing: &'a TimingCfg,
    pub now_ms: u64,
}

/// What a tick finished, for the owner to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InitEvent {
    Completed,
    Failed(InitFault),
}

#[derive(Debug, Clone)]
pub(crate) struct InitMachine {
    state: InitState,
    scan_count: u8,
}

impl Default for InitMachine {
    fn default() -> Self {
        Self {
            state: InitState::Idle,
            scan_count: 0,
        }
    }
}

impl InitMachine {
    pub fn step(&self) -> InitStep {
        match self.state {
            InitState::Idle => InitStep::Idle,
            InitState::WaitStable { .. } => InitStep::WaitStable,
            InitState::FindHome { .. } => InitStep::FindHome,
            InitState::MeasureRound => InitStep::MeasureRound,
            InitState::Scan(_) => InitStep::ScanInventory,
            InitState::Complete => InitStep::Complete,
            InitState::Error(_) => InitStep::Error,
        }
    }

    pub fn scan_phase(&self) -> ScanPhase {
        match self.state {
            InitState::Scan(ScanState::Paused { .. }) => ScanPhase::Paused,
            InitState::Scan(ScanState::Waiting { .. }) => ScanPhase::Waiting,
            InitState::Scan(ScanState::Moving { .. }) => ScanPhase::Moving,
            _ => ScanPhase::Idle,
        }
    }

    pub fn scan_count(&self) -> u8 {
        self.scan_count
    }

    pub fn fault(&self) -> Option<InitFault> {
        match self.state {
            InitState::Error(f) => Some(f),
            _ => None,
        }
    }

    /// True while the sequence owns the motor.
    pub fn is_running(&self) -> bool {
        !matches!(self.state, InitState::Idle | InitState::Error(_))
    }

    /// Reset scan state and arm the first step.
    pub fn begin(&mut self, now_ms: u64, settle_ms: u64) {
        self.scan_count = 0;
        self.state = if settle_ms > 0 {
            InitState::WaitStable {
                until_ms: now_ms + settle_ms,
            }
        } else {
            InitState::FindHome { since_ms: now_ms }
        };
        tracing::debug!(step = %self.step(), "initialization armed");
    }

    /// Drop back to `IDLE` without touching the motor or logging.
    pub fn cancel(&mut self) {
        if self.is_running() {
            tracing::debug!(step = %self.step(), "initialization pre-empted");
        }
        self.state = InitState::Idle;
    }

    pub fn tick<D: Drive>(&mut self, io: InitIo<'_, D>) -> Option<InitEvent> {
        let before = self.step();
        let event = match self.state {
            InitState::Idle | InitState::Error(_) => None,
            InitState::WaitStable { until_ms } => {
                if deadline_passed(io.now_ms, until_ms) {
                    io.log.info(io.now_ms, "I/O settled, searching for home");
                    self.state = InitState::FindHome {
                        since_ms: io.now_ms,
                    };
                }
                None
            }
            InitState::FindHome { since_ms } => self.find_home(io, since_ms),
            InitState::MeasureRound => {
                self.measure_round(io);
                None
            }
            InitState::Scan(scan) => {
                self.scan(io, scan);
                None
            }
            InitState::Complete => {
                self.state = InitState::Idle;
                io.log.info(io.now_ms, "Initialization complete, turntable ready");
                Some(InitEvent::Completed)
            }
        };
        let after = self.step();
        if before != after {
            tracing::debug!(from = %before, to = %after, "init step");
        }
        event
    }

    fn find_home<D: Drive>(&mut self, io: InitIo<'_, D>, since_ms: u64) -> Option<InitEvent> {
        if io.drive.command() == MotorCommand::Stop {
            io.drive.set_command(MotorCommand::Forward);
            io.log.info(io.now_ms, "Motor started, searching for home signal");
        }
        let pos = io.drive.position();
        if io.drive.command() == MotorCommand::Forward && pos > 0 && pos < io.motion.home_band() {
            io.drive.set_command(MotorCommand::Stop);
            io.drive.snap_to(0);
            io.log.info(
                io.now_ms,
                format!("Home sensor triggered at qei {pos}, encoder zeroed"),
            );
            self.state = InitState::MeasureRound;
            return None;
        }
        if watchdog_expired(io.now_ms, since_ms, io.timing.home_timeout_ms) {
            let fault = InitFault::HomeTimeout(io.timing.home_timeout_ms);
            io.drive.set_command(MotorCommand::Stop);
            io.log.error(io.now_ms, format!("Homing failed: {fault}"));
            self.state = InitState::Error(fault);
            return Some(InitEvent::Failed(fault));
        }
        None
    }

    fn measure_round<D: Drive>(&mut self, io: InitIo<'_, D>) {
        if io.drive.command() == MotorCommand::Stop {
            io.drive.set_command(MotorCommand::Forward);
            io.log.info(io.now_ms, "Measuring counts for one revolution");
        }
        if io.drive.position() > io.motion.wrap_threshold() {
            io.drive.set_command(MotorCommand::Stop);
            io.drive.snap_to(0);
            io.log.info(
                io.now_ms,
                format!(
                    "One revolution measured ({} counts), starting inventory scan",
                    io.motion.round
                ),
            );
            self.scan_count = 0;
            self.state = InitState::Scan(ScanState::Paused {
                until_ms: io.now_ms + io.timing.scan_dwell_ms,
            });
        }
    }

    fn scan<D: Drive>(&mut self, io: InitIo<'_, D>, scan: ScanState) {
        match scan {
            ScanState::Paused { until_ms } => {
                if !deadline_passed(io.now_ms, until_ms) {
                    return;
                }
                if usize::from(self.scan_count) >= SLOT_COUNT {
                    io.drive.set_command(MotorCommand::Stop);
                    io.log.info(
                        io.now_ms,
                        format!(
                            "Inventory scan finished: {} of {} slots hold a card",
                            io.inventory.card_count(),
                            SLOT_COUNT
                        ),
                    );
                    self.state = InitState::Complete;
                    return;
                }
                let slot = slot_facing(io.drive.position(), Station::Refill, io.motion.round);
                if io.inventory.has_card(slot) {
                    io.log.info(
                        io.now_ms,
                        format!("Scan {}: slot {slot} has a card, reading QR", self.scan_count),
                    );
                    self.state = InitState::Scan(ScanState::Waiting {
                        until_ms: io.now_ms + io.timing.qr_read_ms,
                    });
                } else {
                    // Only a detected card waits for a QR read; empty slots move on after the dwell.
                    io.log
                        .info(io.now_ms, format!("Scan {}: slot {slot} is empty", self.scan_count));
                    self.start_move(io);
                }
            }
            ScanState::Waiting { until_ms } => {
                if !deadline_passed(io.now_ms, until_ms) {
                    return;
                }
                let slot = slot_facing(io.drive.position(), Station::Refill, io.motion.round);
                let msg = match io.inventory.slot(slot).qr_data.as_deref() {
                    Some(qr) => format!("Slot {slot} QR payload: {qr}"),
                    None => format!("Slot {slot} has no QR payload on record"),
                };
                io.log.info(io.now_ms, msg);
                self.start_move(io);
            }
            ScanState::Moving { target } => {
                if io.drive.command() != MotorCommand::Forward {
                    return;
                }
                let pos = io.drive.position();
                let reached = match target {
                    ScanTarget::Boundary(t) => {
                        arrived(pos, t, io.motion.round, io.motion.step).then_some(t)
                    }
                    ScanTarget::Home => (pos > io.motion.wrap_threshold()).then_some(0),
                };
                if let Some(snap) = reached {
                    io.drive.set_command(MotorCommand::Stop);
                    io.drive.snap_to(snap);
                    self.scan_count += 1;
                    tracing::debug!(scan_count = self.scan_count, qei = snap, "scan move done");
                    self.state = InitState::Scan(ScanState::Paused {
                        until_ms: io.now_ms + io.timing.scan_dwell_ms,
                    });
                }
            }
        }
    }

    fn start_move<D: Drive>(&mut self, io: InitIo<'_, D>) {
        let next = usize::from(self.scan_count) + 1;
        let target = match slot_boundary_qei(next, io.motion.round) {
            Some(q) => ScanTarget::Boundary(q),
            None => ScanTarget::Home,
        };
        io.drive.set_command(MotorCommand::Forward);
        self.state = InitState::Scan(ScanState::Moving { target });
    }
}
