//! Positioning controller: drive forward until a (slot, station) target is reached.
//!
//! There is no direction selection. The motor always runs forward and arrival
//! is detected under modulo wraparound.

use turntable_traits::{Drive, MotorCommand};

use crate::config::{MotionCfg, TimingCfg};
use crate::geometry::{SlotIndex, Station, arrived, target_angle_deg, target_qei};
use crate::logger::EventLog;
use crate::util::watchdog_expired;

/// A move in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveMove {
    pub target_qei: u16,
    pub slot: SlotIndex,
    pub station: Station,
    pub started_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MoveEvent {
    Arrived(ActiveMove),
    TimedOut { mv: ActiveMove, after_ms: u64 },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Positioner {
    active: Option<ActiveMove>,
}

impl Positioner {
    pub fn target(&self) -> Option<u16> {
        self.active.map(|m| m.target_qei)
    }

    pub fn active(&self) -> Option<&ActiveMove> {
        self.active.as_ref()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Compute the target for `slot` at `station`, record it and start the motor.
    pub fn begin<D: Drive>(
        &mut self,
        drive: &mut D,
        log: &mut EventLog,
        motion: &MotionCfg,
        slot: SlotIndex,
        station: Station,
        now_ms: u64,
    ) -> u16 {
        let target = target_qei(slot, station, motion.round);
        tracing::debug!(
            slot = slot.get(),
            %station,
            angle_deg = target_angle_deg(slot, station),
            target,
            "move requested"
        );
        self.active = Some(ActiveMove {
            target_qei: target,
            slot,
            station,
            started_ms: now_ms,
        });
        if drive.command() == MotorCommand::Stop {
            drive.set_command(MotorCommand::Forward);
        }
        log.info(
            now_ms,
            format!(
                "Moving slot {slot} to {} (qei {target})",
                station.describe()
            ),
        );
        target
    }

    /// Arrival and watchdog check, once per logic tick.
    pub fn tick<D: Drive>(
        &mut self,
        drive: &mut D,
        log: &mut EventLog,
        motion: &MotionCfg,
        timing: &TimingCfg,
        now_ms: u64,
    ) -> Option<MoveEvent> {
        let mv = self.active?;
        if drive.command() == MotorCommand::Forward
            && arrived(drive.position(), mv.target_qei, motion.round, motion.step)
        {
            drive.set_command(MotorCommand::Stop);
            drive.snap_to(mv.target_qei);
            self.active = None;
            log.info(
                now_ms,
                format!(
                    "Slot {} arrived at {} (qei {})",
                    mv.slot,
                    mv.station.describe(),
                    mv.target_qei
                ),
            );
            return Some(MoveEvent::Arrived(mv));
        }
        if watchdog_expired(now_ms, mv.started_ms, timing.move_timeout_ms) {
            let after_ms = now_ms.saturating_sub(mv.started_ms);
            drive.set_command(MotorCommand::Stop);
            self.active = None;
            log.error(
                now_ms,
                format!(
                    "Move of slot {} to {} timed out after {after_ms} ms at qei {}",
                    mv.slot,
                    mv.station.describe(),
                    drive.position()
                ),
            );
            return Some(MoveEvent::TimedOut { mv, after_ms });
        }
        None
    }
}
