//! Runtime configuration for the turntable engine.
//!
//! These are the structs used by `Turntable`. They are separate from the
//! TOML-deserialized config in `turntable_config`; see `conversions`.

/// Encoder geometry and motor integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionCfg {
    /// Encoder counts per revolution.
    pub round: u16,
    /// Counts integrated per physics tick; also the arrival tolerance.
    pub step: u16,
    /// `position > round - wrap_margin` counts as "wrapped back to home".
    pub wrap_margin: u16,
    /// Off-home position assigned when initialization starts.
    pub start_position: u16,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            round: 4096,
            step: 20,
            wrap_margin: 96,
            start_position: 2000,
        }
    }
}

impl MotionCfg {
    /// Home is reported while running forward through `(0, home_band)`.
    #[inline]
    pub fn home_band(&self) -> u16 {
        self.step.saturating_mul(2)
    }

    #[inline]
    pub fn wrap_threshold(&self) -> u16 {
        self.round - self.wrap_margin
    }
}

/// Tick periods, dwells and watchdogs, all in simulated milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingCfg {
    pub physics_period_ms: u64,
    pub logic_period_ms: u64,
    /// WAIT_STABLE dwell before homing.
    pub settle_ms: u64,
    /// Dwell at each slot during the scan pass.
    pub scan_dwell_ms: u64,
    /// QR read time when the scan finds a card.
    pub qr_read_ms: u64,
    /// 0 disables the homing watchdog.
    pub home_timeout_ms: u64,
    /// 0 disables the positioning watchdog.
    pub move_timeout_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            physics_period_ms: 10,
            logic_period_ms: 10,
            settle_ms: 0,
            scan_dwell_ms: 300,
            qr_read_ms: 100,
            home_timeout_ms: 10_000,
            move_timeout_ms: 10_000,
        }
    }
}

/// Interlocks on the terminal slot operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyCfg {
    /// Gate dispense/refill/reject on the slot being parked at the matching station.
    pub require_station_alignment: bool,
}
