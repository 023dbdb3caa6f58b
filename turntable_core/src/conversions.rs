//! `From` implementations bridging `turntable_config` types to `turntable_core` types.

use crate::config::{MotionCfg, SafetyCfg, TimingCfg};

// ── MotionCfg ────────────────────────────────────────────────────────────────

impl From<&turntable_config::Motion> for MotionCfg {
    fn from(c: &turntable_config::Motion) -> Self {
        Self {
            round: c.round,
            step: c.step,
            wrap_margin: c.wrap_margin,
            start_position: c.start_position,
        }
    }
}

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&turntable_config::Timing> for TimingCfg {
    fn from(c: &turntable_config::Timing) -> Self {
        Self {
            physics_period_ms: c.physics_period_ms,
            logic_period_ms: c.logic_period_ms,
            settle_ms: c.settle_ms,
            scan_dwell_ms: c.scan_dwell_ms,
            qr_read_ms: c.qr_read_ms,
            home_timeout_ms: c.home_timeout_ms,
            move_timeout_ms: c.move_timeout_ms,
        }
    }
}

// ── SafetyCfg ────────────────────────────────────────────────────────────────

impl From<&turntable_config::Safety> for SafetyCfg {
    fn from(c: &turntable_config::Safety) -> Self {
        Self {
            require_station_alignment: c.require_station_alignment,
        }
    }
}
