//! Builder for `Turntable`.
//!
//! All configuration is optional and defaults to the stock dispenser. Every
//! value is validated in `build()`, so a hand-assembled engine gets the same
//! checks as one loaded from TOML.

use turntable_traits::Drive;

use crate::config::{MotionCfg, SafetyCfg, TimingCfg};
use crate::engine::Turntable;
use crate::encoder::EncoderModel;
use crate::error::{BuildError, Result};
use crate::geometry::SLOT_COUNT;
use crate::inventory::Inventory;

/// Where the initial inventory comes from.
#[derive(Debug, Clone)]
enum InventorySource {
    Random { seed: Option<u64>, fill_ratio: f64 },
    Fixed(Inventory),
}

#[derive(Debug)]
pub struct TurntableBuilder<D: Drive = EncoderModel> {
    motion: Option<MotionCfg>,
    timing: Option<TimingCfg>,
    safety: Option<SafetyCfg>,
    inventory: InventorySource,
    drive: Option<D>,
}

impl Default for TurntableBuilder<EncoderModel> {
    fn default() -> Self {
        Self {
            motion: None,
            timing: None,
            safety: None,
            inventory: InventorySource::Random {
                seed: None,
                fill_ratio: 0.7,
            },
            drive: None,
        }
    }
}

impl TurntableBuilder<EncoderModel> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded config file: motion, timing, safety and inventory seeding.
    pub fn from_config(cfg: &turntable_config::Config) -> Self {
        Self::new()
            .with_motion((&cfg.motion).into())
            .with_timing((&cfg.timing).into())
            .with_safety((&cfg.safety).into())
            .with_fill_ratio(cfg.inventory.fill_ratio)
            .with_seed_opt(cfg.inventory.seed)
    }
}

impl<D: Drive> TurntableBuilder<D> {
    pub fn with_motion(mut self, motion: MotionCfg) -> Self {
        self.motion = Some(motion);
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.safety = Some(safety);
        self
    }
    /// Use a fixed inventory instead of random seeding.
    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = InventorySource::Fixed(inventory);
        self
    }
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_seed_opt(Some(seed))
    }
    fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        if let InventorySource::Random { seed: s, .. } = &mut self.inventory {
            *s = seed;
        }
        self
    }
    pub fn with_fill_ratio(mut self, fill_ratio: f64) -> Self {
        if let InventorySource::Random { fill_ratio: f, .. } = &mut self.inventory {
            *f = fill_ratio;
        }
        self
    }

    /// Replace the simulated encoder with another drive.
    pub fn with_drive<E: Drive>(self, drive: E) -> TurntableBuilder<E> {
        TurntableBuilder {
            motion: self.motion,
            timing: self.timing,
            safety: self.safety,
            inventory: self.inventory,
            drive: Some(drive),
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate(motion: &MotionCfg, timing: &TimingCfg, inventory: &InventorySource) -> Result<()> {
    // ── Validation ───────────────────────────────────────────────────────────
    if motion.step == 0 {
        return Err(invalid("step must be > 0"));
    }
    if u32::from(motion.round) < SLOT_COUNT as u32 * u32::from(motion.step) {
        return Err(invalid("round must be at least slots * step"));
    }
    if motion.wrap_margin <= motion.step
        || usize::from(motion.wrap_margin) >= usize::from(motion.round) / SLOT_COUNT
    {
        return Err(invalid("wrap_margin must be in (step, round / slots)"));
    }
    if motion.start_position >= motion.round {
        return Err(invalid("start_position must be < round"));
    }
    if timing.physics_period_ms == 0 || timing.logic_period_ms == 0 {
        return Err(invalid("tick periods must be > 0"));
    }
    if timing.logic_period_ms > timing.physics_period_ms {
        return Err(invalid("logic period must not exceed physics period"));
    }
    match inventory {
        InventorySource::Random { fill_ratio, .. } if !(0.0..=1.0).contains(fill_ratio) => {
            Err(invalid("fill_ratio must be in [0, 1]"))
        }
        _ => Ok(()),
    }
}

impl TurntableBuilder<EncoderModel> {
    /// Validate and build with the simulated encoder.
    pub fn build(self) -> Result<Turntable<EncoderModel>> {
        let motion = self.motion.clone().unwrap_or_default();
        let timing = self.timing.clone().unwrap_or_default();
        // The encoder needs sane geometry, so check before constructing it.
        validate(&motion, &timing, &self.inventory)?;
        let drive = EncoderModel::new(motion.round, motion.step);
        self.with_drive(drive).try_build()
    }
}

impl<D: Drive> TurntableBuilder<D> {
    /// Validate and build with the drive given to `with_drive`.
    pub fn try_build(self) -> Result<Turntable<D>> {
        let drive = self
            .drive
            .ok_or_else(|| invalid("no drive configured"))?;
        let motion = self.motion.unwrap_or_default();
        let timing = self.timing.unwrap_or_default();
        validate(&motion, &timing, &self.inventory)?;

        let inventory = match self.inventory {
            InventorySource::Fixed(inv) => inv,
            InventorySource::Random { seed, fill_ratio } => Inventory::random(seed, fill_ratio),
        };
        tracing::debug!(
            round = motion.round,
            step = motion.step,
            cards = inventory.card_count(),
            "turntable built"
        );
        Ok(Turntable::from_parts(
            drive,
            motion,
            timing,
            self.safety.unwrap_or_default(),
            inventory,
        ))
    }
}
