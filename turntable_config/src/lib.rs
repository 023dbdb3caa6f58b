#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and inventory CSV parsing for the turntable simulator.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section is optional; an empty document yields the firmware defaults.
//! - The inventory CSV loader enforces headers and slot bounds so a scripted
//!   starting inventory can replace random seeding.
use std::path::PathBuf;

use serde::Deserialize;

/// Number of card slots on the turntable.
pub const SLOTS: usize = 10;

/// Inventory CSV schema.
///
/// Expected headers:
/// slot,has_card,qr_data
///
/// Example:
/// slot,has_card,qr_data
/// 0,true,CARD-0001
/// 1,false,
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InventoryRow {
    pub slot: usize,
    pub has_card: bool,
    #[serde(default)]
    pub qr_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Motion {
    /// Encoder counts per revolution.
    pub round: u16,
    /// Encoder counts integrated per physics tick while running.
    pub step: u16,
    /// Distance below `round` treated as "wrapped back to home".
    pub wrap_margin: u16,
    /// Deliberately off-home position assigned when initialization starts.
    pub start_position: u16,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            round: 4096,
            step: 20,
            wrap_margin: 96,
            start_position: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub physics_period_ms: u64,
    pub logic_period_ms: u64,
    /// WAIT_STABLE dwell before homing (0 goes straight to FIND_HOME).
    pub settle_ms: u64,
    /// Dwell at each slot during the inventory scan.
    pub scan_dwell_ms: u64,
    /// Time spent reading a QR payload when a card is detected.
    pub qr_read_ms: u64,
    /// Abort homing after this long without a home signal (0 waits forever).
    pub home_timeout_ms: u64,
    /// Abort a positioning move after this long (0 waits forever).
    pub move_timeout_ms: u64,
}

impl Default for Timing {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InventoryCfg {
    /// Seed for the random initial inventory; absent means OS entropy.
    pub seed: Option<u64>,
    /// Probability that a slot starts with a card.
    pub fill_ratio: f64,
    /// Optional CSV replacing random seeding.
    pub csv: Option<PathBuf>,
}

impl Default for InventoryCfg {
    fn default() -> Self {
        Self {
            seed: None,
            fill_ratio: 0.7,
            csv: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Safety {
    /// Refuse dispense/refill/reject unless the slot sits at the matching station.
    pub require_station_alignment: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub motion: Motion,
    pub timing: Timing,
    pub inventory: InventoryCfg,
    pub safety: Safety,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_inventory_csv(path: &std::path::Path) -> eyre::Result<Vec<InventoryRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open inventory CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["slot", "has_card", "qr_data"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "inventory CSV must have headers 'slot,has_card,qr_data', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<InventoryRow>().enumerate() {
        match rec {
            Ok(mut row) => {
                if row.qr_data.as_deref().is_some_and(str::is_empty) {
                    row.qr_data = None;
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    validate_inventory_rows(&rows)?;
    Ok(rows)
}

/// Slot indices must be in range and unique; a payload needs a card to sit on.
pub fn validate_inventory_rows(rows: &[InventoryRow]) -> eyre::Result<()> {
    let mut seen = [false; SLOTS];
    for row in rows {
        if row.slot >= SLOTS {
            eyre::bail!("inventory slot {} out of range 0..{}", row.slot, SLOTS);
        }
        if seen[row.slot] {
            eyre::bail!("inventory slot {} listed more than once", row.slot);
        }
        seen[row.slot] = true;
        if !row.has_card && row.qr_data.is_some() {
            eyre::bail!("inventory slot {} has qr_data but no card", row.slot);
        }
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Motion
        let m = &self.motion;
        if m.step == 0 {
            eyre::bail!("motion.step must be > 0");
        }
        if usize::from(m.round) < SLOTS * usize::from(m.step) {
            eyre::bail!("motion.round must be >= {} * motion.step", SLOTS);
        }
        // The last count before the wrap is `round - step`; it must clear the threshold.
        if m.wrap_margin <= m.step || usize::from(m.wrap_margin) >= usize::from(m.round) / SLOTS {
            eyre::bail!("motion.wrap_margin must be in (step, round / {})", SLOTS);
        }
        if m.start_position >= m.round {
            eyre::bail!("motion.start_position must be < motion.round");
        }

        // Timing
        let t = &self.timing;
        if t.physics_period_ms == 0 {
            eyre::bail!("timing.physics_period_ms must be > 0");
        }
        if t.logic_period_ms == 0 {
            eyre::bail!("timing.logic_period_ms must be > 0");
        }
        if t.logic_period_ms > t.physics_period_ms {
            eyre::bail!(
                "timing.logic_period_ms must be <= timing.physics_period_ms (home band is only 2 steps wide)"
            );
        }
        if t.scan_dwell_ms > 60 * 1000 {
            eyre::bail!("timing.scan_dwell_ms is unreasonably large (>1min)");
        }

        // Inventory
        let inv = &self.inventory;
        if !(0.0..=1.0).contains(&inv.fill_ratio) {
            eyre::bail!("inventory.fill_ratio must be in [0.0, 1.0]");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
