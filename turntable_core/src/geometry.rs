//! Turntable geometry: slots, stations, and angle/encoder conversions.
//!
//! Angles are whole degrees of *turntable rotation* measured from home, where
//! slot 0 sits at the refill station. Encoder counts live in `[0, round)` and
//! every helper here wraps modulo `round`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::TurntableError;

pub const SLOT_COUNT: usize = 10;
/// Angular pitch between neighbouring slots.
pub const SLOT_PITCH_DEG: i32 = 360 / SLOT_COUNT as i32;
/// Added before `% 360` so the dividend stays positive.
const ANGLE_BIAS_DEG: i32 = 3600;

/// Validated index of one of the ten slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const fn new(index: usize) -> Option<Self> {
        if index < SLOT_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..SLOT_COUNT as u8).map(SlotIndex)
    }
}

impl TryFrom<usize> for SlotIndex {
    type Error = TurntableError;
    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(TurntableError::SlotOutOfRange(index))
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed positions where a slot can be presented to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Station {
    #[serde(rename = "REFILL")]
    Refill,
    #[serde(rename = "1P_DISPENSE")]
    Dispense1P,
    #[serde(rename = "2P_DISPENSE")]
    Dispense2P,
    #[serde(rename = "REJECT")]
    Reject,
}

impl Station {
    pub const ALL: [Station; 4] = [
        Station::Refill,
        Station::Dispense1P,
        Station::Dispense2P,
        Station::Reject,
    ];

    /// Absolute angle of the station, measured at slot 0's home alignment.
    pub const fn angle_deg(self) -> i32 {
        match self {
            Station::Refill => 0,
            Station::Dispense1P => 90,
            Station::Dispense2P => 270,
            Station::Reject => 180,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Station::Refill => "REFILL",
            Station::Dispense1P => "1P_DISPENSE",
            Station::Dispense2P => "2P_DISPENSE",
            Station::Reject => "REJECT",
        }
    }

    /// Human wording used in event-log lines.
    pub const fn describe(self) -> &'static str {
        match self {
            Station::Refill => "refill port",
            Station::Dispense1P => "player 1 dispense port",
            Station::Dispense2P => "player 2 dispense port",
            Station::Reject => "reject bin",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Station {
    type Err = TurntableError;

    /// Accepts the canonical labels case-insensitively, with `-` for `_`,
    /// plus the short forms `1P` and `2P`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        match norm.as_str() {
            "REFILL" => Ok(Station::Refill),
            "1P_DISPENSE" | "1P" => Ok(Station::Dispense1P),
            "2P_DISPENSE" | "2P" => Ok(Station::Dispense2P),
            "REJECT" => Ok(Station::Reject),
            _ => Err(TurntableError::UnknownStation(s.to_string())),
        }
    }
}

/// Turntable rotation (degrees, `[0, 360)`) that brings `slot` to `station`.
#[inline]
pub fn target_angle_deg(slot: SlotIndex, station: Station) -> i32 {
    (station.angle_deg() - slot.get() as i32 * SLOT_PITCH_DEG + ANGLE_BIAS_DEG) % 360
}

/// Convert a rotation in degrees to the nearest encoder count, wrapped into `[0, round)`.
#[inline]
pub fn angle_to_qei(angle_deg: f64, round: u16) -> u16 {
    let counts = (angle_deg / 360.0 * f64::from(round)).round() as i64;
    counts.rem_euclid(i64::from(round)) as u16
}

/// Encoder count that aligns `slot` with `station`.
pub fn target_qei(slot: SlotIndex, station: Station, round: u16) -> u16 {
    angle_to_qei(f64::from(target_angle_deg(slot, station)), round)
}

/// Encoder count of the `n`-th slot boundary, `round(n * round / 10)`.
///
/// `n == SLOT_COUNT` is a full revolution and is not representable; callers
/// treat it as "back at home".
pub fn slot_boundary_qei(n: usize, round: u16) -> Option<u16> {
    if n >= SLOT_COUNT {
        return None;
    }
    let q = (n as f64 * f64::from(round) / SLOT_COUNT as f64).round() as u16;
    Some(q)
}

/// Slot currently presented at `station` when the encoder reads `qei`.
pub fn slot_facing(qei: u16, station: Station, round: u16) -> SlotIndex {
    let rotation = f64::from(qei) * 360.0 / f64::from(round);
    let rel = (f64::from(station.angle_deg()) - rotation).rem_euclid(360.0);
    let idx = (rel / f64::from(SLOT_PITCH_DEG)).round() as usize % SLOT_COUNT;
    SlotIndex(idx as u8)
}

/// Arrival test: within `tolerance` counts of `target`, either directly or
/// across the zero/`round` seam.
#[inline]
pub fn arrived(position: u16, target: u16, round: u16, tolerance: u16) -> bool {
    let diff = (i32::from(position) - i32::from(target)).abs();
    let tol = i32::from(tolerance);
    diff <= tol || (diff - i32::from(round)).abs() <= tol
}
