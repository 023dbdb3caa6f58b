//! The ten card slots and what each one holds.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::error::BuildError;
use crate::geometry::{SLOT_COUNT, SlotIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub index: SlotIndex,
    pub has_card: bool,
    /// Opaque payload last associated with the card in this slot.
    pub qr_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    slots: [Slot; SLOT_COUNT],
}

impl Default for Inventory {
    fn default() -> Self {
        Self::empty()
    }
}

impl Inventory {
    pub fn empty() -> Self {
        Self {
            slots: std::array::from_fn(|i| Slot {
                index: SlotIndex::new(i).unwrap_or_default(),
                has_card: false,
                qr_data: None,
            }),
        }
    }

    /// Each slot independently holds a card with probability `fill_ratio`.
    pub fn seeded<R: Rng>(rng: &mut R, fill_ratio: f64) -> Self {
        let p = fill_ratio.clamp(0.0, 1.0);
        let mut inv = Self::empty();
        for slot in &mut inv.slots {
            slot.has_card = rng.random_bool(p);
        }
        inv
    }

    /// Random inventory from a fixed seed, or from OS entropy when `seed` is `None`.
    pub fn random(seed: Option<u64>, fill_ratio: f64) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self::seeded(&mut rng, fill_ratio)
    }

    /// Build from CSV rows; unlisted slots start empty.
    pub fn from_rows(rows: &[turntable_config::InventoryRow]) -> Result<Self, BuildError> {
        turntable_config::validate_inventory_rows(rows)
            .map_err(|e| BuildError::Inventory(e.to_string()))?;
        let mut inv = Self::empty();
        for row in rows {
            let slot = &mut inv.slots[row.slot];
            slot.has_card = row.has_card;
            slot.qr_data = row.qr_data.clone();
        }
        Ok(inv)
    }

    pub fn slot(&self, index: SlotIndex) -> &Slot {
        &self.slots[index.get()]
    }

    pub(crate) fn slot_mut(&mut self, index: SlotIndex) -> &mut Slot {
        &mut self.slots[index.get()]
    }

    pub fn has_card(&self, index: SlotIndex) -> bool {
        self.slots[index.get()].has_card
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn card_count(&self) -> usize {
        self.slots.iter().filter(|s| s.has_card).count()
    }
}
