//! Blind pour mapping from slots to bottles

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Slot, TastingError, TastingResult};

/// Maps the first N slot labels onto the N selected bottles.
///
/// Once complete the mapping is a bijection: each selected bottle sits in
/// exactly one slot and each used slot holds exactly one bottle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SlotAssigner {
    slots: BTreeMap<Slot, Uuid>,
}

impl SlotAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `bottle_id` in `slot`.
    ///
    /// A bottle already sitting in another slot is moved, vacating its old
    /// slot. Placing a bottle into a slot held by a different bottle fails.
    pub fn assign(&mut self, selection: &[Uuid], bottle_id: Uuid, slot: Slot) -> TastingResult<()> {
        if !selection.contains(&bottle_id) {
            return Err(TastingError::InvalidBottleReference(bottle_id));
        }
        if slot.index() >= selection.len() {
            return Err(TastingError::SlotOutOfRange {
                slot,
                bottles: selection.len(),
            });
        }
        if let Some(&occupant) = self.slots.get(&slot) {
            if occupant == bottle_id {
                return Ok(());
            }
            return Err(TastingError::DuplicateSlotAssignment { slot, occupant });
        }

        self.slots.retain(|_, id| *id != bottle_id);
        self.slots.insert(slot, bottle_id);
        Ok(())
    }

    /// Empty a slot, returning the bottle it held
    pub fn vacate(&mut self, slot: Slot) -> Option<Uuid> {
        self.slots.remove(&slot)
    }

    /// Replace every assignment with a uniformly random permutation of the
    /// selection laid out over slots A..N.
    pub fn randomize<R: Rng + ?Sized>(&mut self, selection: &[Uuid], rng: &mut R) {
        let mut order = selection.to_vec();
        // Fisher-Yates
        order.shuffle(rng);

        self.slots.clear();
        for (slot, bottle_id) in Slot::first(order.len()).iter().zip(order) {
            self.slots.insert(*slot, bottle_id);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn bottle_in(&self, slot: Slot) -> Option<Uuid> {
        self.slots.get(&slot).copied()
    }

    pub fn slot_of(&self, bottle_id: Uuid) -> Option<Slot> {
        self.slots
            .iter()
            .find(|(_, id)| **id == bottle_id)
            .map(|(slot, _)| *slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every one of `expected` bottles has a slot
    pub fn is_complete(&self, expected: usize) -> bool {
        self.slots.len() == expected
    }

    /// Occupied slots in A..E order
    pub fn occupied(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Uuid)> + '_ {
        self.slots.iter().map(|(slot, id)| (*slot, *id))
    }

    pub fn as_map(&self) -> &BTreeMap<Slot, Uuid> {
        &self.slots
    }
}
