//! Blind tasting session state machine
//!
//! A session moves strictly forward through four steps:
//!
//! 1. `Selection`: add/remove 2-5 bottles
//! 2. `Pourer`: assign every selected bottle to a slot
//! 3. `Taster`: record notes and rank every slot
//! 4. `Reveal`: terminal; the session can only be completed and persisted
//!
//! Every mutation checks the current step, so a session value cannot be
//! edited out of order no matter which caller holds it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    NoteSet, Section, Slot, SlotAssigner, TastingError, TastingNoteStore, TastingResult,
    MAX_BOTTLES, MIN_BOTTLES,
};
use crate::models::Bottle;

/// Rank given to a slot, 1 = best
pub type Rank = u8;

/// Current phase of a tasting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TastingStep {
    Selection,
    Pourer,
    Taster,
    Reveal,
}

impl std::fmt::Display for TastingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TastingStep::Selection => write!(f, "selection"),
            TastingStep::Pourer => write!(f, "pourer"),
            TastingStep::Taster => write!(f, "taster"),
            TastingStep::Reveal => write!(f, "reveal"),
        }
    }
}

/// One user's in-progress blind tasting.
///
/// Deserializing re-checks everything the step implies, so a stored or
/// client-supplied session cannot start past a transition it never made.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawTastingSession")]
pub struct TastingSession {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    step: TastingStep,
    selected_bottles: Vec<Bottle>,
    slot_assignment: SlotAssigner,
    notes: TastingNoteStore,
    ranks: BTreeMap<Slot, Rank>,
}

/// Wire form of [`TastingSession`] before validation
#[derive(Deserialize)]
struct RawTastingSession {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    step: TastingStep,
    selected_bottles: Vec<Bottle>,
    slot_assignment: SlotAssigner,
    notes: TastingNoteStore,
    ranks: BTreeMap<Slot, Rank>,
}

impl TryFrom<RawTastingSession> for TastingSession {
    type Error = TastingError;

    fn try_from(raw: RawTastingSession) -> Result<Self, Self::Error> {
        let session = Self {
            id: raw.id,
            user_id: raw.user_id,
            created_at: raw.created_at,
            completed_at: raw.completed_at,
            step: raw.step,
            selected_bottles: raw.selected_bottles,
            slot_assignment: raw.slot_assignment,
            notes: raw.notes,
            ranks: raw.ranks,
        };
        session.check_consistency()?;
        Ok(session)
    }
}

impl TastingSession {
    /// Start a tasting from a single bottle (typically the one being viewed)
    pub fn new(id: Uuid, user_id: Uuid, first_bottle: Bottle, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            created_at,
            completed_at: None,
            step: TastingStep::Selection,
            selected_bottles: vec![first_bottle],
            slot_assignment: SlotAssigner::new(),
            notes: TastingNoteStore::new(),
            ranks: BTreeMap::new(),
        }
    }

    pub fn start(user_id: Uuid, first_bottle: Bottle) -> Self {
        Self::new(Uuid::new_v4(), user_id, first_bottle, Utc::now())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn step(&self) -> TastingStep {
        self.step
    }

    pub fn selected_bottles(&self) -> &[Bottle] {
        &self.selected_bottles
    }

    pub fn slot_assignment(&self) -> &SlotAssigner {
        &self.slot_assignment
    }

    pub fn notes(&self) -> &TastingNoteStore {
        &self.notes
    }

    pub fn ranks(&self) -> &BTreeMap<Slot, Rank> {
        &self.ranks
    }

    pub fn bottle_count(&self) -> usize {
        self.selected_bottles.len()
    }

    pub fn bottle(&self, bottle_id: Uuid) -> Option<&Bottle> {
        self.selected_bottles.iter().find(|b| b.id == bottle_id)
    }

    /// The bottle poured into `slot`, if any
    pub fn bottle_in(&self, slot: Slot) -> Option<&Bottle> {
        self.slot_assignment
            .bottle_in(slot)
            .and_then(|id| self.bottle(id))
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn add_bottle(&mut self, bottle: Bottle) -> TastingResult<()> {
        self.require_step(TastingStep::Selection, "add a bottle")?;
        if self.bottle(bottle.id).is_some() {
            return Err(TastingError::DuplicateBottle(bottle.id));
        }
        if self.selected_bottles.len() >= MAX_BOTTLES {
            return Err(TastingError::SelectionFull { max: MAX_BOTTLES });
        }
        self.selected_bottles.push(bottle);
        Ok(())
    }

    pub fn remove_bottle(&mut self, bottle_id: Uuid) -> TastingResult<Bottle> {
        self.require_step(TastingStep::Selection, "remove a bottle")?;
        let index = self
            .selected_bottles
            .iter()
            .position(|b| b.id == bottle_id)
            .ok_or(TastingError::InvalidBottleReference(bottle_id))?;
        Ok(self.selected_bottles.remove(index))
    }

    /// Bottles from `owned` that could still be added, in the given order
    pub fn candidates<'a, I>(&self, owned: I) -> Vec<&'a Bottle>
    where
        I: IntoIterator<Item = &'a Bottle>,
    {
        owned
            .into_iter()
            .filter(|b| self.bottle(b.id).is_none())
            .collect()
    }

    pub fn can_start_pouring(&self) -> bool {
        self.step == TastingStep::Selection && self.selected_bottles.len() >= MIN_BOTTLES
    }

    pub fn proceed_to_pourer(&mut self) -> TastingResult<()> {
        self.require_step(TastingStep::Selection, "start pouring")?;
        if self.selected_bottles.len() < MIN_BOTTLES {
            return Err(TastingError::InsufficientSelection {
                selected: self.selected_bottles.len(),
                required: MIN_BOTTLES,
            });
        }
        self.step = TastingStep::Pourer;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pourer
    // ------------------------------------------------------------------

    pub fn assign(&mut self, bottle_id: Uuid, slot: Slot) -> TastingResult<()> {
        self.require_step(TastingStep::Pourer, "assign a slot")?;
        let selection = self.selection_ids();
        self.slot_assignment.assign(&selection, bottle_id, slot)
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TastingResult<()> {
        self.require_step(TastingStep::Pourer, "randomize slots")?;
        let selection = self.selection_ids();
        self.slot_assignment.randomize(&selection, rng);
        Ok(())
    }

    pub fn is_assignment_complete(&self) -> bool {
        self.slot_assignment.is_complete(self.selected_bottles.len())
    }

    pub fn proceed_to_taster(&mut self) -> TastingResult<()> {
        self.require_step(TastingStep::Pourer, "start tasting")?;
        if !self.is_assignment_complete() {
            return Err(TastingError::IncompleteAssignment {
                assigned: self.slot_assignment.len(),
                expected: self.selected_bottles.len(),
            });
        }
        self.notes.clear();
        self.ranks.clear();
        self.step = TastingStep::Taster;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Taster
    // ------------------------------------------------------------------

    pub fn add_tag(&mut self, slot: Slot, section: Section, tag: &str) -> TastingResult<bool> {
        self.require_taster_slot(slot, "add a note")?;
        Ok(self.notes.add_tag(slot, section, tag))
    }

    pub fn remove_tag(&mut self, slot: Slot, section: Section, tag: &str) -> TastingResult<bool> {
        self.require_taster_slot(slot, "remove a note")?;
        Ok(self.notes.remove_tag(slot, section, tag))
    }

    pub fn set_custom_note(&mut self, slot: Slot, section: Section, text: &str) -> TastingResult<()> {
        self.require_taster_slot(slot, "write a note")?;
        self.notes.set_custom(slot, section, text);
        Ok(())
    }

    /// Rebuild the ranking from the rank controls.
    ///
    /// `controls[i]` is the slot picked for rank `i + 1`, or `None` while that
    /// control is empty. A slot picked by more than one control takes the
    /// rank of the last such control, leaving the earlier rank unassigned.
    pub fn update_ranking(&mut self, controls: &[Option<Slot>]) -> TastingResult<()> {
        self.require_step(TastingStep::Taster, "rank slots")?;
        let max = self.selected_bottles.len();
        if controls.len() > max {
            return Err(TastingError::RankOutOfRange {
                rank: controls.len(),
                max,
            });
        }
        for slot in controls.iter().flatten() {
            if self.slot_assignment.bottle_in(*slot).is_none() {
                return Err(TastingError::UnassignedSlot(*slot));
            }
        }

        let mut ranks = BTreeMap::new();
        for (index, slot) in controls.iter().enumerate() {
            if let Some(slot) = slot {
                ranks.insert(*slot, (index + 1) as Rank);
            }
        }
        self.ranks = ranks;
        Ok(())
    }

    /// Ranks form a permutation of 1..=N over the occupied slots
    pub fn is_ranking_complete(&self) -> bool {
        let n = self.selected_bottles.len();
        if self.ranks.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for (slot, rank) in &self.ranks {
            let rank = *rank as usize;
            if self.slot_assignment.bottle_in(*slot).is_none() || rank == 0 || rank > n {
                return false;
            }
            if std::mem::replace(&mut seen[rank - 1], true) {
                return false;
            }
        }
        true
    }

    pub fn proceed_to_reveal(&mut self) -> TastingResult<()> {
        self.require_step(TastingStep::Taster, "reveal")?;
        if !self.is_ranking_complete() {
            return Err(TastingError::IncompleteRanking {
                ranked: self.ranks.len(),
                expected: self.selected_bottles.len(),
            });
        }
        self.step = TastingStep::Reveal;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reveal
    // ------------------------------------------------------------------

    /// Freeze the session for persistence.
    ///
    /// The completion time is set on the first call and reused afterwards, so
    /// a save that failed can be retried with an identical record.
    pub fn complete(&mut self, now: DateTime<Utc>) -> TastingResult<CompletedTasting> {
        self.require_step(TastingStep::Reveal, "save")?;
        let completed_at = *self.completed_at.get_or_insert(now);

        Ok(CompletedTasting {
            id: self.id,
            user_id: self.user_id,
            created_at: self.created_at,
            completed_at,
            bottles: self.selected_bottles.clone(),
            slot_assignment: self.slot_assignment.as_map().clone(),
            notes: self
                .notes
                .iter()
                .map(|(slot, notes)| (slot, notes.clone()))
                .collect(),
            ranks: self.ranks.clone(),
        })
    }

    /// Whether the forward transition out of the current step would succeed
    pub fn can_proceed(&self) -> bool {
        match self.step {
            TastingStep::Selection => self.selected_bottles.len() >= MIN_BOTTLES,
            TastingStep::Pourer => self.is_assignment_complete(),
            TastingStep::Taster => self.is_ranking_complete(),
            TastingStep::Reveal => false,
        }
    }

    /// Client-facing snapshot. Slot contents are hidden during the taster
    /// step so the person tasting cannot see which bottle is which.
    pub fn view(&self) -> TastingView {
        let masked = self.step == TastingStep::Taster;
        TastingView {
            id: self.id,
            step: self.step,
            created_at: self.created_at,
            selected_bottles: self.selected_bottles.clone(),
            slots: Slot::first(self.selected_bottles.len())
                .iter()
                .map(|slot| SlotView {
                    slot: *slot,
                    poured: self.slot_assignment.bottle_in(*slot).is_some(),
                    bottle_id: if masked {
                        None
                    } else {
                        self.slot_assignment.bottle_in(*slot)
                    },
                })
                .collect(),
            notes: self
                .notes
                .iter()
                .map(|(slot, notes)| (slot, notes.clone()))
                .collect(),
            ranks: self.ranks.clone(),
            can_proceed: self.can_proceed(),
        }
    }

    /// Everything the transitions into the current step guarantee
    fn check_consistency(&self) -> TastingResult<()> {
        const RESTORE: &str = "restore a tasting";
        let n = self.selected_bottles.len();
        if n > MAX_BOTTLES {
            return Err(TastingError::SelectionFull { max: MAX_BOTTLES });
        }
        let mut seen = Vec::with_capacity(n);
        for bottle in &self.selected_bottles {
            if seen.contains(&bottle.id) {
                return Err(TastingError::DuplicateBottle(bottle.id));
            }
            seen.push(bottle.id);
        }

        if self.step == TastingStep::Selection {
            if !self.slot_assignment.is_empty() {
                return Err(TastingError::WrongStep {
                    action: RESTORE,
                    current: self.step,
                });
            }
        } else if n < MIN_BOTTLES {
            return Err(TastingError::InsufficientSelection {
                selected: n,
                required: MIN_BOTTLES,
            });
        }

        let mut poured = Vec::with_capacity(n);
        for (slot, bottle_id) in self.slot_assignment.iter() {
            if slot.index() >= n {
                return Err(TastingError::SlotOutOfRange { slot, bottles: n });
            }
            if !seen.contains(&bottle_id) {
                return Err(TastingError::InvalidBottleReference(bottle_id));
            }
            if poured.contains(&bottle_id) {
                return Err(TastingError::DuplicateSlotAssignment {
                    slot,
                    occupant: bottle_id,
                });
            }
            poured.push(bottle_id);
        }

        if self.step < TastingStep::Taster {
            if !self.ranks.is_empty() || self.notes.iter().next().is_some() {
                return Err(TastingError::WrongStep {
                    action: RESTORE,
                    current: self.step,
                });
            }
            return match self.completed_at {
                Some(_) => Err(TastingError::WrongStep {
                    action: RESTORE,
                    current: self.step,
                }),
                None => Ok(()),
            };
        }

        if !self.is_assignment_complete() {
            return Err(TastingError::IncompleteAssignment {
                assigned: self.slot_assignment.len(),
                expected: n,
            });
        }
        for (slot, _) in self.notes.iter() {
            if self.slot_assignment.bottle_in(slot).is_none() {
                return Err(TastingError::UnassignedSlot(slot));
            }
        }
        let mut ranked = vec![false; n];
        for (slot, rank) in &self.ranks {
            if self.slot_assignment.bottle_in(*slot).is_none() {
                return Err(TastingError::UnassignedSlot(*slot));
            }
            let index = usize::from(*rank);
            if index == 0 || index > n || std::mem::replace(&mut ranked[index - 1], true) {
                return Err(TastingError::RankOutOfRange {
                    rank: index,
                    max: n,
                });
            }
        }

        match self.step {
            TastingStep::Reveal if !self.is_ranking_complete() => {
                Err(TastingError::IncompleteRanking {
                    ranked: self.ranks.len(),
                    expected: n,
                })
            }
            TastingStep::Taster if self.completed_at.is_some() => Err(TastingError::WrongStep {
                action: RESTORE,
                current: self.step,
            }),
            _ => Ok(()),
        }
    }

    fn selection_ids(&self) -> Vec<Uuid> {
        self.selected_bottles.iter().map(|b| b.id).collect()
    }

    fn require_step(&self, expected: TastingStep, action: &'static str) -> TastingResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(TastingError::WrongStep {
                action,
                current: self.step,
            })
        }
    }

    fn require_taster_slot(&self, slot: Slot, action: &'static str) -> TastingResult<()> {
        self.require_step(TastingStep::Taster, action)?;
        if self.slot_assignment.bottle_in(slot).is_none() {
            return Err(TastingError::UnassignedSlot(slot));
        }
        Ok(())
    }
}

/// Snapshot of a session as shown to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TastingView {
    pub id: Uuid,
    pub step: TastingStep,
    pub created_at: DateTime<Utc>,
    pub selected_bottles: Vec<Bottle>,
    pub slots: Vec<SlotView>,
    pub notes: BTreeMap<Slot, NoteSet>,
    pub ranks: BTreeMap<Slot, Rank>,
    pub can_proceed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotView {
    pub slot: Slot,
    pub poured: bool,
    /// `None` while empty or while the tasting is blind
    pub bottle_id: Option<Uuid>,
}

/// A finished tasting as stored in the user's history. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedTasting {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub bottles: Vec<Bottle>,
    pub slot_assignment: BTreeMap<Slot, Uuid>,
    pub notes: BTreeMap<Slot, NoteSet>,
    pub ranks: BTreeMap<Slot, Rank>,
}

impl CompletedTasting {
    /// Bottle ranked first, if the record has one
    pub fn favorite(&self) -> Option<&Bottle> {
        let (slot, _) = self.ranks.iter().min_by_key(|(_, rank)| **rank)?;
        let bottle_id = self.slot_assignment.get(slot)?;
        self.bottles.iter().find(|b| b.id == *bottle_id)
    }
}
