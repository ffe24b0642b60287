//! Tasting validation errors
//!
//! All of these are local validation failures: they block the requested
//! mutation or transition and leave the session untouched.

use thiserror::Error;
use uuid::Uuid;

use super::{Slot, TastingStep};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TastingError {
    #[error("At least {required} bottles are needed to start pouring, {selected} selected")]
    InsufficientSelection { selected: usize, required: usize },

    #[error("A tasting holds at most {max} bottles")]
    SelectionFull { max: usize },

    #[error("Bottle {0} is already part of this tasting")]
    DuplicateBottle(Uuid),

    #[error("{assigned} of {expected} bottles have been poured into a slot")]
    IncompleteAssignment { assigned: usize, expected: usize },

    #[error("{ranked} of {expected} slots have a distinct rank")]
    IncompleteRanking { ranked: usize, expected: usize },

    #[error("Bottle {0} is not part of this tasting")]
    InvalidBottleReference(Uuid),

    #[error("Slot {slot} already holds bottle {occupant}")]
    DuplicateSlotAssignment { slot: Slot, occupant: Uuid },

    #[error("Slot {slot} is not used in a tasting of {bottles} bottles")]
    SlotOutOfRange { slot: Slot, bottles: usize },

    #[error("Slot {0} has no bottle poured")]
    UnassignedSlot(Slot),

    #[error("Rank {rank} is outside 1..={max}")]
    RankOutOfRange { rank: usize, max: usize },

    #[error("Cannot {action} during the {current} step")]
    WrongStep {
        action: &'static str,
        current: TastingStep,
    },
}

impl TastingError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TastingError::InsufficientSelection { .. } => "INSUFFICIENT_SELECTION",
            TastingError::SelectionFull { .. } => "SELECTION_FULL",
            TastingError::DuplicateBottle(_) => "DUPLICATE_BOTTLE",
            TastingError::IncompleteAssignment { .. } => "INCOMPLETE_ASSIGNMENT",
            TastingError::IncompleteRanking { .. } => "INCOMPLETE_RANKING",
            TastingError::InvalidBottleReference(_) => "INVALID_BOTTLE_REFERENCE",
            TastingError::DuplicateSlotAssignment { .. } => "DUPLICATE_SLOT_ASSIGNMENT",
            TastingError::SlotOutOfRange { .. } => "SLOT_OUT_OF_RANGE",
            TastingError::UnassignedSlot(_) => "UNASSIGNED_SLOT",
            TastingError::RankOutOfRange { .. } => "RANK_OUT_OF_RANGE",
            TastingError::WrongStep { .. } => "WRONG_STEP",
        }
    }
}

pub type TastingResult<T> = Result<T, TastingError>;
