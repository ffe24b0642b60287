//! Anonymous slot labels

use serde::{Deserialize, Serialize};

/// Most bottles a single tasting can hold, one per slot label
pub const MAX_BOTTLES: usize = 5;

/// Fewest bottles needed before pouring can start
pub const MIN_BOTTLES: usize = 2;

/// Label standing in for a bottle while its identity is hidden
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    A,
    B,
    C,
    D,
    E,
}

impl Slot {
    pub const ALL: [Slot; MAX_BOTTLES] = [Slot::A, Slot::B, Slot::C, Slot::D, Slot::E];

    /// The labels used by a tasting of `count` bottles
    pub fn first(count: usize) -> &'static [Slot] {
        &Self::ALL[..count.min(MAX_BOTTLES)]
    }

    /// Zero-based position in A..E
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Slot> {
        Self::ALL.get(index).copied()
    }

    pub fn as_char(self) -> char {
        (b'A' + self as u8) as char
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl std::str::FromStr for Slot {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Slot::A),
            "B" | "b" => Ok(Slot::B),
            "C" | "c" => Ok(Slot::C),
            "D" | "d" => Ok(Slot::D),
            "E" | "e" => Ok(Slot::E),
            _ => Err("Slot must be one of A, B, C, D, E"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_slots() {
        assert_eq!(Slot::first(2), &[Slot::A, Slot::B]);
        assert_eq!(Slot::first(5), &Slot::ALL);
        assert_eq!(Slot::first(9).len(), MAX_BOTTLES);
    }

    #[test]
    fn test_index_round_trip() {
        for slot in Slot::ALL {
            assert_eq!(Slot::from_index(slot.index()), Some(slot));
        }
        assert_eq!(Slot::from_index(5), None);
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Slot::C.to_string(), "C");
        assert_eq!("e".parse::<Slot>(), Ok(Slot::E));
        assert!("F".parse::<Slot>().is_err());
    }

    #[test]
    fn test_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Slot::B).unwrap(), "\"B\"");
    }
}
