//! Per-slot flavor notes
//!
//! Each slot gets three fixed sections (nose, taste, finish). A section holds
//! a deduplicated list of tags, shown in the order they were added, plus one
//! free-text field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Slot;

/// Built-in flavor vocabulary offered while tasting
pub const FLAVOR_VOCABULARY: [&str; 23] = [
    "Oak", "Vanilla", "Smoke", "Citrus", "Caramel", "Honey", "Spice", "Fruit", "Chocolate",
    "Coffee", "Nutty", "Floral", "Herbal", "Peaty", "Sweet", "Bitter", "Smooth", "Sharp", "Rich",
    "Light", "Bold", "Complex", "Simple",
];

/// Part of the tasting a note belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Nose,
    Taste,
    Finish,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Nose, Section::Taste, Section::Finish];
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Nose => write!(f, "nose"),
            Section::Taste => write!(f, "taste"),
            Section::Finish => write!(f, "finish"),
        }
    }
}

impl std::str::FromStr for Section {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nose" => Ok(Section::Nose),
            "taste" => Ok(Section::Taste),
            "finish" => Ok(Section::Finish),
            _ => Err("Section must be one of nose, taste, finish"),
        }
    }
}

/// Tags and free text for one section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionNotes {
    pub tags: Vec<String>,
    pub custom: String,
}

impl SectionNotes {
    /// Tags compare case-insensitively, so a typed "oak" and the suggested
    /// "Oak" are one note. The first spelling wins.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Notes for one slot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteSet {
    pub nose: SectionNotes,
    pub taste: SectionNotes,
    pub finish: SectionNotes,
}

impl NoteSet {
    pub fn section(&self, section: Section) -> &SectionNotes {
        match section {
            Section::Nose => &self.nose,
            Section::Taste => &self.taste,
            Section::Finish => &self.finish,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut SectionNotes {
        match section {
            Section::Nose => &mut self.nose,
            Section::Taste => &mut self.taste,
            Section::Finish => &mut self.finish,
        }
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| {
            let notes = self.section(*s);
            notes.tags.is_empty() && notes.custom.is_empty()
        })
    }
}

/// Notes for every slot of a tasting
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TastingNoteStore {
    slots: BTreeMap<Slot, NoteSet>,
}

impl TastingNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns false when it was already present or blank.
    pub fn add_tag(&mut self, slot: Slot, section: Section, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        let notes = self.slots.entry(slot).or_default().section_mut(section);
        if notes.contains(tag) {
            return false;
        }
        notes.tags.push(tag.to_string());
        true
    }

    /// Remove a tag, matching it the same way as [`SectionNotes::contains`].
    /// Returns false when it was not present.
    pub fn remove_tag(&mut self, slot: Slot, section: Section, tag: &str) -> bool {
        let tag = tag.trim();
        let Some(note_set) = self.slots.get_mut(&slot) else {
            return false;
        };
        let notes = note_set.section_mut(section);
        match notes.tags.iter().position(|t| t.eq_ignore_ascii_case(tag)) {
            Some(index) => {
                notes.tags.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the free-text field of a section
    pub fn set_custom(&mut self, slot: Slot, section: Section, text: &str) {
        self.slots.entry(slot).or_default().section_mut(section).custom = text.trim().to_string();
    }

    pub fn get(&self, slot: Slot) -> Option<&NoteSet> {
        self.slots.get(&slot)
    }

    /// Tags for a slot and section, in the order they were added
    pub fn tags(&self, slot: Slot, section: Section) -> &[String] {
        self.slots
            .get(&slot)
            .map(|n| n.section(section).tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &NoteSet)> {
        self.slots.iter().map(|(slot, notes)| (*slot, notes))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Vocabulary entries matching `query` (case-insensitive substring).
///
/// The returned iterator is lazy and cheap to clone; every call starts over
/// from the full vocabulary.
pub fn suggest_tags(query: &str) -> TagSuggestions {
    TagSuggestions {
        remaining: FLAVOR_VOCABULARY.iter(),
        needle: query.trim().to_lowercase(),
    }
}

#[derive(Debug, Clone)]
pub struct TagSuggestions {
    remaining: std::slice::Iter<'static, &'static str>,
    needle: String,
}

impl Iterator for TagSuggestions {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = &self.needle;
        self.remaining
            .by_ref()
            .find(|flavor| needle.is_empty() || flavor.to_lowercase().contains(needle.as_str()))
            .copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tag_matching_ignores_case() {
        let mut store = TastingNoteStore::new();
        assert!(store.add_tag(Slot::B, Section::Taste, "Oak"));
        assert!(!store.add_tag(Slot::B, Section::Taste, "oak"));
        assert_eq!(store.tags(Slot::B, Section::Taste), ["Oak"]);
        assert!(store.remove_tag(Slot::B, Section::Taste, "OAK"));
        assert!(store.tags(Slot::B, Section::Taste).is_empty());
    }

    #[test]
    fn test_section_parse() {
        assert_eq!("Nose".parse::<Section>(), Ok(Section::Nose));
        assert_eq!(" finish ".parse::<Section>(), Ok(Section::Finish));
        assert!("palate".parse::<Section>().is_err());
    }

    #[test]
    fn test_add_tag_is_idempotent() {
        let mut store = TastingNoteStore::new();
        assert!(store.add_tag(Slot::A, Section::Nose, "Oak"));
        assert!(!store.add_tag(Slot::A, Section::Nose, "Oak"));
        assert!(!store.add_tag(Slot::A, Section::Nose, "oak"));
        assert_eq!(store.tags(Slot::A, Section::Nose), &["Oak".to_string()]);
    }

    #[test]
    fn test_tags_keep_insertion_order() {
        let mut store = TastingNoteStore::new();
        for tag in ["Vanilla", "Oak", "Smoke"] {
            store.add_tag(Slot::B, Section::Taste, tag);
        }
        assert_eq!(store.tags(Slot::B, Section::Taste), &["Vanilla", "Oak", "Smoke"]);
    }

    #[test]
    fn test_sections_are_independent() {
        let mut store = TastingNoteStore::new();
        store.add_tag(Slot::A, Section::Nose, "Oak");
        assert!(store.tags(Slot::A, Section::Finish).is_empty());
        assert!(store.tags(Slot::B, Section::Nose).is_empty());
    }

    #[test]
    fn test_remove_absent_tag_is_noop() {
        let mut store = TastingNoteStore::new();
        assert!(!store.remove_tag(Slot::C, Section::Finish, "Peaty"));
        assert!(store.get(Slot::C).is_none());

        store.add_tag(Slot::C, Section::Finish, "Honey");
        let before = store.clone();
        assert!(!store.remove_tag(Slot::C, Section::Finish, "Peaty"));
        assert_eq!(store, before);
    }

    #[test]
    fn test_remove_tag() {
        let mut store = TastingNoteStore::new();
        store.add_tag(Slot::A, Section::Nose, "Oak");
        store.add_tag(Slot::A, Section::Nose, "Smoke");
        assert!(store.remove_tag(Slot::A, Section::Nose, "Oak"));
        assert_eq!(store.tags(Slot::A, Section::Nose), &["Smoke"]);
    }

    #[test]
    fn test_blank_tag_ignored() {
        let mut store = TastingNoteStore::new();
        assert!(!store.add_tag(Slot::A, Section::Nose, "   "));
        assert!(store.get(Slot::A).is_none());
    }

    #[test]
    fn test_custom_text() {
        let mut store = TastingNoteStore::new();
        store.set_custom(Slot::D, Section::Finish, "  long and warming ");
        assert_eq!(store.get(Slot::D).unwrap().finish.custom, "long and warming");
        assert!(!store.get(Slot::D).unwrap().is_empty());
    }

    #[test]
    fn test_suggest_empty_query_returns_vocabulary() {
        let all: Vec<_> = suggest_tags("").collect();
        assert_eq!(all, FLAVOR_VOCABULARY.to_vec());
    }

    #[test]
    fn test_suggest_filters_case_insensitive() {
        let hits: Vec<_> = suggest_tags("o").collect();
        assert!(hits.contains(&"Oak"));
        assert!(hits.contains(&"Smoke"));
        assert!(!hits.contains(&"Vanilla"));

        let hits: Vec<_> = suggest_tags("PEAT").collect();
        assert_eq!(hits, vec!["Peaty"]);

        assert_eq!(suggest_tags("xyz").count(), 0);
    }

    #[test]
    fn test_suggestions_are_restartable() {
        let suggestions = suggest_tags("an");
        let first: Vec<_> = suggestions.clone().collect();
        let second: Vec<_> = suggestions.collect();
        assert_eq!(first, second);
        assert_eq!(first, suggest_tags("an").collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_add_twice_yields_one(tag in "[A-Za-z]{1,12}", slot_idx in 0usize..5, section_idx in 0usize..3) {
            let slot = Slot::from_index(slot_idx).unwrap();
            let section = Section::ALL[section_idx];
            let mut store = TastingNoteStore::new();
            store.add_tag(slot, section, &tag);
            store.add_tag(slot, section, &tag);
            let matching = store
                .tags(slot, section)
                .iter()
                .filter(|t| t.eq_ignore_ascii_case(&tag))
                .count();
            prop_assert_eq!(matching, 1);
        }

        #[test]
        fn prop_suggestions_all_match(query in "[a-zA-Z]{0,4}") {
            let needle = query.to_lowercase();
            for flavor in suggest_tags(&query) {
                prop_assert!(flavor.to_lowercase().contains(&needle));
            }
        }
    }
}
