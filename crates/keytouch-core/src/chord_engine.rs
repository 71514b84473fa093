use crate::mapping::MappingTable;
use crate::types::{Chord, KeyId};
use std::collections::HashSet;

/// Decides when a configured chord starts and which active chord a released
/// key belongs to.
///
/// Only chords declared in the mapping are ever candidates; holding an
/// arbitrary set of keys never forms one on its own.
pub struct ChordResolver<'a> {
    mapping: &'a MappingTable,
}

impl<'a> ChordResolver<'a> {
    pub fn new(mapping: &'a MappingTable) -> Self {
        Self { mapping }
    }

    /// The chord completed by pressing `key`, given the keys already held and
    /// not absorbed into another chord.
    ///
    /// When several chords qualify, the first in mapping order wins.
    pub fn on_key_down(&self, key: &str, held: &HashSet<&str>) -> Option<&'a Chord> {
        self.mapping
            .chords()
            .find(|chord| chord.contains(key) && chord.others(key).all(|m| held.contains(m)))
    }

    /// The active chord, if any, that `key` is a member of.
    pub fn on_key_up<'c, I>(&self, key: &str, active: I) -> Option<&'c Chord>
    where
        I: IntoIterator<Item = &'c KeyId>,
    {
        active
            .into_iter()
            .filter_map(KeyId::as_chord)
            .find(|chord| chord.contains(key))
    }
}
