use crate::types::{Chord, KeyId, Point};
use std::collections::{HashMap, HashSet};

/// Key identifier -> screen position, in file order.
///
/// Immutable once a session starts; every engine component only reads it.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<(KeyId, Point)>,
    index: HashMap<KeyId, usize>,
    known_keys: HashSet<String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A key seen again keeps its first position and takes the new point.
    pub fn insert(&mut self, key: KeyId, point: Point) {
        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].1 = point;
            return;
        }
        match &key {
            KeyId::Atom(name) => {
                self.known_keys.insert(name.clone());
            }
            KeyId::Chord(chord) => {
                self.known_keys.extend(chord.members().iter().cloned());
            }
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, point));
    }

    pub fn get(&self, key: &KeyId) -> Option<Point> {
        self.index.get(key).map(|&idx| self.entries[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyId, Point)> {
        self.entries.iter().map(|(k, p)| (k, *p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyId> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Configured chords in file order.
    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        self.entries.iter().filter_map(|(k, _)| k.as_chord())
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.index.contains_key(&KeyId::Atom(name.to_string()))
    }

    /// True if `name` is mapped on its own or appears in any chord.
    pub fn knows_key(&self, name: &str) -> bool {
        self.known_keys.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(KeyId, Point)> for MappingTable {
    fn from_iter<T: IntoIterator<Item = (KeyId, Point)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (key, point) in iter {
            table.insert(key, point);
        }
        table
    }
}

impl PartialEq for MappingTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(keys: &[&str]) -> KeyId {
        KeyId::Chord(Chord::new(keys.iter().copied()).unwrap())
    }

    #[test]
    fn test_duplicate_keeps_first_position_last_value() {
        let table: MappingTable = [
            (KeyId::atom("a"), Point::new(1, 1)),
            (KeyId::atom("s"), Point::new(2, 2)),
            (KeyId::atom("a"), Point::new(3, 3)),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec![KeyId::atom("a"), KeyId::atom("s")]);
        assert_eq!(table.get(&KeyId::atom("a")), Some(Point::new(3, 3)));
    }

    #[test]
    fn test_chord_members_are_known() {
        let table: MappingTable = [
            (KeyId::atom("a"), Point::new(1, 1)),
            (chord(&["a", "x"]), Point::new(5, 5)),
        ]
        .into_iter()
        .collect();

        assert!(table.knows_key("a"));
        assert!(table.knows_key("x"));
        assert!(!table.has_atom("x"));
        assert!(!table.knows_key("q"));
        assert_eq!(table.chords().count(), 1);
    }
}
