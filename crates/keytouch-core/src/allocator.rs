use crate::mapping::MappingTable;
use crate::types::KeyId;
use std::collections::HashMap;

/// Stable pointer id per key identifier, fixed for the whole session.
///
/// Ids follow the mapping's enumeration order, so an id always names a
/// logical key or chord and never a particular press.
#[derive(Debug, Clone, Default)]
pub struct PointerIds {
    ids: HashMap<KeyId, u32>,
}

impl PointerIds {
    pub fn allocate(mapping: &MappingTable) -> Self {
        let ids = mapping
            .keys()
            .enumerate()
            .map(|(idx, key)| (key.clone(), idx as u32))
            .collect();
        Self { ids }
    }

    pub fn get(&self, key: &KeyId) -> Option<u32> {
        self.ids.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chord, Point};
    use std::collections::HashSet;

    #[test]
    fn test_ids_follow_enumeration_order() {
        let mapping: MappingTable = [
            (KeyId::atom("a"), Point::new(100, 100)),
            (KeyId::atom("s"), Point::new(200, 100)),
            (
                KeyId::Chord(Chord::new(["a", "s"]).unwrap()),
                Point::new(150, 150),
            ),
        ]
        .into_iter()
        .collect();

        let ids = PointerIds::allocate(&mapping);
        assert_eq!(ids.get(&KeyId::atom("a")), Some(0));
        assert_eq!(ids.get(&KeyId::atom("s")), Some(1));
        assert_eq!(
            ids.get(&KeyId::Chord(Chord::new(["s", "a"]).unwrap())),
            Some(2)
        );
        assert_eq!(ids.get(&KeyId::atom("d")), None);
    }

    #[test]
    fn test_allocation_is_a_bijection() {
        let mapping: MappingTable = ["q", "w", "e", "r", "t"]
            .iter()
            .enumerate()
            .map(|(i, k)| (KeyId::atom(k), Point::new(i as i32, 0)))
            .collect();
        let ids = PointerIds::allocate(&mapping);
        let values: HashSet<u32> = mapping.keys().filter_map(|k| ids.get(k)).collect();
        assert_eq!(values, (0..5).collect());
    }

    #[test]
    fn test_empty_mapping() {
        let ids = PointerIds::allocate(&MappingTable::new());
        assert!(ids.is_empty());
    }
}
