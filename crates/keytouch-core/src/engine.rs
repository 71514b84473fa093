use crate::allocator::PointerIds;
use crate::chord_engine::ChordResolver;
use crate::error::InjectError;
use crate::injector::{FrameOutcome, TouchInjector, TouchPlatform};
use crate::keymap::normalize_key_name;
use crate::mapping::MappingTable;
use crate::types::{Chord, Contact, KeyEdge, KeyId, PointerFlags};
use std::collections::HashSet;
use tracing::{debug, trace};

/// The active-contact table and the rules that evolve it.
///
/// Every decision that changes the table is reported to the injector as one
/// frame holding the complete table, ended contacts included, before the
/// ended contacts are dropped. A rejected frame does not roll the table back.
pub struct ContactStateMachine<P> {
    mapping: MappingTable,
    ids: PointerIds,
    contacts: Vec<Contact>,
    /// Mapped keys physically down, whether or not they own a contact.
    held: HashSet<String>,
    injector: TouchInjector<P>,
}

impl<P: TouchPlatform> ContactStateMachine<P> {
    pub fn new(mapping: MappingTable, injector: TouchInjector<P>) -> Self {
        let ids = PointerIds::allocate(&mapping);
        Self {
            mapping,
            ids,
            contacts: Vec::new(),
            held: HashSet::new(),
            injector,
        }
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn pointer_ids(&self) -> &PointerIds {
        &self.ids
    }

    /// Current table, in insertion order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn is_active(&self) -> bool {
        !self.contacts.is_empty()
    }

    pub fn injector(&self) -> &TouchInjector<P> {
        &self.injector
    }

    pub fn apply(&mut self, key: &str, edge: KeyEdge) -> Result<bool, InjectError> {
        match edge {
            KeyEdge::Down => self.key_down(key),
            KeyEdge::Up => self.key_up(key),
        }
    }

    /// Returns whether a frame was decided.
    pub fn key_down(&mut self, key: &str) -> Result<bool, InjectError> {
        let key = normalize_key_name(key);
        if !self.mapping.knows_key(&key) {
            trace!("ignoring unmapped key {}", key);
            return Ok(false);
        }
        if self.held.contains(&key) || self.represented(&key) {
            // platform auto-repeat
            return Ok(false);
        }
        self.held.insert(key.clone());

        for c in self.contacts.iter_mut() {
            c.flags = PointerFlags::CONTINUING;
        }

        let chord = {
            let free = self.free_keys();
            ChordResolver::new(&self.mapping)
                .on_key_down(&key, &free)
                .cloned()
        };

        match chord {
            Some(chord) => {
                self.start_chord(chord)?;
                Ok(true)
            }
            None => {
                let Some(contact) = self.new_contact(KeyId::Atom(key.clone())) else {
                    debug!("{} held as chord member only", key);
                    return Ok(false);
                };
                debug!("{} down -> pointer {}", key, contact.pointer_id);
                self.contacts.push(contact);
                Self::submit(&mut self.injector, &self.contacts)?;
                Ok(true)
            }
        }
    }

    /// Returns whether a frame was decided.
    pub fn key_up(&mut self, key: &str) -> Result<bool, InjectError> {
        let key = normalize_key_name(key);
        let was_held = self.held.remove(&key);

        let chord = ChordResolver::new(&self.mapping)
            .on_key_up(&key, self.contacts.iter().map(|c| &c.key))
            .cloned();
        if let Some(chord) = chord {
            self.dissolve_chord(&key, chord)?;
            return Ok(true);
        }

        let Some(idx) = self
            .contacts
            .iter()
            .position(|c| c.key.as_atom() == Some(key.as_str()))
        else {
            if was_held {
                debug!("{} released without a contact", key);
            }
            return Ok(false);
        };

        let sole = self.contacts.len() == 1;
        for (i, c) in self.contacts.iter_mut().enumerate() {
            c.flags = if i != idx {
                PointerFlags::CONTINUING
            } else if sole {
                PointerFlags::NATURAL_END
            } else {
                PointerFlags::SUPERSEDED_END
            };
        }
        debug!(
            "{} up -> pointer {} ({})",
            key, self.contacts[idx].pointer_id, self.contacts[idx].flags
        );

        let result = Self::submit(&mut self.injector, &self.contacts);
        self.contacts.remove(idx);
        result.map(|_| true)
    }

    /// Keep-alive tick: re-assert every contact. Returns `false` once the
    /// table is empty.
    pub fn refresh(&mut self) -> Result<bool, InjectError> {
        if self.contacts.is_empty() {
            return Ok(false);
        }
        for c in self.contacts.iter_mut() {
            c.flags = PointerFlags::CONTINUING;
        }
        Self::submit(&mut self.injector, &self.contacts)?;
        Ok(true)
    }

    /// Cancel every contact in one last frame and forget all held keys.
    pub fn release_all(&mut self) -> Result<(), InjectError> {
        self.held.clear();
        if self.contacts.is_empty() {
            return Ok(());
        }
        for c in self.contacts.iter_mut() {
            c.flags = PointerFlags::SUPERSEDED_END;
        }
        let result = Self::submit(&mut self.injector, &self.contacts);
        self.contacts.clear();
        result.map(|_| ())
    }

    fn start_chord(&mut self, chord: Chord) -> Result<(), InjectError> {
        for c in self.contacts.iter_mut() {
            if matches!(&c.key, KeyId::Atom(name) if chord.contains(name)) {
                c.flags = PointerFlags::SUPERSEDED_END;
            }
        }

        let id = KeyId::Chord(chord);
        let Some(contact) = self.new_contact(id.clone()) else {
            return Ok(());
        };
        debug!("chord {} formed -> pointer {}", id, contact.pointer_id);

        let mut frame = self.contacts.clone();
        frame.push(contact.clone());
        let result = Self::submit(&mut self.injector, &frame);

        self.contacts
            .retain(|c| !matches!(&c.key, KeyId::Atom(name) if id.involves(name)));
        self.contacts.push(contact);
        result.map(|_| ())
    }

    fn dissolve_chord(&mut self, released: &str, chord: Chord) -> Result<(), InjectError> {
        let resumed: Vec<Contact> = chord
            .others(released)
            .filter(|m| self.held.contains(*m))
            .filter_map(|m| self.new_contact(KeyId::Atom(m.to_string())))
            .collect();

        let id = KeyId::Chord(chord);
        for c in self.contacts.iter_mut() {
            c.flags = if c.key == id {
                PointerFlags::SUPERSEDED_END
            } else {
                PointerFlags::CONTINUING
            };
        }
        debug!("chord {} dissolved, {} key(s) resume", id, resumed.len());

        let mut frame = self.contacts.clone();
        frame.extend(resumed.iter().cloned());
        let result = Self::submit(&mut self.injector, &frame);

        self.contacts.retain(|c| c.key != id);
        self.contacts.extend(resumed);
        result.map(|_| ())
    }

    /// Held keys not absorbed into an active chord.
    fn free_keys(&self) -> HashSet<&str> {
        self.held
            .iter()
            .map(String::as_str)
            .filter(|k| !self.absorbed(k))
            .collect()
    }

    /// `key` owns a contact or is a member of an active chord contact.
    fn represented(&self, key: &str) -> bool {
        self.contacts.iter().any(|c| c.key.involves(key))
    }

    fn absorbed(&self, key: &str) -> bool {
        self.contacts
            .iter()
            .filter_map(|c| c.key.as_chord())
            .any(|chord| chord.contains(key))
    }

    fn new_contact(&self, key: KeyId) -> Option<Contact> {
        let point = self.mapping.get(&key)?;
        let pointer_id = self.ids.get(&key)?;
        Some(Contact {
            key,
            pointer_id,
            point,
            flags: PointerFlags::STARTING,
        })
    }

    fn submit(injector: &mut TouchInjector<P>, frame: &[Contact]) -> Result<FrameOutcome, InjectError> {
        let outcome = injector.inject(frame)?;
        trace!("frame of {} contact(s): {:?}", frame.len(), outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContactRecord, Point};
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Frames = Arc<Mutex<Vec<Vec<ContactRecord>>>>;

    struct Recorder(Frames);

    impl TouchPlatform for Recorder {
        fn begin(&mut self, _max_contacts: u32) -> Result<(), InjectError> {
            Ok(())
        }

        fn submit(&mut self, frame: &[ContactRecord]) -> Result<(), InjectError> {
            self.0.lock().push(frame.to_vec());
            Ok(())
        }
    }

    fn chord(keys: &[&str]) -> KeyId {
        KeyId::Chord(Chord::new(keys.iter().copied()).unwrap())
    }

    fn make_machine(entries: Vec<(KeyId, Point)>) -> (ContactStateMachine<Recorder>, Frames) {
        let frames = Frames::default();
        let mapping: MappingTable = entries.into_iter().collect();
        let injector = TouchInjector::new(Recorder(frames.clone()), mapping.len() as u32, 5);
        (ContactStateMachine::new(mapping, injector), frames)
    }

    fn asd_machine() -> (ContactStateMachine<Recorder>, Frames) {
        make_machine(vec![
            (KeyId::atom("a"), Point::new(100, 100)),
            (KeyId::atom("s"), Point::new(200, 100)),
            (KeyId::atom("d"), Point::new(300, 100)),
            (chord(&["a", "s"]), Point::new(150, 150)),
        ])
    }

    fn keys(m: &ContactStateMachine<Recorder>) -> Vec<KeyId> {
        m.contacts().iter().map(|c| c.key.clone()).collect()
    }

    fn flags(frame: &[ContactRecord]) -> Vec<(u32, PointerFlags)> {
        frame.iter().map(|r| (r.pointer_id, r.flags)).collect()
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        let (mut m, frames) = asd_machine();
        assert!(!m.key_down("z").unwrap());
        assert!(!m.key_up("z").unwrap());
        assert!(frames.lock().is_empty());
    }

    #[test]
    fn test_stray_release_is_ignored() {
        let (mut m, frames) = asd_machine();
        assert!(!m.key_up("a").unwrap());
        assert!(frames.lock().is_empty());
    }

    #[test]
    fn test_existing_contacts_continue_when_another_starts() {
        let (mut m, frames) = asd_machine();
        m.key_down("a").unwrap();
        m.key_down("d").unwrap();
        let frames = frames.lock();
        assert_eq!(
            flags(&frames[1]),
            vec![(0, PointerFlags::CONTINUING), (2, PointerFlags::STARTING)]
        );
    }

    #[test]
    fn test_release_of_one_of_many_is_superseded_end() {
        let (mut m, frames) = asd_machine();
        m.key_down("a").unwrap();
        m.key_down("d").unwrap();
        m.key_up("a").unwrap();
        assert_eq!(keys(&m), vec![KeyId::atom("d")]);
        let frames = frames.lock();
        assert_eq!(
            flags(&frames[2]),
            vec![(0, PointerFlags::SUPERSEDED_END), (2, PointerFlags::CONTINUING)]
        );
    }

    #[test]
    fn test_chord_absorbs_members_and_leaves_others() {
        let (mut m, frames) = asd_machine();
        m.key_down("d").unwrap();
        m.key_down("a").unwrap();
        m.key_down("s").unwrap();
        assert_eq!(keys(&m), vec![KeyId::atom("d"), chord(&["a", "s"])]);
        let frames = frames.lock();
        assert_eq!(
            flags(&frames[2]),
            vec![
                (2, PointerFlags::CONTINUING),
                (0, PointerFlags::SUPERSEDED_END),
                (3, PointerFlags::STARTING),
            ]
        );
    }

    #[test]
    fn test_chord_only_member_is_tracked_without_contact() {
        let (mut m, frames) = make_machine(vec![
            (KeyId::atom("a"), Point::new(100, 100)),
            (chord(&["a", "x"]), Point::new(150, 150)),
        ]);

        assert!(!m.key_down("x").unwrap());
        assert!(frames.lock().is_empty());

        m.key_down("a").unwrap();
        assert_eq!(keys(&m), vec![chord(&["a", "x"])]);

        // releasing "a" leaves "x" held but it has nothing to resume as
        m.key_up("a").unwrap();
        assert!(m.contacts().is_empty());

        m.key_up("x").unwrap();
        assert_eq!(frames.lock().len(), 2);
    }

    #[test]
    fn test_chord_does_not_reform_from_survivors() {
        let (mut m, _frames) = asd_machine();
        m.key_down("a").unwrap();
        m.key_down("s").unwrap();
        m.key_up("s").unwrap();
        assert_eq!(keys(&m), vec![KeyId::atom("a")]);
        m.key_down("s").unwrap();
        assert_eq!(keys(&m), vec![chord(&["a", "s"])]);
    }

    #[test]
    fn test_refresh_marks_everything_continuing() {
        let (mut m, frames) = asd_machine();
        assert!(!m.refresh().unwrap());
        m.key_down("a").unwrap();
        m.key_down("d").unwrap();
        assert!(m.refresh().unwrap());
        let frames = frames.lock();
        assert_eq!(
            flags(frames.last().unwrap()),
            vec![(0, PointerFlags::CONTINUING), (2, PointerFlags::CONTINUING)]
        );
    }

    #[test]
    fn test_release_all_cancels_in_one_frame() {
        let (mut m, frames) = asd_machine();
        m.key_down("a").unwrap();
        m.key_down("d").unwrap();
        m.release_all().unwrap();
        assert!(!m.is_active());
        let frames = frames.lock();
        assert_eq!(
            flags(frames.last().unwrap()),
            vec![
                (0, PointerFlags::SUPERSEDED_END),
                (2, PointerFlags::SUPERSEDED_END)
            ]
        );
        drop(frames);
        // keys held before the drain are forgotten
        assert!(m.key_down("a").unwrap());
    }

    #[test]
    fn test_key_names_are_case_insensitive() {
        let (mut m, _frames) = asd_machine();
        m.key_down("A").unwrap();
        assert_eq!(keys(&m), vec![KeyId::atom("a")]);
        assert!(!m.key_down("a").unwrap());
        m.key_up("A").unwrap();
        assert!(!m.is_active());
    }
}
