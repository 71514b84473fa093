use anyhow::Result;
use keytouch_core::keymap::key_name_to_vk;
use keytouch_core::{Chord, KeyId, MappingTable, Point};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Key(KeyId),
    Done,
    Skip,
}

/// One line typed at the creator prompt.
///
/// A key name such as `space` stays a single key; `a+s` is an explicit
/// chord; any other multi-character word is a chord of its characters.
pub fn parse_entry(line: &str) -> Entry {
    let word = line.trim().to_lowercase();
    if word.is_empty() {
        return Entry::Skip;
    }
    if word == "done" {
        return Entry::Done;
    }
    if word.chars().count() == 1 || key_name_to_vk(&word).is_some() {
        return Entry::Key(KeyId::atom(&word));
    }
    let chord = if word.contains('+') {
        Chord::new(word.split('+').map(str::trim))
    } else {
        Chord::new(word.chars().map(String::from))
    };
    match chord {
        Some(chord) => Entry::Key(KeyId::Chord(chord)),
        None => Entry::Skip,
    }
}

/// Prompt for key identifiers and a click position for each, until `done`
/// or end of input.
pub fn record<R, W, C>(input: &mut R, out: &mut W, mut click: C) -> Result<MappingTable>
where
    R: BufRead,
    W: Write,
    C: FnMut() -> Result<Point>,
{
    let mut table = MappingTable::new();
    loop {
        write!(out, "key (or 'done'): ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let key = match parse_entry(&line) {
            Entry::Done => break,
            Entry::Skip => {
                if !line.trim().is_empty() {
                    writeln!(out, "not a key or chord: {}", line.trim())?;
                }
                continue;
            }
            Entry::Key(key) => key,
        };
        writeln!(out, "click the position for {}", key)?;
        let point = click()?;
        writeln!(out, "{} -> ({}, {})", key, point.x, point.y)?;
        table.insert(key, point);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_entry() {
        assert_eq!(parse_entry("A\n"), Entry::Key(KeyId::atom("a")));
        assert_eq!(parse_entry("space"), Entry::Key(KeyId::atom("space")));
        assert_eq!(parse_entry("F1"), Entry::Key(KeyId::atom("f1")));
        assert_eq!(
            parse_entry("as"),
            Entry::Key(KeyId::Chord(Chord::new(["a", "s"]).unwrap()))
        );
        assert_eq!(
            parse_entry("shift+a"),
            Entry::Key(KeyId::Chord(Chord::new(["shift", "a"]).unwrap()))
        );
        assert_eq!(parse_entry(" done "), Entry::Done);
        assert_eq!(parse_entry(""), Entry::Skip);
        assert_eq!(parse_entry("aa"), Entry::Skip);
    }

    #[test]
    fn test_record_collects_until_done() {
        let mut input = Cursor::new("a\n\nsd\nxx\ndone\nq\n");
        let mut out = Vec::new();
        let mut clicks = vec![Point::new(10, 20), Point::new(30, 40)].into_iter();
        let table = record(&mut input, &mut out, || Ok(clicks.next().unwrap())).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&KeyId::atom("a")), Some(Point::new(10, 20)));
        assert_eq!(
            table.get(&KeyId::Chord(Chord::new(["s", "d"]).unwrap())),
            Some(Point::new(30, 40))
        );
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("not a key or chord: xx"));
    }

    #[test]
    fn test_record_stops_at_end_of_input() {
        let mut input = Cursor::new("a\n");
        let mut out = Vec::new();
        let table = record(&mut input, &mut out, || Ok(Point::new(1, 1))).unwrap();
        assert_eq!(table.len(), 1);
    }
}
