//! Mapping files: a literal dictionary such as
//! `{'a': (100, 100), ('a', 's'): (150, 150)}`.

use crate::error::MappingError;
use crate::mapping::MappingTable;
use crate::types::{Chord, KeyId, Point};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info, warn};

pub fn load_mapping<P: AsRef<Path>>(path: P) -> Result<MappingTable, MappingError> {
    let path = path.as_ref();
    let raw = std::fs::read(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_mapping_bytes(&raw);
    let table = parse_mapping(text.as_ref())?;
    info!("Loaded {} entries from {}", table.len(), path.display());
    Ok(table)
}

pub fn decode_mapping_bytes(raw: &[u8]) -> Cow<'_, str> {
    if let Some((enc, bom_len)) = encoding_rs::Encoding::for_bom(raw) {
        debug!("Decoded using BOM: {}", enc.name());
        let (cow, _, had_errors) = enc.decode(&raw[bom_len..]);
        if had_errors {
            warn!("Decode had errors (replacement characters used)");
        }
        return cow;
    }

    match std::str::from_utf8(raw) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            debug!("UTF-8 decode failed, falling back to windows-1252");
            let (cow, _, had_errors) = encoding_rs::WINDOWS_1252.decode(raw);
            if had_errors {
                warn!("windows-1252 decode had errors");
            }
            cow
        }
    }
}

pub fn parse_mapping(content: &str) -> Result<MappingTable, MappingError> {
    let mut cursor = Cursor::new(content);
    let mut table = MappingTable::new();

    cursor.skip_ws();
    cursor.expect('{')?;
    loop {
        cursor.skip_ws();
        if cursor.eat('}') {
            break;
        }
        let line = cursor.line;
        let key = cursor.key()?;
        cursor.skip_ws();
        cursor.expect(':')?;
        cursor.skip_ws();
        let point = cursor.point()?;

        let key = match key {
            RawKey::Atom(name) => KeyId::atom(&name),
            RawKey::Tuple(names) => match Chord::new(names.iter().map(String::as_str)) {
                Some(chord) => KeyId::Chord(chord),
                None => {
                    return Err(MappingError::InvalidChord {
                        key: format!("({})", names.join(", ")),
                        line,
                    })
                }
            },
        };
        table.insert(key, point);

        cursor.skip_ws();
        if cursor.eat(',') {
            continue;
        }
        cursor.skip_ws();
        cursor.expect('}')?;
        break;
    }
    cursor.skip_ws();
    if let Some(c) = cursor.peek() {
        return Err(cursor.error(format!("unexpected {:?} after mapping", c)));
    }
    Ok(table)
}

/// Write a table back in the format `parse_mapping` reads.
pub fn render_mapping(table: &MappingTable) -> String {
    let entries: Vec<String> = table
        .iter()
        .map(|(key, point)| {
            let key = match key {
                KeyId::Atom(name) => quote(name),
                KeyId::Chord(chord) => {
                    let members: Vec<String> = chord.members().iter().map(|m| quote(m)).collect();
                    format!("({})", members.join(", "))
                }
            };
            format!("{}: ({}, {})", key, point.x, point.y)
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn quote(name: &str) -> String {
    let delim = if name.contains('\'') && !name.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(name.len() + 2);
    out.push(delim);
    for c in name.chars() {
        if c == '\\' || c == delim {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(delim);
    out
}

enum RawKey {
    Atom(String),
    Tuple(Vec<String>),
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), MappingError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected {:?}, found {:?}", expected, c))),
            None => Err(self.error(format!("expected {:?}, found end of input", expected))),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, message: String) -> MappingError {
        MappingError::Syntax {
            line: self.line,
            column: self.column,
            message,
        }
    }

    fn key(&mut self) -> Result<RawKey, MappingError> {
        if !self.eat('(') {
            return Ok(RawKey::Atom(self.string()?));
        }
        let mut names = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.eat(')') {
                break;
            }
            names.push(self.string()?);
            self.skip_ws();
            trailing_comma = self.eat(',');
            if !trailing_comma {
                self.skip_ws();
                self.expect(')')?;
                break;
            }
        }
        // ('a') is just a parenthesised string
        if names.len() == 1 && !trailing_comma {
            return Ok(RawKey::Atom(names.remove(0)));
        }
        Ok(RawKey::Tuple(names))
    }

    fn string(&mut self) -> Result<String, MappingError> {
        let delim = match self.peek() {
            Some(c @ ('\'' | '"')) => c,
            Some(c) => return Err(self.error(format!("expected a quoted key, found {:?}", c))),
            None => return Err(self.error("expected a quoted key, found end of input".into())),
        };
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string".into())),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(self.error("unterminated string".into())),
                },
                Some(c) if c == delim => break,
                Some(c) => out.push(c),
            }
        }
        if out.trim().is_empty() {
            return Err(self.error("empty key name".into()));
        }
        Ok(out)
    }

    fn point(&mut self) -> Result<Point, MappingError> {
        self.expect('(')?;
        self.skip_ws();
        let x = self.coordinate()?;
        self.skip_ws();
        self.expect(',')?;
        self.skip_ws();
        let y = self.coordinate()?;
        self.skip_ws();
        if self.eat(',') {
            self.skip_ws();
        }
        self.expect(')')?;
        Ok(Point::new(x, y))
    }

    fn coordinate(&mut self) -> Result<i32, MappingError> {
        let line = self.line;
        let mut digits = String::new();
        if self.eat('-') {
            digits.push('-');
        }
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.bump();
        }
        if digits.is_empty() || digits == "-" {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected an integer, found {:?}", c)),
                None => self.error("expected an integer, found end of input".into()),
            });
        }
        digits
            .parse::<i32>()
            .map_err(|_| MappingError::InvalidCoordinate { value: digits, line })
    }
}
