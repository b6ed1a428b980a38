//! Polyglot opening books.
//!
//! A `.bin` book is a flat array of 16-byte big-endian records
//! (key u64, move u16, weight u16, learn u32) sorted by position key.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error;
use tracing::debug;

const ENTRY_SIZE: usize = 16;

/// Books shipped alongside the analyzer, looked up in the books directory.
pub const BUNDLED_BOOKS: [&str; 15] = [
    "Human",
    "Titans",
    "baron30",
    "varied",
    "Performance",
    "Book",
    "DCbook_large",
    "Elo2400",
    "KomodoVariety",
    "codekiddy",
    "final-book",
    "gavibook-small",
    "gavibook",
    "gm2600",
    "komodo",
];

/// Name of the default book.
pub const DEFAULT_BOOK: &str = "Human";

/// Errors from reading an opening book.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("failed to read book {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("book is {len} bytes, not a whole number of 16-byte entries")]
    Truncated { len: usize },
}

/// One record of a Polyglot book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub key: u64,
    pub raw_move: u16,
    pub weight: u16,
    pub learn: u32,
}

impl BookEntry {
    /// Decodes the move as UCI text. Castling keeps the Polyglot
    /// king-takes-rook form (`e1h1`).
    pub fn uci(&self) -> String {
        let square = |file: u16, rank: u16| {
            let mut s = String::with_capacity(2);
            s.push((b'a' + file as u8) as char);
            s.push((b'1' + rank as u8) as char);
            s
        };
        let m = self.raw_move;
        let to = square(m & 7, (m >> 3) & 7);
        let from = square((m >> 6) & 7, (m >> 9) & 7);

        let mut uci = from + &to;
        match (m >> 12) & 7 {
            1 => uci.push('n'),
            2 => uci.push('b'),
            3 => uci.push('r'),
            4 => uci.push('q'),
            _ => {}
        }
        uci
    }
}

/// An in-memory Polyglot book.
#[derive(Debug, Clone, Default)]
pub struct PolyglotBook {
    entries: Vec<BookEntry>,
}

impl PolyglotBook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| BookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let book = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), entries = book.len(), "opened opening book");
        Ok(book)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BookError> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(BookError::Truncated { len: bytes.len() });
        }

        let mut reader = Cursor::new(bytes);
        let mut entries = Vec::with_capacity(bytes.len() / ENTRY_SIZE);
        for _ in 0..bytes.len() / ENTRY_SIZE {
            entries.push(read_entry(&mut reader).map_err(|_| BookError::Truncated {
                len: bytes.len(),
            })?);
        }
        // Books are meant to be sorted, but don't rely on it.
        entries.sort_by_key(|e| e.key);

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries for a position key.
    pub fn moves(&self, key: u64) -> &[BookEntry] {
        let start = self.entries.partition_point(|e| e.key < key);
        let end = start + self.entries[start..].partition_point(|e| e.key == key);
        &self.entries[start..end]
    }

    /// Whether `uci` (king-takes-rook castling) is a book move for `key`.
    pub fn contains(&self, key: u64, uci: &str) -> bool {
        self.moves(key).iter().any(|e| e.uci() == uci)
    }
}

fn read_entry(reader: &mut Cursor<&[u8]>) -> std::io::Result<BookEntry> {
    Ok(BookEntry {
        key: reader.read_u64::<BigEndian>()?,
        raw_move: reader.read_u16::<BigEndian>()?,
        weight: reader.read_u16::<BigEndian>()?,
        learn: reader.read_u32::<BigEndian>()?,
    })
}

/// Maps a book argument to a file. Bundled names resolve inside
/// `books_dir`, anything else is a path with `~` expanded.
pub fn resolve_book(name_or_path: &str, books_dir: &Path) -> PathBuf {
    if let Some(name) = BUNDLED_BOOKS
        .iter()
        .find(|b| b.eq_ignore_ascii_case(name_or_path))
    {
        return books_dir.join(format!("{}.bin", name));
    }
    expand_home(name_or_path)
}

/// Expands a leading `~` against `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => PathBuf::from(path),
    }
}
