//! # keyindex — sorted key → ordinal index files
//!
//! An index file maps each record's natural key to the ordinal of its
//! line in the record file. On disk it is plain text, one entry per
//! line, kept fully sorted by key (lexicographic byte order):
//!
//! ```text
//! key;ordinal\n
//! ```
//!
//! The whole file is rewritten on every mutation; entry counts here
//! are small enough that simplicity wins over incremental updates.
//! In memory the entries live in a sorted `Vec`, so lookups and
//! inserts are binary searches.
//!
//! Natural keys are unique: an insert or rename that would duplicate
//! an existing key is rejected with [`IndexError::Duplicate`], which
//! keeps every lookup unambiguous.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed index line: {0}")]
    Malformed(String),
    #[error("duplicate key `{0}`")]
    Duplicate(String),
    #[error("key `{0}` not found")]
    NotFound(String),
}

/// One `(key, ordinal)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: String,
    pub ordinal: u64,
}

/// An in-memory index: entries sorted by key, unique keys.
///
/// Loaded from an [`IndexFile`], mutated, and saved back. Ordinals are
/// assigned at record-append time and never change afterwards, even
/// when the key itself is renamed.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.key.as_str().cmp(key))
    }

    /// Inserts `(key, ordinal)` at its sorted position.
    pub fn insert(&mut self, key: &str, ordinal: u64) -> Result<(), IndexError> {
        match self.position(key) {
            Ok(_) => Err(IndexError::Duplicate(key.to_string())),
            Err(pos) => {
                self.entries.insert(
                    pos,
                    IndexEntry {
                        key: key.to_string(),
                        ordinal,
                    },
                );
                Ok(())
            }
        }
    }

    /// Returns the ordinal for `key`, if present.
    pub fn lookup(&self, key: &str) -> Option<u64> {
        self.position(key).ok().map(|pos| self.entries[pos].ordinal)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Removes `key`, returning its ordinal if it was present.
    pub fn remove(&mut self, key: &str) -> Option<u64> {
        match self.position(key) {
            Ok(pos) => Some(self.entries.remove(pos).ordinal),
            Err(_) => None,
        }
    }

    /// Rekeys `old` to `new`, keeping the ordinal. Returns the ordinal.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<u64, IndexError> {
        if self.contains(new) {
            return Err(IndexError::Duplicate(new.to_string()));
        }
        let ordinal = self
            .remove(old)
            .ok_or_else(|| IndexError::NotFound(old.to_string()))?;
        self.insert(new, ordinal)?;
        Ok(ordinal)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted key order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

/// A sorted index file on disk.
///
/// Like the record files, the file is opened fresh for every load and
/// save; nothing is cached between calls.
pub struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    /// Opens an index file, creating it empty if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all entries. The file is sorted by construction, so no
    /// re-sort happens here.
    pub fn load(&self) -> Result<Index, IndexError> {
        let mut text = String::new();
        File::open(&self.path)?.read_to_string(&mut text)?;

        let mut entries = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (key, ordinal) = line
                .split_once(';')
                .ok_or_else(|| IndexError::Malformed(line.to_string()))?;
            let ordinal = ordinal
                .parse::<u64>()
                .map_err(|_| IndexError::Malformed(line.to_string()))?;
            entries.push(IndexEntry {
                key: key.to_string(),
                ordinal,
            });
        }
        Ok(Index { entries })
    }

    /// Rewrites the whole file from `index`, one `key;ordinal` line per
    /// entry, in sorted order.
    pub fn save(&self, index: &Index) -> Result<(), IndexError> {
        let file = File::create(&self.path)?;
        let mut w = BufWriter::new(file);
        for entry in index.entries() {
            writeln!(w, "{};{}", entry.key, entry.ordinal)?;
        }
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn keys(index: &Index) -> Vec<&str> {
        index.entries().iter().map(|e| e.key.as_str()).collect()
    }

    // -------------------- In-memory index --------------------

    #[test]
    fn insert_keeps_entries_sorted() -> Result<()> {
        let mut index = Index::new();
        index.insert("m", 0)?;
        index.insert("a", 1)?;
        index.insert("z", 2)?;
        index.insert("b", 3)?;
        assert_eq!(keys(&index), vec!["a", "b", "m", "z"]);
        Ok(())
    }

    #[test]
    fn lookup_hits_and_misses() -> Result<()> {
        let mut index = Index::new();
        index.insert("vin-2", 0)?;
        index.insert("vin-1", 1)?;
        assert_eq!(index.lookup("vin-1"), Some(1));
        assert_eq!(index.lookup("vin-2"), Some(0));
        assert_eq!(index.lookup("vin-3"), None);
        Ok(())
    }

    #[test]
    fn duplicate_insert_is_rejected() -> Result<()> {
        let mut index = Index::new();
        index.insert("k", 0)?;
        let err = index.insert("k", 1).unwrap_err();
        assert!(matches!(err, IndexError::Duplicate(ref k) if k == "k"));
        // The original entry is untouched.
        assert_eq!(index.lookup("k"), Some(0));
        assert_eq!(index.len(), 1);
        Ok(())
    }

    #[test]
    fn remove_returns_ordinal() -> Result<()> {
        let mut index = Index::new();
        index.insert("a", 7)?;
        index.insert("b", 8)?;
        assert_eq!(index.remove("a"), Some(7));
        assert_eq!(index.remove("a"), None);
        assert_eq!(keys(&index), vec!["b"]);
        Ok(())
    }

    #[test]
    fn rename_keeps_ordinal_and_order() -> Result<()> {
        let mut index = Index::new();
        index.insert("b", 0)?;
        index.insert("d", 1)?;
        let ordinal = index.rename("b", "z")?;
        assert_eq!(ordinal, 0);
        assert_eq!(index.lookup("z"), Some(0));
        assert_eq!(index.lookup("b"), None);
        assert_eq!(keys(&index), vec!["d", "z"]);
        Ok(())
    }

    #[test]
    fn rename_missing_key_fails() {
        let mut index = Index::new();
        let err = index.rename("nope", "new").unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[test]
    fn rename_onto_existing_key_fails() -> Result<()> {
        let mut index = Index::new();
        index.insert("a", 0)?;
        index.insert("b", 1)?;
        let err = index.rename("a", "b").unwrap_err();
        assert!(matches!(err, IndexError::Duplicate(_)));
        // Nothing moved.
        assert_eq!(index.lookup("a"), Some(0));
        assert_eq!(index.lookup("b"), Some(1));
        Ok(())
    }

    // -------------------- File roundtrip --------------------

    #[test]
    fn save_load_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let file = IndexFile::open(dir.path().join("idx.txt"))?;

        let mut index = file.load()?;
        assert!(index.is_empty());
        index.insert("vin-b", 0)?;
        index.insert("vin-a", 1)?;
        file.save(&index)?;

        let loaded = file.load()?;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.lookup("vin-a"), Some(1));
        assert_eq!(loaded.lookup("vin-b"), Some(0));
        assert_eq!(keys(&loaded), vec!["vin-a", "vin-b"]);
        Ok(())
    }

    #[test]
    fn file_is_sorted_text() -> Result<()> {
        let dir = tempdir()?;
        let file = IndexFile::open(dir.path().join("idx.txt"))?;

        let mut index = Index::new();
        index.insert("c", 0)?;
        index.insert("a", 1)?;
        index.insert("b", 2)?;
        file.save(&index)?;

        let text = std::fs::read_to_string(file.path())?;
        assert_eq!(text, "a;1\nb;2\nc;0\n");
        Ok(())
    }

    #[test]
    fn save_rewrites_whole_file() -> Result<()> {
        let dir = tempdir()?;
        let file = IndexFile::open(dir.path().join("idx.txt"))?;

        let mut index = Index::new();
        index.insert("gone", 0)?;
        file.save(&index)?;

        let mut index = Index::new();
        index.insert("kept", 0)?;
        file.save(&index)?;

        let text = std::fs::read_to_string(file.path())?;
        assert_eq!(text, "kept;0\n");
        Ok(())
    }

    #[test]
    fn load_rejects_malformed_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");
        std::fs::write(&path, "key-without-ordinal\n")?;
        let file = IndexFile::open(&path)?;
        assert!(matches!(file.load(), Err(IndexError::Malformed(_))));

        std::fs::write(&path, "key;not-a-number\n")?;
        assert!(matches!(file.load(), Err(IndexError::Malformed(_))));
        Ok(())
    }

    #[test]
    fn open_does_not_truncate() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("idx.txt");
        {
            let file = IndexFile::open(&path)?;
            let mut index = Index::new();
            index.insert("persist", 3)?;
            file.save(&index)?;
        }
        let file = IndexFile::open(&path)?;
        assert_eq!(file.load()?.lookup("persist"), Some(3));
        Ok(())
    }
}
