//! Encrypted keyword indices.
//!
//! An index entry is the pair `(R, Enc_k(R))` of a random plaintext token and
//! its encryption under the per-keyword key `k`. On the wire and in storage it
//! is the single string `"<R>,<base64(Enc_k(R))>"`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexEntry(String);

impl IndexEntry {
    pub fn new(plaintext: &str, ciphertext: &[u8]) -> Self {
        Self(format!("{},{}", plaintext, STANDARD.encode(ciphertext)))
    }

    /// Wraps a raw entry string as received from storage or the wire.
    /// No validation happens until [`IndexEntry::parse`].
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the entry at its first comma and decodes the ciphertext.
    /// Returns `None` for an entry that is not of the form `R,base64`.
    pub fn parse(&self) -> Option<(&str, Vec<u8>)> {
        let (plaintext, ciphertext) = self.0.split_once(',')?;
        let ciphertext = STANDARD.decode(ciphertext).ok()?;
        Some((plaintext, ciphertext))
    }
}

/// The index stored alongside one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStructure {
    /// One entry per keyword value.
    Exact(Vec<IndexEntry>),
    /// One list of wildcard-variant entries per keyword value.
    Fuzzy(Vec<Vec<IndexEntry>>),
}

impl IndexStructure {
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, IndexStructure::Fuzzy(_))
    }

    /// Every entry with its storage key: `index:<n>` for exact indices,
    /// `index:<keyword>:<variant>` for fuzzy ones.
    pub fn entries(&self) -> Vec<(String, &IndexEntry)> {
        match self {
            IndexStructure::Exact(entries) => entries
                .iter()
                .enumerate()
                .map(|(n, e)| (format!("index:{n}"), e))
                .collect(),
            IndexStructure::Fuzzy(groups) => groups
                .iter()
                .enumerate()
                .flat_map(|(k, group)| {
                    group
                        .iter()
                        .enumerate()
                        .map(move |(v, e)| (format!("index:{k}:{v}"), e))
                })
                .collect(),
        }
    }

    /// Entries grouped by keyword position. An exact index has one entry per
    /// position.
    pub fn keyword_positions(&self) -> Vec<&[IndexEntry]> {
        match self {
            IndexStructure::Exact(entries) => entries.iter().map(std::slice::from_ref).collect(),
            IndexStructure::Fuzzy(groups) => groups.iter().map(Vec::as_slice).collect(),
        }
    }
}
