//! Matching of derived keys against stored index entries.

use tracing::warn;

use crate::cipher::SymmetricKey;
use crate::index::IndexStructure;
use crate::RecordId;

/// An index entry split into its plaintext token and the token's encryption.
pub(crate) struct ParsedEntry<'a> {
    plaintext: &'a str,
    ciphertext: Vec<u8>,
}

impl ParsedEntry<'_> {
    /// A hit: the ciphertext opens under `key` to exactly the stored token.
    ///
    /// The comparison is not constant time.
    pub(crate) fn opens_with(&self, key: &SymmetricKey) -> bool {
        match key.decrypt(&self.ciphertext) {
            Ok(token) => token == self.plaintext.as_bytes(),
            Err(_) => false,
        }
    }
}

/// Parses a record's index, one list per keyword position. Malformed entries
/// are logged and left out.
pub(crate) fn parse_positions(
    record_id: RecordId,
    index: &IndexStructure,
) -> Vec<Vec<ParsedEntry<'_>>> {
    let mut skipped = Vec::new();
    let positions = index
        .keyword_positions()
        .into_iter()
        .enumerate()
        .map(|(k, entries)| {
            entries
                .iter()
                .enumerate()
                .filter_map(|(v, entry)| match entry.parse() {
                    Some((plaintext, ciphertext)) => Some(ParsedEntry {
                        plaintext,
                        ciphertext,
                    }),
                    None => {
                        skipped.push((k, v));
                        None
                    }
                })
                .collect()
        })
        .collect();

    for (k, v) in skipped {
        let error = crate::Error::MalformedIndexEntry {
            record_id,
            position: format!("{k}:{v}"),
        };
        warn!(%error, "skipping index entry");
    }
    positions
}

/// Conjunctive match: every key opens at least one entry of the record.
pub(crate) fn exact_match(keys: &[SymmetricKey], positions: &[Vec<ParsedEntry<'_>>]) -> bool {
    !keys.is_empty()
        && keys
            .iter()
            .all(|key| positions.iter().flatten().any(|entry| entry.opens_with(key)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeywordMatch {
    Unmatched,
    /// Matched by a key of the given query group.
    MatchedByToken(usize),
}

/// Number of keyword positions of a record matched by the query groups.
///
/// Each group holds the keys derived from the wildcard variants of one query
/// keyword and can match at most one position. The count is a maximum
/// matching between positions and groups, so it does not depend on the order
/// of either.
pub(crate) fn fuzzy_matched_positions(
    key_groups: &[Vec<SymmetricKey>],
    positions: &[Vec<ParsedEntry<'_>>],
) -> usize {
    let opens: Vec<Vec<bool>> = positions
        .iter()
        .map(|entries| {
            key_groups
                .iter()
                .map(|keys| {
                    entries
                        .iter()
                        .any(|entry| keys.iter().any(|key| entry.opens_with(key)))
                })
                .collect()
        })
        .collect();

    assign_groups(&opens, key_groups.len())
        .iter()
        .filter(|m| matches!(m, KeywordMatch::MatchedByToken(_)))
        .count()
}

/// Assigns groups to positions along augmenting paths. `opens[p][g]` tells
/// whether group `g` opens position `p`.
fn assign_groups(opens: &[Vec<bool>], group_count: usize) -> Vec<KeywordMatch> {
    let mut assignment = vec![KeywordMatch::Unmatched; opens.len()];
    let mut owner: Vec<Option<usize>> = vec![None; group_count];
    for position in 0..opens.len() {
        let mut visited = vec![false; group_count];
        augment(position, opens, &mut visited, &mut owner, &mut assignment);
    }
    assignment
}

fn augment(
    position: usize,
    opens: &[Vec<bool>],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
    assignment: &mut [KeywordMatch],
) -> bool {
    for group in 0..owner.len() {
        if visited[group] || !opens[position][group] {
            continue;
        }
        visited[group] = true;
        let free = match owner[group] {
            None => true,
            Some(other) => augment(other, opens, visited, owner, assignment),
        };
        if free {
            owner[group] = Some(position);
            assignment[position] = KeywordMatch::MatchedByToken(group);
            return true;
        }
    }
    false
}
