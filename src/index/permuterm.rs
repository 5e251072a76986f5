use std::collections::BTreeMap;

use fst::{IntoStreamer, Map, MapBuilder, Streamer};

use crate::core::error::Result;
use crate::index::dictionary::TermId;

/// Terminator appended before rotating. Normalized tokens are `[a-z0-9]`
/// only, so `$` never collides with token content.
pub const TERMINATOR: char = '$';

/// Permuterm index: every cyclic rotation of `token$` maps back to its term.
/// Wildcard queries become prefix range scans over the rotation automaton.
pub struct PermutermIndex {
    map: Map<Vec<u8>>,
    rotation_count: usize,
}

impl PermutermIndex {
    /// Build from the dictionary. A token of length L contributes exactly
    /// L + 1 rotations; a rotation uniquely decodes its source token, so the
    /// map carries one term id per rotation.
    pub fn build<'a>(terms: impl Iterator<Item = (TermId, &'a str)>) -> Result<Self> {
        let mut rotations: BTreeMap<String, u64> = BTreeMap::new();
        for (id, term) in terms {
            for rotation in rotations_of(term) {
                rotations.insert(rotation, id.0 as u64);
            }
        }
        let mut builder = MapBuilder::memory();
        let rotation_count = rotations.len();
        for (rotation, id) in rotations {
            builder.insert(rotation.as_bytes(), id)?;
        }
        Ok(PermutermIndex {
            map: builder.into_map(),
            rotation_count,
        })
    }

    /// Rebuild from persisted `(rotation, term id)` pairs in sorted rotation
    /// order, as the index loader reads them back.
    pub fn from_sorted_pairs(pairs: Vec<(String, TermId)>) -> Result<Self> {
        let mut builder = MapBuilder::memory();
        let rotation_count = pairs.len();
        for (rotation, id) in pairs {
            builder.insert(rotation.as_bytes(), id.0 as u64)?;
        }
        Ok(PermutermIndex {
            map: builder.into_map(),
            rotation_count,
        })
    }

    pub fn rotation_count(&self) -> usize {
        self.rotation_count
    }

    /// All (rotation, term id) pairs in sorted rotation order.
    pub fn iter(&self) -> Vec<(String, TermId)> {
        let mut out = Vec::with_capacity(self.rotation_count);
        let mut stream = self.map.stream();
        while let Some((key, value)) = stream.next() {
            if let Ok(rotation) = String::from_utf8(key.to_vec()) {
                out.push((rotation, TermId(value as u32)));
            }
        }
        out
    }

    /// Terms whose rotation set contains a rotation starting with `prefix`.
    pub fn resolve_prefix(&self, prefix: &str) -> Vec<TermId> {
        let mut out = Vec::new();
        let mut stream = self.map.range().ge(prefix.as_bytes()).into_stream();
        while let Some((key, value)) = stream.next() {
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            out.push(TermId(value as u32));
        }
        out.sort();
        out.dedup();
        out
    }
}

/// All cyclic rotations of `term + '$'`.
pub fn rotations_of(term: &str) -> Vec<String> {
    let mut terminated = String::with_capacity(term.len() + 1);
    terminated.push_str(term);
    terminated.push(TERMINATOR);
    let bytes = terminated.as_bytes();
    (0..bytes.len())
        .map(|k| {
            let mut rotation = Vec::with_capacity(bytes.len());
            rotation.extend_from_slice(&bytes[k..]);
            rotation.extend_from_slice(&bytes[..k]);
            String::from_utf8(rotation).expect("rotations of ascii tokens are ascii")
        })
        .collect()
}

/// The permuterm scan prefix of a wildcard token: rotate so the wildcard
/// tail aligns to the end, i.e. `head*tail` scans for `tail$head`. Middle
/// segments of multi-star tokens are left to the compatibility matcher.
pub fn wildcard_prefix(token: &str) -> Option<String> {
    let first = token.find('*')?;
    let last = token.rfind('*')?;
    let head = &token[..first];
    let tail = &token[last + 1..];
    let mut prefix = String::with_capacity(head.len() + tail.len() + 1);
    prefix.push_str(tail);
    prefix.push(TERMINATOR);
    prefix.push_str(head);
    Some(prefix)
}
