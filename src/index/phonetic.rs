use std::collections::HashMap;

use crate::analysis::soundex::soundex;
use crate::index::dictionary::TermId;

/// Soundex buckets over the dictionary: code → terms sharing it. The buckets
/// partition the dictionary; every term lands in exactly one.
pub struct PhoneticIndex {
    buckets: HashMap<String, Vec<TermId>>,
}

impl PhoneticIndex {
    pub fn build<'a>(terms: impl Iterator<Item = (TermId, &'a str)>) -> Self {
        let mut buckets: HashMap<String, Vec<TermId>> = HashMap::new();
        for (id, term) in terms {
            if let Some(code) = soundex(term) {
                buckets.entry(code).or_default().push(id);
            }
        }
        for ids in buckets.values_mut() {
            ids.sort();
            ids.dedup();
        }
        PhoneticIndex { buckets }
    }

    pub fn from_buckets(buckets: HashMap<String, Vec<TermId>>) -> Self {
        PhoneticIndex { buckets }
    }

    pub fn bucket(&self, code: &str) -> &[TermId] {
        self.buckets.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Terms phonetically equivalent to `token` (its whole Soundex bucket).
    pub fn bucket_for(&self, token: &str) -> &[TermId] {
        match soundex(token) {
            Some(code) => self.bucket(&code),
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<TermId>)> {
        self.buckets.iter()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homophones_share_a_bucket() {
        let terms = ["robert", "rupert", "rubin"];
        let index = PhoneticIndex::build(
            terms
                .iter()
                .enumerate()
                .map(|(i, &t)| (TermId(i as u32), t)),
        );
        let bucket: Vec<&str> = index
            .bucket("r163")
            .iter()
            .map(|id| terms[id.index()])
            .collect();
        assert_eq!(bucket, ["robert", "rupert"]);
        assert_eq!(index.bucket_for("robbert"), index.bucket("r163"));
        assert_eq!(index.bucket("r150").len(), 1);
    }

    #[test]
    fn buckets_partition_the_dictionary() {
        let terms = ["space", "jam", "sandlot", "movie", "spice"];
        let index = PhoneticIndex::build(
            terms
                .iter()
                .enumerate()
                .map(|(i, &t)| (TermId(i as u32), t)),
        );
        let mut all: Vec<TermId> = index.iter().flat_map(|(_, ids)| ids.clone()).collect();
        all.sort();
        assert_eq!(all.len(), terms.len());
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}
