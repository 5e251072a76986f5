use std::cmp::Ordering;

use crate::core::types::DocId;
use crate::index::skiplist::SkipList;

/// One posting: the occurrences of a term inside one document.
///
/// Positions live in the document's unified position space and are strictly
/// increasing; term frequency is their count. Ordering and equality are by
/// document id only, which is what the posting-list merges compare.
#[derive(Debug, Clone)]
pub struct Posting {
    pub doc_id: DocId,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        Posting { doc_id, positions }
    }

    pub fn term_freq(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Destructive merge of two partial postings for the same document:
    /// union of the position sequences.
    pub fn merge(&mut self, other: Posting) {
        debug_assert_eq!(self.doc_id, other.doc_id);
        let mut merged = Vec::with_capacity(self.positions.len() + other.positions.len());
        let (mut i, mut j) = (0, 0);
        while i < self.positions.len() && j < other.positions.len() {
            match self.positions[i].cmp(&other.positions[j]) {
                Ordering::Equal => {
                    merged.push(self.positions[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    merged.push(self.positions[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(other.positions[j]);
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.positions[i..]);
        merged.extend_from_slice(&other.positions[j..]);
        self.positions = merged;
    }
}

impl PartialEq for Posting {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id
    }
}

impl Eq for Posting {}

impl PartialOrd for Posting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Posting {
    fn cmp(&self, other: &Self) -> Ordering {
        self.doc_id.cmp(&other.doc_id)
    }
}

/// Posting list for a term: a skip list of postings ordered by document id.
/// Sorted ascending, no duplicate ids; frozen once the index is published.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingList {
    list: SkipList<Posting>,
}

impl PostingList {
    pub fn empty() -> Self {
        PostingList {
            list: SkipList::new(),
        }
    }

    /// Build from arbitrary partial postings: sorts by document id and
    /// destructively merges postings that collide on the same document.
    pub fn from_postings(mut postings: Vec<Posting>) -> Self {
        postings.sort_by_key(|p| p.doc_id);
        let mut merged: Vec<Posting> = Vec::with_capacity(postings.len());
        for posting in postings {
            match merged.last_mut() {
                Some(last) if last.doc_id == posting.doc_id => last.merge(posting),
                _ => merged.push(posting),
            }
        }
        PostingList {
            list: SkipList::from_sorted(merged),
        }
    }

    /// Document frequency.
    pub fn df(&self) -> u32 {
        self.list.len() as u32
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.list.iter()
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.list.find(&Posting {
            doc_id,
            positions: Vec::new(),
        })
    }

    pub fn skip_list(&self) -> &SkipList<Posting> {
        &self.list
    }

    /// Project to the bare document-id set.
    pub fn doc_ids(&self) -> SkipList<DocId> {
        SkipList::from_sorted(self.iter().map(|p| p.doc_id).collect())
    }

    /// Union used by wildcard term-set expansion: postings for the same
    /// document merge their position sequences.
    pub fn union(&self, other: &Self) -> Self {
        let mut out: Vec<Posting> = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        let a = self.list.as_slice();
        let b = other.list.as_slice();
        while i < a.len() && j < b.len() {
            match a[i].doc_id.cmp(&b[j].doc_id) {
                Ordering::Equal => {
                    let mut posting = a[i].clone();
                    posting.merge(b[j].clone());
                    out.push(posting);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    out.push(a[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j].clone());
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        PostingList {
            list: SkipList::from_sorted(out),
        }
    }

    /// Positional intersection for phrase queries: keeps documents where some
    /// position of `self` is immediately followed by a position of `next`,
    /// and keeps those follower positions so the check chains left to right
    /// across the phrase.
    pub fn intersect_adjacent(&self, next: &Self) -> Self {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        let a = self.list.as_slice();
        let b = next.list.as_slice();
        while i < a.len() && j < b.len() {
            match a[i].doc_id.cmp(&b[j].doc_id) {
                Ordering::Equal => {
                    let followers = adjacent_positions(&a[i].positions, &b[j].positions);
                    if !followers.is_empty() {
                        out.push(Posting::new(a[i].doc_id, followers));
                    }
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        PostingList {
            list: SkipList::from_sorted(out),
        }
    }
}

/// Positions of `second` that directly follow a position of `first`.
/// Linear in the smaller sequence plus the scan distance.
fn adjacent_positions(first: &[u32], second: &[u32]) -> Vec<u32> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < first.len() && j < second.len() {
        let wanted = first[i] + 1;
        match second[j].cmp(&wanted) {
            Ordering::Equal => {
                out.push(second[j]);
                i += 1;
                j += 1;
            }
            Ordering::Less => j += 1,
            Ordering::Greater => i += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc: u64, positions: &[u32]) -> Posting {
        Posting::new(DocId(doc), positions.to_vec())
    }

    #[test]
    fn from_postings_sorts_and_merges_collisions() {
        let list = PostingList::from_postings(vec![
            posting(2, &[5]),
            posting(1, &[0, 7]),
            posting(2, &[1, 5, 9]),
        ]);
        assert_eq!(list.df(), 2);
        let ids: Vec<u64> = list.iter().map(|p| p.doc_id.0).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(list.get(DocId(2)).unwrap().positions, [1, 5, 9]);
        assert_eq!(list.get(DocId(2)).unwrap().term_freq(), 3);
    }

    #[test]
    fn union_merges_positions_per_document() {
        let a = PostingList::from_postings(vec![posting(1, &[0]), posting(3, &[2])]);
        let b = PostingList::from_postings(vec![posting(1, &[4]), posting(2, &[1])]);
        let u = a.union(&b);
        let ids: Vec<u64> = u.iter().map(|p| p.doc_id.0).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(u.get(DocId(1)).unwrap().positions, [0, 4]);
    }

    #[test]
    fn adjacency_keeps_follower_positions() {
        // "space jam": space@{0,10}, jam@{1,5}
        let space = PostingList::from_postings(vec![posting(1, &[0, 10])]);
        let jam = PostingList::from_postings(vec![posting(1, &[1, 5])]);
        let phrase = space.intersect_adjacent(&jam);
        assert_eq!(phrase.df(), 1);
        assert_eq!(phrase.get(DocId(1)).unwrap().positions, [1]);

        // reversed order does not match
        let reversed = jam.intersect_adjacent(&space);
        assert!(reversed.is_empty());
    }

    #[test]
    fn adjacency_chains_across_three_terms() {
        // "a b c" at positions 3,4,5
        let a = PostingList::from_postings(vec![posting(7, &[3])]);
        let b = PostingList::from_postings(vec![posting(7, &[4])]);
        let c = PostingList::from_postings(vec![posting(7, &[5, 9])]);
        let chained = a.intersect_adjacent(&b).intersect_adjacent(&c);
        assert_eq!(chained.get(DocId(7)).unwrap().positions, [5]);
    }
}
