/// Sorted sequence with √P evenly spaced forward pointers for fast
/// merge-style intersection, union and difference.
///
/// With P elements there are F = ⌈√P⌉ pointers at stride S = ⌊P/F⌋, placed at
/// indices 0, S, 2S, ...; the last element never carries one. Pointers are
/// recomputed whenever the structural size changes.
#[derive(Debug, Clone)]
pub struct SkipList<T> {
    elems: Vec<T>,
    skips: Vec<Option<usize>>,
    stride: usize,
}

impl<T: Ord> SkipList<T> {
    pub fn new() -> Self {
        SkipList {
            elems: Vec::new(),
            skips: Vec::new(),
            stride: 0,
        }
    }

    /// Build from an already sorted, duplicate-free vector.
    pub fn from_sorted(elems: Vec<T>) -> Self {
        debug_assert!(elems.windows(2).all(|w| w[0] < w[1]));
        let mut list = SkipList {
            elems,
            skips: Vec::new(),
            stride: 0,
        };
        list.rebuild_skips();
        list
    }

    /// Sorts and deduplicates, then builds.
    pub fn from_unsorted(mut elems: Vec<T>) -> Self {
        elems.sort();
        elems.dedup();
        Self::from_sorted(elems)
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elems.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elems.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elems
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elems
    }

    /// Forward-pointer target of the element at `index`, if it carries one.
    pub fn skip_target(&self, index: usize) -> Option<usize> {
        self.skips.get(index).copied().flatten()
    }

    /// Append an element greater than the current maximum.
    pub fn push_sorted(&mut self, elem: T) {
        debug_assert!(self.elems.last().map(|last| *last < elem).unwrap_or(true));
        self.elems.push(elem);
        self.rebuild_skips();
    }

    pub fn contains(&self, value: &T) -> bool {
        self.elems.binary_search(value).is_ok()
    }

    pub fn find(&self, value: &T) -> Option<&T> {
        self.elems
            .binary_search(value)
            .ok()
            .map(|index| &self.elems[index])
    }

    fn rebuild_skips(&mut self) {
        let p = self.elems.len();
        self.skips = vec![None; p];
        if p < 2 {
            self.stride = 0;
            return;
        }
        let f = (p as f64).sqrt().ceil() as usize;
        let s = p / f;
        self.stride = s;
        if s == 0 {
            return;
        }
        for i in 0..f {
            let at = i * s;
            if at < p - 1 {
                self.skips[at] = Some((at + s).min(p - 1));
            }
        }
    }

    /// Advance `from` until the element is >= `target`, taking forward
    /// pointers while the pointed-at element is still <= `target`.
    fn advance(&self, mut from: usize, target: &T) -> usize {
        while from < self.elems.len() && self.elems[from] < *target {
            if let Some(jump) = self.skips[from] {
                if self.elems[jump] <= *target {
                    from = jump;
                    continue;
                }
            }
            from += 1;
        }
        from
    }
}

impl<T: Ord + Clone> SkipList<T> {
    pub fn intersect(&self, other: &Self) -> Self {
        // advance the smaller cursor, jumping over runs via skip pointers
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            match self.elems[i].cmp(&other.elems[j]) {
                std::cmp::Ordering::Equal => {
                    out.push(self.elems[i].clone());
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    i = self.advance(i, &other.elems[j]);
                }
                std::cmp::Ordering::Greater => {
                    j = other.advance(j, &self.elems[i]);
                }
            }
        }
        Self::from_sorted(out)
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            match self.elems[i].cmp(&other.elems[j]) {
                std::cmp::Ordering::Equal => {
                    out.push(self.elems[i].clone());
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    out.push(self.elems[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(other.elems[j].clone());
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.elems[i..]);
        out.extend_from_slice(&other.elems[j..]);
        Self::from_sorted(out)
    }

    /// Elements of `self` absent from `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let mut j = 0;
        for elem in &self.elems {
            j = other.advance(j, elem);
            if j >= other.len() || other.elems[j] != *elem {
                out.push(elem.clone());
            }
        }
        Self::from_sorted(out)
    }
}

impl<T: Ord> Default for SkipList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + PartialEq> PartialEq for SkipList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elems == other.elems
    }
}

impl<T: Ord + Eq> Eq for SkipList<T> {}

impl<'a, T: Ord> IntoIterator for &'a SkipList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip_positions<T: Ord>(list: &SkipList<T>) -> Vec<usize> {
        (0..list.len())
            .filter(|&i| list.skip_target(i).is_some())
            .collect()
    }

    #[test]
    fn pointers_follow_the_sqrt_layout() {
        // P=6: F=3, S=2, pointers at {0,2,4}, never on the last element
        let list = SkipList::from_sorted(vec![1, 3, 5, 7, 9, 11]);
        assert_eq!(skip_positions(&list), vec![0, 2, 4]);
        assert_eq!(list.skip_target(5), None);

        // P=1: no pointers at all
        let single = SkipList::from_sorted(vec![42]);
        assert_eq!(skip_positions(&single), Vec::<usize>::new());
    }

    #[test]
    fn pointer_positions_match_formula_for_many_sizes() {
        for p in 0usize..200 {
            let list = SkipList::from_sorted((0..p as u64).collect());
            let expected: Vec<usize> = if p < 2 {
                vec![]
            } else {
                let f = (p as f64).sqrt().ceil() as usize;
                let s = p / f;
                (0..f).map(|i| i * s).filter(|&i| i < p - 1).collect()
            };
            assert_eq!(skip_positions(&list), expected, "P={}", p);
        }
    }

    #[test]
    fn intersection_with_skips() {
        let a = SkipList::from_sorted(vec![1, 3, 5, 7, 9, 11]);
        let b = SkipList::from_sorted(vec![2, 5, 7, 12]);
        assert_eq!(a.intersect(&b).as_slice(), &[5, 7]);
        assert_eq!(b.intersect(&a).as_slice(), &[5, 7]);
    }

    #[test]
    fn union_and_difference() {
        let a = SkipList::from_sorted(vec![1, 3, 5]);
        let b = SkipList::from_sorted(vec![2, 3, 6]);
        assert_eq!(a.union(&b).as_slice(), &[1, 2, 3, 5, 6]);
        assert_eq!(a.difference(&b).as_slice(), &[1, 5]);
        assert_eq!(b.difference(&a).as_slice(), &[2, 6]);
    }

    #[test]
    fn merges_against_empty() {
        let a = SkipList::from_sorted(vec![1, 2, 3]);
        let empty = SkipList::<i32>::new();
        assert!(a.intersect(&empty).is_empty());
        assert_eq!(a.union(&empty).as_slice(), &[1, 2, 3]);
        assert_eq!(a.difference(&empty).as_slice(), &[1, 2, 3]);
        assert!(empty.difference(&a).is_empty());
    }

    #[test]
    fn long_runs_are_jumped() {
        let a = SkipList::from_sorted((0u64..10_000).collect());
        let b = SkipList::from_sorted(vec![9_999u64]);
        assert_eq!(a.intersect(&b).as_slice(), &[9_999]);
    }

    #[test]
    fn push_sorted_recomputes_pointers() {
        let mut list = SkipList::from_sorted(vec![1, 2, 3]);
        for v in 4..=6 {
            list.push_sorted(v);
        }
        assert_eq!(skip_positions(&list), vec![0, 2, 4]);
    }
}
