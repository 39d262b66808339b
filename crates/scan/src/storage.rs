use blockcensus_common::{ScanObject, ScanOptions};
use std::collections::HashMap;

/// Merge-capable multiset of [`ScanObject`] counts.
///
/// Not internally synchronised: each worker fills its own storage for one
/// region and hands it back whole, and only the scheduler merges partial
/// storages into the running aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStorage {
    counts: HashMap<ScanObject, u64>,
}

impl AggregateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, object: ScanObject) {
        self.increment_by(object, 1);
    }

    /// Add `n` to an object's count, creating it at zero if absent.
    ///
    /// Saturates at `u64::MAX` rather than wrapping.
    pub fn increment_by(&mut self, object: ScanObject, n: u64) {
        let count = self.counts.entry(object).or_insert(0);
        *count = count.saturating_add(n);
    }

    /// Count for one object, zero when absent.
    pub fn get(&self, object: &ScanObject) -> u64 {
        self.counts.get(object).copied().unwrap_or(0)
    }

    /// Fold `other` into `self`, summing overlapping keys.
    pub fn merge_right(&mut self, other: AggregateStorage) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        for (object, n) in other.counts {
            self.increment_by(object, n);
        }
    }

    /// Sum of counts over objects matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&ScanObject) -> bool) -> u64 {
        self.counts
            .iter()
            .filter(|(object, _)| predicate(object))
            .fold(0u64, |acc, (_, n)| acc.saturating_add(*n))
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.count(|_| true)
    }

    /// Objects with a non-zero count, in no particular order.
    pub fn keys(&self) -> Vec<ScanObject> {
        self.counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(object, _)| object.clone())
            .collect()
    }

    /// Display entries for a finished scan, sorted by kind then name.
    ///
    /// Lists the allow-list when `options` has one, otherwise every key.
    /// Zero counts are dropped unless `options.retain_zero` is set.
    pub fn entries(&self, options: &ScanOptions) -> Vec<(ScanObject, u64)> {
        let mut items: Vec<ScanObject> = match &options.allow {
            Some(allow) => allow.iter().cloned().collect(),
            None => self.counts.keys().cloned().collect(),
        };
        items.sort();
        items
            .into_iter()
            .map(|object| {
                let n = self.get(&object);
                (object, n)
            })
            .filter(|(_, n)| *n != 0 || options.retain_zero)
            .collect()
    }

    /// Number of distinct objects with a non-zero count.
    pub fn len(&self) -> usize {
        self.counts.values().filter(|n| **n > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScanObject, u64)> {
        self.counts.iter().map(|(object, n)| (object, *n))
    }
}

impl FromIterator<(ScanObject, u64)> for AggregateStorage {
    fn from_iter<I: IntoIterator<Item = (ScanObject, u64)>>(iter: I) -> Self {
        let mut storage = Self::new();
        for (object, n) in iter {
            storage.increment_by(object, n);
        }
        storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(items: &[(&str, u64)]) -> AggregateStorage {
        items
            .iter()
            .map(|(name, n)| (ScanObject::block(*name), *n))
            .collect()
    }

    #[test]
    fn increment_creates_and_adds() {
        let mut s = AggregateStorage::new();
        s.increment(ScanObject::block("stone"));
        s.increment_by(ScanObject::block("stone"), 4);
        assert_eq!(s.get(&ScanObject::block("stone")), 5);
        assert_eq!(s.get(&ScanObject::block("dirt")), 0);
    }

    #[test]
    fn increment_saturates() {
        let mut s = AggregateStorage::new();
        s.increment_by(ScanObject::block("stone"), u64::MAX);
        s.increment(ScanObject::block("stone"));
        assert_eq!(s.get(&ScanObject::block("stone")), u64::MAX);
    }

    #[test]
    fn merge_sums_overlapping_keys() {
        let mut a = storage(&[("stone", 3), ("dirt", 1)]);
        a.merge_right(storage(&[("stone", 2), ("sand", 7)]));
        assert_eq!(a, storage(&[("stone", 5), ("dirt", 1), ("sand", 7)]));
    }

    #[test]
    fn merge_is_commutative() {
        let a = storage(&[("stone", 3), ("dirt", 1)]);
        let b = storage(&[("stone", 2), ("sand", 7)]);

        let mut ab = a.clone();
        ab.merge_right(b.clone());
        let mut ba = b;
        ba.merge_right(a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_is_associative() {
        let a = storage(&[("stone", 3)]);
        let b = storage(&[("stone", 2), ("dirt", 4)]);
        let c = storage(&[("dirt", 1), ("tnt", 9)]);

        let mut left = a.clone();
        left.merge_right(b.clone());
        left.merge_right(c.clone());

        let mut bc = b;
        bc.merge_right(c);
        let mut right = a;
        right.merge_right(bc);

        assert_eq!(left, right);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let mut a = storage(&[("stone", 3)]);
        a.merge_right(AggregateStorage::new());
        assert_eq!(a, storage(&[("stone", 3)]));

        let mut empty = AggregateStorage::new();
        empty.merge_right(a.clone());
        assert_eq!(empty, a);
    }

    #[test]
    fn count_by_predicate() {
        let mut s = storage(&[("stone", 3), ("dirt", 2)]);
        s.increment_by(ScanObject::entity("cow"), 4);
        assert_eq!(s.count(ScanObject::is_block), 5);
        assert_eq!(s.count(ScanObject::is_entity), 4);
        assert_eq!(s.total(), 9);
    }

    #[test]
    fn keys_skip_zero_counts() {
        let mut s = storage(&[("stone", 3)]);
        s.increment_by(ScanObject::block("air"), 0);
        assert_eq!(s.keys(), vec![ScanObject::block("stone")]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn entries_follow_allow_list_and_retain_zero() {
        let s = storage(&[("stone", 3), ("dirt", 2)]);
        let options = ScanOptions::only([ScanObject::block("stone"), ScanObject::block("tnt")]);
        assert_eq!(s.entries(&options), vec![(ScanObject::block("stone"), 3)]);

        let options = options.with_retain_zero();
        assert_eq!(
            s.entries(&options),
            vec![(ScanObject::block("stone"), 3), (ScanObject::block("tnt"), 0)]
        );
    }

    #[test]
    fn entries_without_allow_list_are_sorted_keys() {
        let mut s = storage(&[("stone", 3), ("dirt", 2)]);
        s.increment(ScanObject::entity("bee"));
        let names: Vec<String> = s
            .entries(&ScanOptions::all())
            .into_iter()
            .map(|(o, _)| o.name().to_owned())
            .collect();
        assert_eq!(names, ["dirt", "stone", "bee"]);
    }
}
