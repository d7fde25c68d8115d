//! Least-recently-used tag set for one cache row.
//!
//! Tags are kept in recency order: the front is the most recently used,
//! the back is the least recently used and the only eviction candidate.

use std::collections::VecDeque;

/// A block tag.
pub type Tag = usize;

/// Result of touching a set with a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The tag was present and is now the most recently used.
    Hit,
    /// The tag was absent and has been inserted at the front.
    /// `evicted` is the tag pushed out of a full set, if any.
    Miss { evicted: Option<Tag> },
}

impl Lookup {
    /// Whether the lookup hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit)
    }
}

/// One row of a set-associative cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LruSet {
    tags: VecDeque<Tag>,
    ways: usize,
}

impl LruSet {
    /// Create an empty set holding at most `ways` tags.
    ///
    /// Storage grows with the resident tags; `ways` only bounds it.
    pub fn new(ways: usize) -> Self {
        Self {
            tags: VecDeque::new(),
            ways,
        }
    }

    /// Access `tag`: refresh it on a hit, insert it (evicting the back
    /// entry when full) on a miss.
    pub fn touch(&mut self, tag: Tag) -> Lookup {
        if let Some(pos) = self.tags.iter().position(|&t| t == tag) {
            self.tags.remove(pos);
            self.tags.push_front(tag);
            return Lookup::Hit;
        }

        let evicted = if self.tags.len() >= self.ways {
            self.tags.pop_back()
        } else {
            None
        };
        self.tags.push_front(tag);
        Lookup::Miss { evicted }
    }

    /// Whether `tag` is resident.
    pub fn contains(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Resident tags, most recently used first.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }

    /// Number of resident tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tag is resident.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lru_evicts_oldest() {
        let mut set = LruSet::new(2);
        assert_eq!(set.touch(10), Lookup::Miss { evicted: None });
        assert_eq!(set.touch(20), Lookup::Miss { evicted: None });
        assert_eq!(set.touch(30), Lookup::Miss { evicted: Some(10) });

        assert_eq!(set.tags().collect::<Vec<_>>(), vec![30, 20]);
    }

    #[test]
    fn test_hit_refreshes_recency() {
        let mut set = LruSet::new(2);
        set.touch(10);
        set.touch(20);
        assert_eq!(set.touch(10), Lookup::Hit);
        assert_eq!(set.touch(30), Lookup::Miss { evicted: Some(20) });

        assert_eq!(set.tags().collect::<Vec<_>>(), vec![30, 10]);
    }

    #[test]
    fn test_direct_mapped() {
        let mut set = LruSet::new(1);
        set.touch(1);
        assert_eq!(set.touch(2), Lookup::Miss { evicted: Some(1) });
        assert!(!set.contains(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_huge_associativity_allocates_lazily() {
        let mut set = LruSet::new(1 << 30);
        assert!(set.is_empty());
        assert_eq!(set.touch(1), Lookup::Miss { evicted: None });
        assert_eq!(set.touch(2), Lookup::Miss { evicted: None });
        assert_eq!(set.touch(1), Lookup::Hit);
        assert_eq!(set.tags().collect::<Vec<_>>(), vec![1, 2]);
    }

    proptest! {
        #[test]
        fn never_exceeds_ways_or_duplicates(ways in 1usize..8, tags in prop::collection::vec(0usize..16, 0..64)) {
            let mut set = LruSet::new(ways);
            for tag in tags {
                set.touch(tag);
                prop_assert!(set.len() <= ways);
                prop_assert_eq!(set.tags().next(), Some(tag));
            }
            let mut seen: Vec<_> = set.tags().collect();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), set.len());
        }
    }
}
