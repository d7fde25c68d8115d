//! Set-associative cache model.
//!
//! The model only tracks which block tags are resident in each row; it
//! holds no data and never affects the emulated program. Each level maps
//! an address to a row and tag as
//!
//! ```text
//! block = addr / blocksize
//! row   = block % rows
//! tag   = block / rows
//! ```
//!
//! and replaces the least recently used tag when a full row misses.

pub mod config;
pub mod set;

pub use config::{CacheConfig, ConfigError, HierarchyConfig};
pub use set::{Lookup, LruSet, Tag};

use crate::cpu::{MemoryAccess, Word};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Cache level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    L1,
    L2,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::L1 => f.write_str("L1"),
            Level::L2 => f.write_str("L2"),
        }
    }
}

/// Logged outcome of one cache access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Hit,
    Miss,
    /// Any store, hit or miss.
    Write,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Hit => f.write_str("HIT"),
            Status::Miss => f.write_str("MISS"),
            Status::Write => f.write_str("SW"),
        }
    }
}

/// One line of the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEvent {
    pub level: Level,
    pub status: Status,
    pub pc: Word,
    pub addr: Word,
    pub row: usize,
}

/// Per-level access counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Stores, counted in addition to their hit or miss.
    pub writes: u64,
    pub evictions: u64,
}

/// A single cache level.
#[derive(Debug, Clone)]
pub struct Cache {
    level: Level,
    config: CacheConfig,
    sets: Vec<LruSet>,
    stats: CacheStats,
}

impl Cache {
    /// Create an empty cache.
    pub fn new(level: Level, config: CacheConfig) -> Self {
        Self {
            level,
            config,
            sets: vec![LruSet::new(config.assoc); config.rows()],
            stats: CacheStats::default(),
        }
    }

    /// Map an address to its `(row, tag)`.
    pub fn locate(&self, addr: Word) -> (usize, Tag) {
        let rows = self.sets.len();
        let block = addr as usize / self.config.blocksize;
        (block % rows, block / rows)
    }

    /// Access `addr` and report the row together with the lookup result.
    pub fn access(&mut self, addr: Word, is_write: bool) -> (usize, Lookup) {
        let (row, tag) = self.locate(addr);
        let lookup = self.sets[row].touch(tag);

        match lookup {
            Lookup::Hit => self.stats.hits += 1,
            Lookup::Miss { evicted } => {
                self.stats.misses += 1;
                if let Some(old) = evicted {
                    self.stats.evictions += 1;
                    log::debug!("{} row {}: evicted tag {} for tag {}", self.level, row, old, tag);
                }
            }
        }
        if is_write {
            self.stats.writes += 1;
        }

        (row, lookup)
    }

    /// The row at `index`.
    pub fn set(&self, index: usize) -> &LruSet {
        &self.sets[index]
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// An L1 cache with an optional L2 behind it.
///
/// Loads go to L2 only when L1 misses. Stores always go to both levels.
#[derive(Debug, Clone)]
pub struct CacheHierarchy {
    l1: Cache,
    l2: Option<Cache>,
}

impl CacheHierarchy {
    /// Create empty caches for every configured level.
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            l1: Cache::new(Level::L1, config.l1),
            l2: config.l2.map(|l2| Cache::new(Level::L2, l2)),
        }
    }

    /// Run one memory access through the hierarchy, passing each level's
    /// log event to `emit` in the order the levels are consulted.
    pub fn access(&mut self, access: MemoryAccess, mut emit: impl FnMut(CacheEvent)) {
        let is_write = access.is_write();

        let l1_hit = Self::touch(&mut self.l1, access, &mut emit);

        if let Some(l2) = self.l2.as_mut() {
            if is_write || !l1_hit {
                Self::touch(l2, access, &mut emit);
            }
        }
    }

    fn touch(cache: &mut Cache, access: MemoryAccess, emit: &mut impl FnMut(CacheEvent)) -> bool {
        let is_write = access.is_write();
        let (row, lookup) = cache.access(access.addr, is_write);

        let status = match (is_write, lookup.is_hit()) {
            (true, _) => Status::Write,
            (false, true) => Status::Hit,
            (false, false) => Status::Miss,
        };
        emit(CacheEvent {
            level: cache.level(),
            status,
            pc: access.pc,
            addr: access.addr,
            row,
        });

        lookup.is_hit()
    }

    /// All configured levels, L1 first.
    pub fn levels(&self) -> impl Iterator<Item = &Cache> {
        std::iter::once(&self.l1).chain(self.l2.as_ref())
    }

    pub fn l1(&self) -> &Cache {
        &self.l1
    }

    pub fn l2(&self) -> Option<&Cache> {
        self.l2.as_ref()
    }

    /// Counters for every configured level, L1 first.
    pub fn stats(&self) -> Vec<(Level, CacheStats)> {
        self.levels().map(|cache| (cache.level(), *cache.stats())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::AccessKind;

    fn load(pc: Word, addr: Word) -> MemoryAccess {
        MemoryAccess { pc, addr, kind: AccessKind::Read }
    }

    fn store(pc: Word, addr: Word) -> MemoryAccess {
        MemoryAccess { pc, addr, kind: AccessKind::Write }
    }

    fn run(cache: &mut CacheHierarchy, accesses: &[MemoryAccess]) -> Vec<(Level, Status, usize)> {
        let mut events = Vec::new();
        for &access in accesses {
            cache.access(access, |e| events.push((e.level, e.status, e.row)));
        }
        events
    }

    #[test]
    fn test_locate() {
        let cache = Cache::new(Level::L1, CacheConfig::new(16, 2, 2).unwrap());
        // 4 rows, block = addr / 2
        assert_eq!(cache.locate(0), (0, 0));
        assert_eq!(cache.locate(3), (1, 0));
        assert_eq!(cache.locate(9), (0, 1));
        assert_eq!(cache.locate(8191), (3, 1023));
    }

    #[test]
    fn test_lru_eviction_in_one_row() {
        // One row, two ways, block size 1: every address is its own tag.
        let config: HierarchyConfig = "2,2,1".parse().unwrap();
        let mut cache = CacheHierarchy::new(&config);
        let events = run(&mut cache, &[load(0, 10), load(1, 20), load(2, 30), load(3, 10)]);

        assert_eq!(
            events,
            vec![
                (Level::L1, Status::Miss, 0),
                (Level::L1, Status::Miss, 0),
                (Level::L1, Status::Miss, 0),
                (Level::L1, Status::Miss, 0),
            ]
        );
        assert_eq!(cache.l1().set(0).tags().collect::<Vec<_>>(), vec![10, 30]);
        assert_eq!(cache.l1().stats().evictions, 2);
    }

    #[test]
    fn test_load_hit_skips_l2() {
        let config: HierarchyConfig = "4,1,1,16,2,1".parse().unwrap();
        let mut cache = CacheHierarchy::new(&config);
        let events = run(&mut cache, &[load(0, 5), load(1, 5)]);

        assert_eq!(
            events,
            vec![
                (Level::L1, Status::Miss, 1),
                (Level::L2, Status::Miss, 5),
                (Level::L1, Status::Hit, 1),
            ]
        );
    }

    #[test]
    fn test_load_l1_miss_l2_hit() {
        let config: HierarchyConfig = "1,1,1,16,2,1".parse().unwrap();
        let mut cache = CacheHierarchy::new(&config);
        let events = run(&mut cache, &[load(0, 1), load(1, 2), load(2, 1)]);

        assert_eq!(events.last(), Some(&(Level::L2, Status::Hit, 1)));
        assert_eq!(events[4], (Level::L1, Status::Miss, 0));
    }

    #[test]
    fn test_store_always_reaches_l2() {
        let config: HierarchyConfig = "4,1,1,16,2,1".parse().unwrap();
        let mut cache = CacheHierarchy::new(&config);
        let events = run(&mut cache, &[store(0, 5), store(1, 5)]);

        assert_eq!(
            events,
            vec![
                (Level::L1, Status::Write, 1),
                (Level::L2, Status::Write, 5),
                (Level::L1, Status::Write, 1),
                (Level::L2, Status::Write, 5),
            ]
        );
        // The second store hit in both levels even though it logs SW
        assert_eq!(cache.l1().stats().hits, 1);
        assert_eq!(cache.l2().map(|c| c.stats().hits), Some(1));
    }

    #[test]
    fn test_store_then_load_hits() {
        let config: HierarchyConfig = "8,2,2".parse().unwrap();
        let mut cache = CacheHierarchy::new(&config);
        // Same block (addresses 6 and 7)
        let events = run(&mut cache, &[store(0, 6), load(1, 7)]);

        assert_eq!(events, vec![(Level::L1, Status::Write, 1), (Level::L1, Status::Hit, 1)]);
    }

    #[test]
    fn test_one_row_with_huge_associativity() {
        let config: HierarchyConfig = "1073741824,1073741824,1".parse().unwrap();
        assert_eq!(config.l1.rows(), 1);

        let mut cache = CacheHierarchy::new(&config);
        let events = run(&mut cache, &[load(0, 7), load(1, 8191), load(2, 7)]);

        assert_eq!(
            events,
            vec![
                (Level::L1, Status::Miss, 0),
                (Level::L1, Status::Miss, 0),
                (Level::L1, Status::Hit, 0),
            ]
        );
        assert_eq!(cache.l1().stats().evictions, 0);
    }

    #[test]
    fn test_event_carries_pc_and_addr() {
        let config: HierarchyConfig = "8,2,2".parse().unwrap();
        let mut cache = CacheHierarchy::new(&config);
        let mut seen = None;
        cache.access(load(17, 300), |e| seen = Some(e));

        assert_eq!(
            seen,
            Some(CacheEvent { level: Level::L1, status: Status::Miss, pc: 17, addr: 300, row: 0 })
        );
    }
}
