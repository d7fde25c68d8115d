//! Cache geometry and the `--cache` option.
//!
//! The option is either `size,assoc,blocksize` for an L1 cache alone, or
//! six values for L1 followed by L2. Sizes are counted in memory cells.

use serde::{Serialize, Deserialize};
use std::str::FromStr;
use thiserror::Error;

/// Geometry of one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Total capacity in cells, excluding metadata.
    pub size: usize,
    /// Ways per row.
    pub assoc: usize,
    /// Cells per block.
    pub blocksize: usize,
}

impl CacheConfig {
    /// Build a configuration, rejecting geometries with no rows.
    pub fn new(size: usize, assoc: usize, blocksize: usize) -> Result<Self, ConfigError> {
        let config = Self { size, assoc, blocksize };
        if size == 0 || assoc == 0 || blocksize == 0 {
            return Err(ConfigError::Zero(config));
        }
        if config.rows() == 0 {
            return Err(ConfigError::NoRows(config));
        }
        Ok(config)
    }

    /// Number of rows: `size / assoc / blocksize`.
    pub fn rows(&self) -> usize {
        self.size / self.assoc / self.blocksize
    }
}

/// One or two cache levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub l1: CacheConfig,
    pub l2: Option<CacheConfig>,
}

impl FromStr for HierarchyConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidNumber(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts[..] {
            [size, assoc, blocksize] => Ok(Self {
                l1: CacheConfig::new(size, assoc, blocksize)?,
                l2: None,
            }),
            [size1, assoc1, blocksize1, size2, assoc2, blocksize2] => Ok(Self {
                l1: CacheConfig::new(size1, assoc1, blocksize1)?,
                l2: Some(CacheConfig::new(size2, assoc2, blocksize2)?),
            }),
            _ => Err(ConfigError::WrongCount(parts.len())),
        }
    }
}

/// Errors in a cache configuration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid cache config: expected 3 or 6 values, found {0}")]
    WrongCount(usize),

    #[error("Invalid cache config: {0:?} is not a number")]
    InvalidNumber(String),

    #[error("Invalid cache config: size, associativity and blocksize must be positive ({0:?})")]
    Zero(CacheConfig),

    #[error("Invalid cache config: {0:?} has no rows")]
    NoRows(CacheConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_level() {
        let config: HierarchyConfig = "8,2,2".parse().unwrap();
        assert_eq!(config.l1, CacheConfig { size: 8, assoc: 2, blocksize: 2 });
        assert_eq!(config.l1.rows(), 2);
        assert!(config.l2.is_none());
    }

    #[test]
    fn test_parse_two_levels() {
        let config: HierarchyConfig = "4,1,1,32,4,2".parse().unwrap();
        assert_eq!(config.l1.rows(), 4);
        assert_eq!(config.l2.map(|c| c.rows()), Some(4));
    }

    #[test]
    fn test_wrong_count() {
        assert_eq!("8,2".parse::<HierarchyConfig>(), Err(ConfigError::WrongCount(2)));
        assert_eq!("1,1,1,1".parse::<HierarchyConfig>(), Err(ConfigError::WrongCount(4)));
        assert_eq!("1,1,1,1,1,1,1".parse::<HierarchyConfig>(), Err(ConfigError::WrongCount(7)));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!("8,x,2".parse::<HierarchyConfig>(), Err(ConfigError::InvalidNumber("x".into())));
        assert!(matches!("8,0,2".parse::<HierarchyConfig>(), Err(ConfigError::Zero(_))));
        assert!(matches!("2,2,2".parse::<HierarchyConfig>(), Err(ConfigError::NoRows(_))));
    }
}
