//! E20 memory subsystem.
//!
//! Memory is 8192 sixteen-bit cells. Every access, whether an instruction
//! fetch or a load/store, is reduced modulo the memory size first, so no
//! address can ever fall outside the array.

use crate::cpu::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells in the E20.
pub const MEMORY_SIZE: usize = 1 << 13;

/// Mask that reduces any 16-bit value to a valid cell index.
pub const ADDR_MASK: Word = (MEMORY_SIZE - 1) as Word;

/// E20 memory: 8192 sixteen-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Reduce a 16-bit value to a cell index.
    #[inline]
    pub const fn wrap(addr: Word) -> Word {
        addr & ADDR_MASK
    }

    /// Read a cell. The address wraps around at 8192.
    #[inline]
    pub fn read(&self, addr: Word) -> Word {
        self.cells[Self::wrap(addr) as usize]
    }

    /// Write a cell. The address wraps around at 8192.
    #[inline]
    pub fn write(&mut self, addr: Word, value: Word) {
        self.cells[Self::wrap(addr) as usize] = value;
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: usize, program: &[Word]) -> Result<(), MemoryError> {
        if start_addr + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE.saturating_sub(start_addr),
            });
        }

        self.cells[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// The first `count` cells, clamped to the memory size.
    pub fn dump(&self, count: usize) -> &[Word] {
        &self.cells[..count.min(MEMORY_SIZE)]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
