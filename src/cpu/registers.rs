//! E20 registers.
//!
//! The E20 has 8 general-purpose 16-bit registers `$0`-`$7` and a
//! 16-bit program counter. `$0` always reads as zero; `$7` receives the
//! return address of `jal`.

use crate::cpu::Word;
use crate::cpu::memory::Memory;
use serde::{Serialize, Deserialize};

/// The number of general-purpose registers.
pub const NUM_REGS: usize = 8;

/// The link register written by `jal`.
pub const LINK_REG: Reg = Reg(7);

/// A 3-bit register index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reg(u8);

impl Reg {
    /// Create a register index from the low 3 bits of `index`.
    #[inline]
    pub const fn new(index: u8) -> Self {
        Self(index & 0b111)
    }

    /// The register number, 0-7.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// The E20 register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// General-purpose registers. Index 0 is reset to zero after each step.
    gpr: [Word; NUM_REGS],

    /// Program counter. Kept as a full 16-bit value; fetches use it modulo 8192.
    pub pc: Word,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a general-purpose register.
    #[inline]
    pub fn get(&self, reg: Reg) -> Word {
        self.gpr[reg.index()]
    }

    /// Write a general-purpose register.
    ///
    /// Writes to `$0` land, but are discarded by [`Registers::clear_zero`]
    /// at the end of the step.
    #[inline]
    pub fn set(&mut self, reg: Reg, value: Word) {
        self.gpr[reg.index()] = value;
    }

    /// Force `$0` back to zero.
    #[inline]
    pub fn clear_zero(&mut self) {
        self.gpr[0] = 0;
    }

    /// All general-purpose registers, `$0` first.
    pub fn all(&self) -> &[Word; NUM_REGS] {
        &self.gpr
    }

    /// Increment the program counter by 1, wrapping at 2^16.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> Word {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: Word) {
        self.pc = addr;
    }

    /// The memory cell the program counter currently points at.
    pub fn fetch_addr(&self) -> Word {
        Memory::wrap(self.pc)
    }

    /// Compute a load/store address: base register plus offset, modulo 8192.
    pub fn effective_address(&self, base: Reg, offset: Word) -> Word {
        Memory::wrap(self.get(base).wrapping_add(offset))
    }
}
