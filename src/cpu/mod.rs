//! CPU emulation for the E20.
//!
//! This module implements the E20 architecture:
//! - 8192 sixteen-bit memory cells, addressed modulo 8192
//! - 8 general-purpose registers, `$0` hardwired to zero
//! - 13-instruction set in three encodings (three-register, immediate, jump)

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

/// A 16-bit machine word.
pub type Word = u16;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Registers, Reg, NUM_REGS};
pub use decode::{Instruction, Fields, decode, encode};
pub use execute::{Cpu, CpuError, CpuState, AccessKind, MemoryAccess, MemoryObserver, NullObserver};
