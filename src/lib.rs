//! # E20 Simulator
//!
//! An emulator for the E20, a small 16-bit teaching instruction set, with
//! an optional one- or two-level cache model that watches every load and
//! store and logs hits, misses and writes.
//!
//! The machine halts when a jump targets the instruction performing it.
//! There is no other way for a program to stop.

pub mod cpu;
pub mod cache;
pub mod asm;
pub mod report;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Instruction, Word, MemoryAccess, MemoryObserver};
pub use cache::{CacheHierarchy, HierarchyConfig, CacheConfig, ConfigError};
pub use asm::{load_file, load_into, load_machine_code, disassemble, LoadError};
pub use report::FinalState;
