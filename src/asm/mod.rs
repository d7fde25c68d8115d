//! Program text formats for the E20.
//!
//! This module provides:
//! - A loader for `ram[addr] = 16'b...;` machine-code files
//! - A disassembler (machine words → readable text)

pub mod disasm;
pub mod loader;

pub use disasm::{disassemble, disassemble_instruction};
pub use loader::{load_file, load_into, load_machine_code, LoadError};
