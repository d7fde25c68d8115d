//! Machine-code file loader.
//!
//! The format is one memory cell per line:
//!
//! ```text
//! ram[0] = 16'b0010000010000101;
//! ram[1] = 16'b0100000000000001;   // anything after the semicolon is ignored
//! ```
//!
//! Addresses must start at 0 and increase by one with no gaps.

use crate::cpu::{Cpu, MemoryError, Word, MEMORY_SIZE};
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Parse machine code from a reader.
pub fn load_machine_code<R: BufRead>(reader: R) -> Result<Vec<Word>, LoadError> {
    let mut program = Vec::new();

    for line_result in reader.lines() {
        let line = line_result.map_err(|e| LoadError::IoError(e.to_string()))?;
        let (addr, word) = parse_line(&line).ok_or_else(|| LoadError::ParseError(line.clone()))?;

        if addr != program.len() {
            return Err(LoadError::OutOfSequence(addr));
        }
        if addr >= MEMORY_SIZE {
            return Err(LoadError::TooBig);
        }
        program.push(word);
    }

    log::info!("loaded {} words", program.len());
    Ok(program)
}

/// Load a machine-code file from disk.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, LoadError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|_| LoadError::OpenError(path.as_ref().display().to_string()))?;
    load_machine_code(BufReader::new(file))
}

/// Load a machine-code file into `cpu`'s memory from address 0.
///
/// Returns the loaded words as well, for listing.
pub fn load_into<P: AsRef<Path>>(cpu: &mut Cpu, path: P) -> Result<Vec<Word>, LoadError> {
    let program = load_file(path)?;
    cpu.load_program(&program)?;
    Ok(program)
}

/// Split `ram[<addr>] = 16'b<bits>;<anything>` into address and word.
///
/// Bits beyond the low 16 are dropped.
fn parse_line(line: &str) -> Option<(usize, Word)> {
    let rest = line.strip_prefix("ram[")?;
    let (addr, rest) = rest.split_once(']')?;
    let rest = rest.strip_prefix(" = 16'b")?;
    let (bits, _) = rest.split_once(';')?;

    if addr.is_empty() || !addr.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if bits.is_empty() || !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }

    let addr = addr.parse().ok()?;
    let word = bits
        .bytes()
        .fold(0 as Word, |acc, b| (acc << 1) | Word::from(b - b'0'));
    Some((addr, word))
}

/// Errors that can occur while loading machine code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Can't open file {0}")]
    OpenError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Can't parse line: {0}")]
    ParseError(String),

    #[error("Memory addresses encountered out of sequence: {0}")]
    OutOfSequence(usize),

    #[error("Program too big for memory")]
    TooBig,

    #[error(transparent)]
    Memory(#[from] MemoryError),
}
