//! Output formatting: cache configuration, access log, and final state.

use crate::cache::{CacheConfig, CacheEvent, Level};
use crate::cpu::{Cpu, Word, NUM_REGS};
use serde::{Serialize, Deserialize};
use std::fmt;

/// Number of memory cells shown in the final-state dump.
pub const DUMP_WORDS: usize = 128;

/// Describe one cache level.
pub fn cache_config_line(level: Level, config: &CacheConfig) -> String {
    format!(
        "Cache {} has size {}, associativity {}, blocksize {}, rows {}",
        level,
        config.size,
        config.assoc,
        config.blocksize,
        config.rows()
    )
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{} {}", self.level, self.status);
        write!(
            f,
            "{:<8} pc:{:>5}\taddr:{:>5}\trow:{:>4}",
            label, self.pc, self.addr, self.row
        )
    }
}

/// Machine state at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalState {
    pub pc: Word,
    pub registers: [Word; NUM_REGS],
    pub memory: Vec<Word>,
}

impl FinalState {
    /// Snapshot the CPU, keeping the first `words` memory cells.
    pub fn capture(cpu: &Cpu, words: usize) -> Self {
        Self {
            pc: cpu.regs.pc,
            registers: *cpu.regs.all(),
            memory: cpu.mem.dump(words).to_vec(),
        }
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for FinalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final state:")?;
        writeln!(f, "\tpc={:5}", self.pc)?;

        for (i, value) in self.registers.iter().enumerate() {
            writeln!(f, "\t${}={:5}", i, value)?;
        }

        for row in self.memory.chunks(8) {
            for word in row {
                write!(f, "{:04x} ", word)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
