//! CPU execution engine for the E20.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! Every load and store is reported to a [`MemoryObserver`], which lets a
//! cache model watch the address stream without touching machine state.

use crate::cpu::{Memory, Registers, Word};
use crate::cpu::decode::{self, Instruction};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::LINK_REG;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed a jump to itself).
    Halted,
}

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    /// `lw`
    Read,
    /// `sw`
    Write,
}

/// A single data-memory access issued by `lw` or `sw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccess {
    /// Program counter of the instruction performing the access.
    pub pc: Word,
    /// Cell address, already reduced modulo 8192.
    pub addr: Word,
    /// Load or store.
    pub kind: AccessKind,
}

impl MemoryAccess {
    /// Whether this access is a store.
    pub fn is_write(&self) -> bool {
        self.kind == AccessKind::Write
    }
}

/// Receives every data-memory access the CPU performs.
pub trait MemoryObserver {
    /// Called once per `lw`/`sw`, after the access has been performed.
    fn observe(&mut self, access: MemoryAccess);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl MemoryObserver for NullObserver {
    fn observe(&mut self, _access: MemoryAccess) {}
}

impl<F: FnMut(MemoryAccess)> MemoryObserver for F {
    fn observe(&mut self, access: MemoryAccess) {
        self(access)
    }
}

/// The E20 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
        }
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error if the CPU
    /// has already halted.
    pub fn step<O: MemoryObserver + ?Sized>(&mut self, observer: &mut O) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.pc;
        let raw = self.mem.read(self.regs.fetch_addr());

        // Decode
        let instr = decode::decode(raw);
        log::trace!("{:5}: {:04x}  {}", pc, raw, instr);

        // Execute
        self.execute(instr, observer);
        self.regs.clear_zero();

        // Update state
        self.cycles += 1;

        if self.state == CpuState::Halted {
            log::info!("halted at pc={} after {} instructions", self.regs.pc, self.cycles);
        }

        Ok(instr)
    }

    /// Run until halt.
    ///
    /// There is no step limit: a program that loops without ever jumping
    /// to itself never returns.
    ///
    /// Returns the number of instructions executed.
    pub fn run<O: MemoryObserver + ?Sized>(&mut self, observer: &mut O) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(observer)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<O: MemoryObserver + ?Sized>(&mut self, observer: &mut O, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(observer)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute<O: MemoryObserver + ?Sized>(&mut self, instr: Instruction, observer: &mut O) {
        let pc = self.regs.pc;

        match instr {
            // ==================== Three-register ====================

            Instruction::Add { ra, rb, rc } => {
                let result = self.regs.get(ra).wrapping_add(self.regs.get(rb));
                self.regs.set(rc, result);
                self.regs.advance_pc();
            }

            Instruction::Sub { ra, rb, rc } => {
                let result = self.regs.get(ra).wrapping_sub(self.regs.get(rb));
                self.regs.set(rc, result);
                self.regs.advance_pc();
            }

            Instruction::Or { ra, rb, rc } => {
                let result = self.regs.get(ra) | self.regs.get(rb);
                self.regs.set(rc, result);
                self.regs.advance_pc();
            }

            Instruction::And { ra, rb, rc } => {
                let result = self.regs.get(ra) & self.regs.get(rb);
                self.regs.set(rc, result);
                self.regs.advance_pc();
            }

            Instruction::Slt { ra, rb, rc } => {
                let less = self.regs.get(ra) < self.regs.get(rb);
                self.regs.set(rc, Word::from(less));
                self.regs.advance_pc();
            }

            Instruction::Jr { ra } => {
                let target = self.regs.get(ra);
                self.jump(target, pc == target);
            }

            // ==================== Immediate ====================

            Instruction::Addi { ra, rb, imm } => {
                let result = self.regs.get(ra).wrapping_add(imm);
                self.regs.set(rb, result);
                self.regs.advance_pc();
            }

            Instruction::Lw { ra, rb, imm } => {
                let addr = self.regs.effective_address(ra, imm);
                let value = self.mem.read(addr);
                self.regs.set(rb, value);
                observer.observe(MemoryAccess { pc, addr, kind: AccessKind::Read });
                self.regs.advance_pc();
            }

            Instruction::Sw { ra, rb, imm } => {
                let addr = self.regs.effective_address(ra, imm);
                self.mem.write(addr, self.regs.get(rb));
                observer.observe(MemoryAccess { pc, addr, kind: AccessKind::Write });
                self.regs.advance_pc();
            }

            Instruction::Jeq { ra, rb, imm } => {
                if self.regs.get(ra) == self.regs.get(rb) {
                    self.regs.jump(pc.wrapping_add(1).wrapping_add(imm));
                } else {
                    self.regs.advance_pc();
                }
            }

            Instruction::Slti { ra, rb, imm } => {
                let less = self.regs.get(ra) < imm;
                self.regs.set(rb, Word::from(less));
                self.regs.advance_pc();
            }

            // ==================== Jump ====================

            Instruction::J { target } => {
                // Compared against the fetch address, not the raw pc
                self.jump(target, Memory::wrap(pc) == target);
            }

            Instruction::Jal { target } => {
                self.regs.set(LINK_REG, pc.wrapping_add(1));
                self.jump(target, pc == target);
            }

            // ==================== Other ====================

            Instruction::Unrecognized(_) => {
                // No effect, not even on the program counter
            }
        }
    }

    /// Transfer control. A jump to the current instruction halts the CPU.
    fn jump(&mut self, target: Word, to_self: bool) {
        if to_self {
            self.state = CpuState::Halted;
        }
        self.regs.jump(target);
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),
}
