//! Instruction decoder for the E20.
//!
//! Every instruction is a single 16-bit word:
//!
//! ```text
//!  15  13 12  10 9    7 6    4 3     0
//! +------+------+------+------+-------+
//! |  op  |  rA  |  rB  |  rC  | func  |   three-register (op = 0)
//! |  op  |  rA  |  rB  |     imm7     |   two-register + immediate
//! |  op  |            imm13           |   jump
//! +------+----------------------------+
//! ```
//!
//! Decoding is total: any word that does not name a known operation
//! decodes to [`Instruction::Unrecognized`], which executes as a no-op.

use crate::cpu::Word;
use crate::cpu::registers::Reg;
use serde::{Serialize, Deserialize};

/// Raw bit fields of an instruction word, before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    /// Bits 15-13.
    pub opcode: u8,
    /// Bits 12-10.
    pub ra: Reg,
    /// Bits 9-7.
    pub rb: Reg,
    /// Bits 6-4.
    pub rc: Reg,
    /// Bits 3-0, only meaningful when `opcode == 0`.
    pub func: u8,
    /// Bits 6-0, sign-extended to 16 bits.
    pub imm7: Word,
    /// Bits 12-0, sign-extended to 16 bits.
    pub imm13: Word,
}

impl Fields {
    /// Split a word into its fields.
    pub fn from_word(word: Word) -> Self {
        Self {
            opcode: ((word >> 13) & 0b111) as u8,
            ra: Reg::new((word >> 10) as u8),
            rb: Reg::new((word >> 7) as u8),
            rc: Reg::new((word >> 4) as u8),
            func: (word & 0xf) as u8,
            imm7: sign_extend_7(word),
            imm13: sign_extend_13(word),
        }
    }
}

/// Sign-extend the low 7 bits of `raw`.
#[inline]
pub const fn sign_extend_7(raw: Word) -> Word {
    let imm = raw & 0x7f;
    if imm & 0x40 != 0 { imm | 0xff80 } else { imm }
}

/// Sign-extend the low 13 bits of `raw`.
#[inline]
pub const fn sign_extend_13(raw: Word) -> Word {
    let imm = raw & 0x1fff;
    if imm & 0x1000 != 0 { imm | 0xe000 } else { imm }
}

/// Decoded E20 instruction.
///
/// Immediates are stored already sign-extended to 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Three-register ====================

    /// rc := ra + rb
    Add { ra: Reg, rb: Reg, rc: Reg },

    /// rc := ra - rb
    Sub { ra: Reg, rb: Reg, rc: Reg },

    /// rc := ra | rb
    Or { ra: Reg, rb: Reg, rc: Reg },

    /// rc := ra & rb
    And { ra: Reg, rb: Reg, rc: Reg },

    /// rc := ra < rb (unsigned)
    Slt { ra: Reg, rb: Reg, rc: Reg },

    /// pc := ra
    Jr { ra: Reg },

    // ==================== Immediate ====================

    /// rb := ra + imm
    Addi { ra: Reg, rb: Reg, imm: Word },

    /// rb := mem[ra + imm]
    Lw { ra: Reg, rb: Reg, imm: Word },

    /// mem[ra + imm] := rb
    Sw { ra: Reg, rb: Reg, imm: Word },

    /// if ra == rb then pc := pc + 1 + imm
    Jeq { ra: Reg, rb: Reg, imm: Word },

    /// rb := ra < imm (unsigned, against the sign-extended immediate)
    Slti { ra: Reg, rb: Reg, imm: Word },

    // ==================== Jump ====================

    /// pc := target
    J { target: Word },

    /// $7 := pc + 1; pc := target
    Jal { target: Word },

    // ==================== Other ====================

    /// Any word that names no operation. Executes as a no-op.
    Unrecognized(Word),
}

/// Opcode values (bits 15-13).
struct Opcode;

impl Opcode {
    const REG3: u8 = 0;
    const ADDI: u8 = 1;
    const J: u8 = 2;
    const JAL: u8 = 3;
    const LW: u8 = 4;
    const SW: u8 = 5;
    const JEQ: u8 = 6;
    const SLTI: u8 = 7;
}

/// Function codes (bits 3-0) for opcode 0.
struct Func;

impl Func {
    const ADD: u8 = 0;
    const SUB: u8 = 1;
    const OR: u8 = 2;
    const AND: u8 = 3;
    const SLT: u8 = 4;
    const JR: u8 = 8;
}

/// Decode a 16-bit instruction word.
pub fn decode(word: Word) -> Instruction {
    let Fields { opcode, ra, rb, rc, func, imm7, imm13 } = Fields::from_word(word);

    match (opcode, func) {
        (Opcode::REG3, Func::ADD) => Instruction::Add { ra, rb, rc },
        (Opcode::REG3, Func::SUB) => Instruction::Sub { ra, rb, rc },
        (Opcode::REG3, Func::OR) => Instruction::Or { ra, rb, rc },
        (Opcode::REG3, Func::AND) => Instruction::And { ra, rb, rc },
        (Opcode::REG3, Func::SLT) => Instruction::Slt { ra, rb, rc },
        (Opcode::REG3, Func::JR) => Instruction::Jr { ra },
        (Opcode::REG3, _) => Instruction::Unrecognized(word),
        (Opcode::ADDI, _) => Instruction::Addi { ra, rb, imm: imm7 },
        (Opcode::J, _) => Instruction::J { target: imm13 },
        (Opcode::JAL, _) => Instruction::Jal { target: imm13 },
        (Opcode::LW, _) => Instruction::Lw { ra, rb, imm: imm7 },
        (Opcode::SW, _) => Instruction::Sw { ra, rb, imm: imm7 },
        (Opcode::JEQ, _) => Instruction::Jeq { ra, rb, imm: imm7 },
        (Opcode::SLTI, _) => Instruction::Slti { ra, rb, imm: imm7 },
        _ => unreachable!("opcode is masked to 3 bits"),
    }
}

/// Encode an instruction back to a 16-bit word.
///
/// Immediates are truncated to their field width, so `encode(decode(w))`
/// is `w` for every recognized word except that don't-care bits are zeroed.
pub fn encode(instr: &Instruction) -> Word {
    fn reg3(ra: Reg, rb: Reg, rc: Reg, func: u8) -> Word {
        ((ra.index() as Word) << 10) | ((rb.index() as Word) << 7) | ((rc.index() as Word) << 4) | func as Word
    }
    fn imm7(opcode: u8, ra: Reg, rb: Reg, imm: Word) -> Word {
        ((opcode as Word) << 13) | ((ra.index() as Word) << 10) | ((rb.index() as Word) << 7) | (imm & 0x7f)
    }
    fn imm13(opcode: u8, target: Word) -> Word {
        ((opcode as Word) << 13) | (target & 0x1fff)
    }

    match *instr {
        Instruction::Add { ra, rb, rc } => reg3(ra, rb, rc, Func::ADD),
        Instruction::Sub { ra, rb, rc } => reg3(ra, rb, rc, Func::SUB),
        Instruction::Or { ra, rb, rc } => reg3(ra, rb, rc, Func::OR),
        Instruction::And { ra, rb, rc } => reg3(ra, rb, rc, Func::AND),
        Instruction::Slt { ra, rb, rc } => reg3(ra, rb, rc, Func::SLT),
        Instruction::Jr { ra } => reg3(ra, Reg::new(0), Reg::new(0), Func::JR),
        Instruction::Addi { ra, rb, imm } => imm7(Opcode::ADDI, ra, rb, imm),
        Instruction::Lw { ra, rb, imm } => imm7(Opcode::LW, ra, rb, imm),
        Instruction::Sw { ra, rb, imm } => imm7(Opcode::SW, ra, rb, imm),
        Instruction::Jeq { ra, rb, imm } => imm7(Opcode::JEQ, ra, rb, imm),
        Instruction::Slti { ra, rb, imm } => imm7(Opcode::SLTI, ra, rb, imm),
        Instruction::J { target } => imm13(Opcode::J, target),
        Instruction::Jal { target } => imm13(Opcode::JAL, target),
        Instruction::Unrecognized(word) => word,
    }
}
