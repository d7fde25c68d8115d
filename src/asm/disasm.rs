//! Disassembler for E20 programs.
//!
//! Converts machine words back to readable assembly.

use crate::cpu::Word;
use crate::cpu::decode::{decode, Instruction};
use std::fmt;

/// Disassemble a single instruction to text.
pub fn disassemble_instruction(word: Word) -> String {
    decode(word).to_string()
}

/// Disassemble a slice of instructions, one per line, prefixed with the address.
pub fn disassemble(words: &[Word]) -> String {
    let mut output = String::new();

    for (addr, &word) in words.iter().enumerate() {
        output.push_str(&format!("{:04}: {:04x}  {}\n", addr, word, decode(word)));
    }

    output
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Add { ra, rb, rc } => write!(f, "add {}, {}, {}", rc, ra, rb),
            Instruction::Sub { ra, rb, rc } => write!(f, "sub {}, {}, {}", rc, ra, rb),
            Instruction::Or { ra, rb, rc } => write!(f, "or {}, {}, {}", rc, ra, rb),
            Instruction::And { ra, rb, rc } => write!(f, "and {}, {}, {}", rc, ra, rb),
            Instruction::Slt { ra, rb, rc } => write!(f, "slt {}, {}, {}", rc, ra, rb),
            Instruction::Jr { ra } => write!(f, "jr {}", ra),

            Instruction::Addi { ra, rb, imm } => write!(f, "addi {}, {}, {}", rb, ra, signed(imm)),
            Instruction::Slti { ra, rb, imm } => write!(f, "slti {}, {}, {}", rb, ra, signed(imm)),
            Instruction::Lw { ra, rb, imm } => write!(f, "lw {}, {}({})", rb, signed(imm), ra),
            Instruction::Sw { ra, rb, imm } => write!(f, "sw {}, {}({})", rb, signed(imm), ra),
            Instruction::Jeq { ra, rb, imm } => write!(f, "jeq {}, {}, {}", ra, rb, signed(imm)),

            // Only the low 13 bits reach the fetch unit
            Instruction::J { target } => write!(f, "j {}", target & 0x1fff),
            Instruction::Jal { target } => write!(f, "jal {}", target & 0x1fff),

            Instruction::Unrecognized(word) => write!(f, ".fill {:#06x}", word),
        }
    }
}

fn signed(imm: Word) -> i16 {
    imm as i16
}
