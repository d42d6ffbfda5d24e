//! Instruction word encoding.
//!
//! Layout of one 8-byte word, multi-byte fields little-endian:
//!
//! ```text
//! +--------+----------------+--------+--------+
//! | opcode | src:4 | dst:4  | offset | imm    |
//! | 8 bits | 8 bits         | 16 bit | 32 bit |
//! +--------+----------------+--------+--------+
//! ```

use crate::utils::vm::opcodes::{EXIT, LD_DW_IMM};
use crate::utils::vm::INSN_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Insn {
    pub opc: u8,
    pub dst: u8,
    pub src: u8,
    pub off: i16,
    pub imm: i32,
}

impl Insn {
    pub const fn new(opc: u8, dst: u8, src: u8, off: i16, imm: i32) -> Self {
        Self {
            opc,
            dst,
            src,
            off,
            imm,
        }
    }

    pub const fn exit() -> Self {
        Self::new(EXIT, 0, 0, 0, 0)
    }

    /// Register byte of the word; only the low nibble of each index survives.
    pub const fn regs(&self) -> u8 {
        ((self.src & 0x0f) << 4) | (self.dst & 0x0f)
    }

    pub fn encode(&self) -> [u8; INSN_SIZE] {
        let mut word = [0u8; INSN_SIZE];
        word[0] = self.opc;
        word[1] = self.regs();
        word[2..4].copy_from_slice(&self.off.to_le_bytes());
        word[4..8].copy_from_slice(&self.imm.to_le_bytes());
        word
    }

    /// Reads one word from the start of `bytes`, `None` if fewer than 8 remain.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let word: &[u8; INSN_SIZE] = bytes.get(..INSN_SIZE)?.try_into().ok()?;
        Some(Self {
            opc: word[0],
            dst: word[1] & 0x0f,
            src: word[1] >> 4,
            off: i16::from_le_bytes([word[2], word[3]]),
            imm: i32::from_le_bytes([word[4], word[5], word[6], word[7]]),
        })
    }
}

/// `lddw dst, imm`: the first word carries the low half of the immediate,
/// a zero-opcode continuation word the high half.
pub fn lddw(dst: u8, src: u8, imm: u64) -> [Insn; 2] {
    lddw_with_continuation(dst, src, imm, Insn::default())
}

/// `lddw` whose continuation word starts from `continuation` instead of an
/// all-zero word; only its `imm` is overwritten. Used to probe how strictly a
/// decoder checks the opcode and register fields of the second word.
pub fn lddw_with_continuation(dst: u8, src: u8, imm: u64, continuation: Insn) -> [Insn; 2] {
    [
        Insn::new(LD_DW_IMM, dst, src, 0, imm as u32 as i32),
        Insn {
            imm: (imm >> 32) as u32 as i32,
            ..continuation
        },
    ]
}
