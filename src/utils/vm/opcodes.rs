//! Classification of every opcode byte, per SBPF version.
//!
//! The table is built from explicit opcode lists, one claim per
//! (opcode, version range). Any slot no list claims is rejected by the
//! decoder of that version and is recorded as [`OpcodeClass::Invalid`].
//! Two lists claiming the same slot is a construction error.

use crate::utils::vm::version::SbpfVersion;
use crate::Error;
use std::collections::BTreeSet;

pub const LD_DW_IMM: u8 = 0x18;

// v0-v1 memory classes
pub const LD_B_REG: u8 = 0x71;
pub const LD_H_REG: u8 = 0x69;
pub const LD_W_REG: u8 = 0x61;
pub const LD_DW_REG: u8 = 0x79;
pub const ST_B_IMM: u8 = 0x72;
pub const ST_H_IMM: u8 = 0x6a;
pub const ST_W_IMM: u8 = 0x62;
pub const ST_DW_IMM: u8 = 0x7a;
pub const ST_B_REG: u8 = 0x73;
pub const ST_H_REG: u8 = 0x6b;
pub const ST_W_REG: u8 = 0x63;
pub const ST_DW_REG: u8 = 0x7b;

// v2+ memory classes
pub const LD_1B_REG: u8 = 0x2c;
pub const LD_2B_REG: u8 = 0x3c;
pub const LD_4B_REG: u8 = 0x8c;
pub const LD_8B_REG: u8 = 0x9c;
pub const ST_1B_IMM: u8 = 0x27;
pub const ST_2B_IMM: u8 = 0x37;
pub const ST_4B_IMM: u8 = 0x87;
pub const ST_8B_IMM: u8 = 0x97;
pub const ST_1B_REG: u8 = 0x2f;
pub const ST_2B_REG: u8 = 0x3f;
pub const ST_4B_REG: u8 = 0x8f;
pub const ST_8B_REG: u8 = 0x9f;

pub const ADD64_IMM: u8 = 0x07;
pub const MOV64_IMM: u8 = 0xb7;
pub const NEG32: u8 = 0x84;
pub const NEG64: u8 = 0x87;
pub const LE: u8 = 0xd4;
pub const BE: u8 = 0xdc;
pub const HOR64_IMM: u8 = 0xf7;

pub const JA: u8 = 0x05;
pub const CALL_IMM: u8 = 0x85;
pub const CALL_REG: u8 = 0x8d;
pub const EXIT: u8 = 0x95;
pub const SYSCALL: u8 = 0x95;
pub const RETURN: u8 = 0x9d;

const ALU32: &[u8] = &[
    0x04, 0x0c, 0x14, 0x1c, 0x44, 0x4c, 0x54, 0x5c, 0x64, 0x6c, 0x74, 0x7c, 0xa4, 0xac, 0xb4,
    0xbc, 0xc4, 0xcc, BE,
];
const ALU64: &[u8] = &[
    0x07, 0x0f, 0x17, 0x1f, 0x47, 0x4f, 0x57, 0x5f, 0x67, 0x6f, 0x77, 0x7f, 0xa7, 0xaf, 0xb7,
    0xbf, 0xc7, 0xcf,
];
/* mul, div, mod; moved to the PQR class by SIMD-0174 */
const MULDIVMOD: &[u8] = &[
    0x24, 0x2c, 0x34, 0x3c, 0x94, 0x9c, 0x27, 0x2f, 0x37, 0x3f, 0x97, 0x9f,
];
const PQR: &[u8] = &[
    0x36, 0x3e, 0x46, 0x4e, 0x56, 0x5e, 0x66, 0x6e, 0x76, 0x7e, 0x86, 0x8e, 0x96, 0x9e, 0xb6,
    0xbe, 0xc6, 0xce, 0xd6, 0xde, 0xe6, 0xee, 0xf6, 0xfe,
];
const JMP: &[u8] = &[
    JA, 0x15, 0x1d, 0x25, 0x2d, 0x35, 0x3d, 0x45, 0x4d, 0x55, 0x5d, 0x65, 0x6d, 0x75, 0x7d, 0xa5,
    0xad, 0xb5, 0xbd, 0xc5, 0xcd, 0xd5, 0xdd,
];

const LEGACY_MEMORY: &[(u8, MemoryAccess)] = &[
    (LD_B_REG, MemoryAccess::load(AccessWidth::Byte)),
    (LD_H_REG, MemoryAccess::load(AccessWidth::Half)),
    (LD_W_REG, MemoryAccess::load(AccessWidth::Word)),
    (LD_DW_REG, MemoryAccess::load(AccessWidth::DoubleWord)),
    (ST_B_IMM, MemoryAccess::store_imm(AccessWidth::Byte)),
    (ST_H_IMM, MemoryAccess::store_imm(AccessWidth::Half)),
    (ST_W_IMM, MemoryAccess::store_imm(AccessWidth::Word)),
    (ST_DW_IMM, MemoryAccess::store_imm(AccessWidth::DoubleWord)),
    (ST_B_REG, MemoryAccess::store_reg(AccessWidth::Byte)),
    (ST_H_REG, MemoryAccess::store_reg(AccessWidth::Half)),
    (ST_W_REG, MemoryAccess::store_reg(AccessWidth::Word)),
    (ST_DW_REG, MemoryAccess::store_reg(AccessWidth::DoubleWord)),
];

const MOVED_MEMORY: &[(u8, MemoryAccess)] = &[
    (LD_1B_REG, MemoryAccess::load(AccessWidth::Byte)),
    (LD_2B_REG, MemoryAccess::load(AccessWidth::Half)),
    (LD_4B_REG, MemoryAccess::load(AccessWidth::Word)),
    (LD_8B_REG, MemoryAccess::load(AccessWidth::DoubleWord)),
    (ST_1B_IMM, MemoryAccess::store_imm(AccessWidth::Byte)),
    (ST_2B_IMM, MemoryAccess::store_imm(AccessWidth::Half)),
    (ST_4B_IMM, MemoryAccess::store_imm(AccessWidth::Word)),
    (ST_8B_IMM, MemoryAccess::store_imm(AccessWidth::DoubleWord)),
    (ST_1B_REG, MemoryAccess::store_reg(AccessWidth::Byte)),
    (ST_2B_REG, MemoryAccess::store_reg(AccessWidth::Half)),
    (ST_4B_REG, MemoryAccess::store_reg(AccessWidth::Word)),
    (ST_8B_REG, MemoryAccess::store_reg(AccessWidth::DoubleWord)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessWidth {
    Byte,
    Half,
    Word,
    DoubleWord,
}

impl AccessWidth {
    pub const ALL: [AccessWidth; 4] = [
        AccessWidth::Byte,
        AccessWidth::Half,
        AccessWidth::Word,
        AccessWidth::DoubleWord,
    ];

    pub const fn bytes(self) -> u64 {
        match self {
            AccessWidth::Byte => 1,
            AccessWidth::Half => 2,
            AccessWidth::Word => 4,
            AccessWidth::DoubleWord => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessKind {
    /// `dst = *(src + off)`
    Load,
    /// `*(dst + off) = imm`
    StoreImm,
    /// `*(dst + off) = src`
    StoreReg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryAccess {
    pub kind: AccessKind,
    pub width: AccessWidth,
}

impl MemoryAccess {
    const fn load(width: AccessWidth) -> Self {
        Self {
            kind: AccessKind::Load,
            width,
        }
    }

    const fn store_imm(width: AccessWidth) -> Self {
        Self {
            kind: AccessKind::StoreImm,
            width,
        }
    }

    const fn store_reg(width: AccessWidth) -> Self {
        Self {
            kind: AccessKind::StoreReg,
            width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpcodeClass {
    Invalid,
    /// ALU and jump instructions, plus `exit`/`return`
    Generic,
    LoadStore(MemoryAccess),
    /// Internal call with a pc-relative immediate (static syscalls)
    Call,
    CallIndirect,
    /// `call imm` resolved against the syscall registry before the
    /// function registry
    SyscallV0toV2,
    /// `syscall imm`, which takes over the v0-v2 exit opcode
    SyscallV3,
    /// `lddw`, followed by a continuation word
    ExplicitMultiword,
}

pub struct OpcodeTable {
    classes: [[Option<OpcodeClass>; 4]; 256],
}

impl OpcodeTable {
    /// A table with every slot unclassified.
    pub fn empty() -> Self {
        Self {
            classes: [[None; 4]; 256],
        }
    }

    /// Classification of the full SBPF instruction set across v0-v3.
    pub fn sbpf() -> Result<Self, Error> {
        let mut table = Self::empty();
        for version in SbpfVersion::ALL {
            table.claim_all(ALU32, version, OpcodeClass::Generic)?;
            table.claim_all(ALU64, version, OpcodeClass::Generic)?;
            table.claim_all(JMP, version, OpcodeClass::Generic)?;
            table.claim(CALL_REG, version, OpcodeClass::CallIndirect)?;

            if version.enable_pqr() {
                table.claim_all(PQR, version, OpcodeClass::Generic)?;
                table.claim(HOR64_IMM, version, OpcodeClass::Generic)?;
            } else {
                table.claim_all(MULDIVMOD, version, OpcodeClass::Generic)?;
            }
            if !version.disable_neg() {
                table.claim(NEG32, version, OpcodeClass::Generic)?;
                table.claim(NEG64, version, OpcodeClass::Generic)?;
            }
            if !version.disable_le() {
                table.claim(LE, version, OpcodeClass::Generic)?;
            }
            if !version.disable_lddw() {
                table.claim(LD_DW_IMM, version, OpcodeClass::ExplicitMultiword)?;
            }

            let memory = if version.move_memory_instruction_classes() {
                MOVED_MEMORY
            } else {
                LEGACY_MEMORY
            };
            for (opcode, access) in memory {
                table.claim(*opcode, version, OpcodeClass::LoadStore(*access))?;
            }

            if version.static_syscalls() {
                table.claim(CALL_IMM, version, OpcodeClass::Call)?;
                table.claim(SYSCALL, version, OpcodeClass::SyscallV3)?;
                table.claim(RETURN, version, OpcodeClass::Generic)?;
            } else {
                table.claim(CALL_IMM, version, OpcodeClass::SyscallV0toV2)?;
                table.claim(EXIT, version, OpcodeClass::Generic)?;
            }
        }
        table.reject_unclaimed();
        Ok(table)
    }

    fn claim(&mut self, opcode: u8, version: SbpfVersion, class: OpcodeClass) -> Result<(), Error> {
        let slot = &mut self.classes[opcode as usize][version.index()];
        if slot.is_some() {
            return Err(Error::ConflictingClassification { opcode, version });
        }
        *slot = Some(class);
        Ok(())
    }

    fn claim_all(
        &mut self,
        opcodes: &[u8],
        version: SbpfVersion,
        class: OpcodeClass,
    ) -> Result<(), Error> {
        opcodes
            .iter()
            .try_for_each(|opcode| self.claim(*opcode, version, class))
    }

    fn reject_unclaimed(&mut self) {
        for slot in self.classes.iter_mut().flatten() {
            if slot.is_none() {
                *slot = Some(OpcodeClass::Invalid);
            }
        }
    }

    pub fn classify(&self, opcode: u8, version: SbpfVersion) -> Result<OpcodeClass, Error> {
        self.classes[opcode as usize][version.index()]
            .ok_or(Error::UnclassifiedOpcode { opcode, version })
    }

    /// Distinct classes an opcode takes across `versions`, in a stable order.
    pub fn classes_across(
        &self,
        opcode: u8,
        versions: &[SbpfVersion],
    ) -> Result<BTreeSet<OpcodeClass>, Error> {
        versions
            .iter()
            .map(|version| self.classify(opcode, *version))
            .collect()
    }

    /// True iff every version rejects the opcode.
    pub fn is_invalid_everywhere(&self, opcode: u8) -> Result<bool, Error> {
        Ok(self
            .classes_across(opcode, &SbpfVersion::ALL)?
            .iter()
            .all(|class| *class == OpcodeClass::Invalid))
    }

    /// Opcode byte `version` expects where a v0-v2 program has `opcode`.
    pub fn remap(opcode: u8, version: SbpfVersion) -> u8 {
        if opcode == EXIT {
            version.terminator()
        } else {
            opcode
        }
    }
}

/// Branches with a pc-relative offset. `call`, `callx`, `exit` and `return`
/// share the jump class bits but not the offset semantics.
pub fn is_jump(opcode: u8) -> bool {
    JMP.contains(&opcode)
}
