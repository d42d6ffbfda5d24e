use crate::utils::vm::opcodes::{EXIT, RETURN};
use crate::Error;
use std::fmt;

/// SBPF instruction-set versions a target can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SbpfVersion {
    V0,
    V1,
    V2,
    V3,
}

impl SbpfVersion {
    pub const ALL: [SbpfVersion; 4] = [
        SbpfVersion::V0,
        SbpfVersion::V1,
        SbpfVersion::V2,
        SbpfVersion::V3,
    ];

    pub const fn as_u64(self) -> u64 {
        self as u64
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /* SIMD-0166 */
    pub fn dynamic_stack_frames(self) -> bool {
        self >= SbpfVersion::V1
    }

    /* SIMD-0174 */
    pub fn enable_pqr(self) -> bool {
        self >= SbpfVersion::V2
    }

    pub fn disable_neg(self) -> bool {
        self >= SbpfVersion::V2
    }

    /* SIMD-0173 */
    pub fn disable_lddw(self) -> bool {
        self >= SbpfVersion::V2
    }

    pub fn disable_le(self) -> bool {
        self >= SbpfVersion::V2
    }

    pub fn move_memory_instruction_classes(self) -> bool {
        self >= SbpfVersion::V2
    }

    pub fn callx_uses_src_reg(self) -> bool {
        self >= SbpfVersion::V2
    }

    /* SIMD-0178 */
    pub fn static_syscalls(self) -> bool {
        self >= SbpfVersion::V3
    }

    /// Opcode that ends a program: `exit` until static syscalls take over 0x95.
    pub fn terminator(self) -> u8 {
        if self.static_syscalls() {
            RETURN
        } else {
            EXIT
        }
    }
}

impl TryFrom<u64> for SbpfVersion {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SbpfVersion::V0),
            1 => Ok(SbpfVersion::V1),
            2 => Ok(SbpfVersion::V2),
            3 => Ok(SbpfVersion::V3),
            _ => Err(Error::UnsupportedVersion(value)),
        }
    }
}

impl fmt::Display for SbpfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u64())
    }
}
