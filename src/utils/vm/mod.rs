pub mod insn;
pub mod mem_regions;
pub mod opcodes;
pub mod program;
pub mod version;

// v0-v2 text lives in the rodata region, v3 maps the bytecode at 0
pub use solana_sbpf::ebpf::{
    INSN_SIZE, MM_BYTECODE_START, MM_HEAP_START, MM_INPUT_START, MM_REGION_SIZE, MM_RODATA_START,
    MM_STACK_START,
};

pub const STACK_SIZE: usize = 64 * STACK_GAP_SIZE as usize;
pub const STACK_GAP_SIZE: u64 = 4_096;
