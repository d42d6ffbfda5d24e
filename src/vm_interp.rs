//! Interpreter test-case generation.
//!
//! Every opcode byte is expanded into a deterministic list of
//! [`VmTestCase`]s. The operand domains below are literal tables: the corpus
//! is content-hashed and checked in, so two runs must produce identical bytes.

use crate::proto::InputDataRegion;
use crate::utils::vm::insn::{lddw, lddw_with_continuation, Insn};
use crate::utils::vm::mem_regions::{boundary_addresses, memory_layout, setup_input_regions};
use crate::utils::vm::opcodes::{
    is_jump, AccessKind, MemoryAccess, OpcodeClass, OpcodeTable, ADD64_IMM, CALL_IMM, JA,
    LD_DW_IMM, MOV64_IMM, SYSCALL,
};
use crate::utils::vm::program::{Program, ProgramBuilder, ProgramForm};
use crate::utils::vm::version::SbpfVersion;
use crate::utils::vm::{MM_BYTECODE_START, MM_HEAP_START, MM_RODATA_START, MM_STACK_START};
use crate::utils::{pchash, symbol_hash};
use crate::vm_fixtures::check_coverage;
use crate::vm_project::{project, TestVector};
use crate::Error;
use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

pub const DEFAULT_CU_AVAIL: u64 = 100;
pub const SYSCALL_CU_AVAIL: u64 = 10_000;
pub const DEFAULT_HEAP_MAX: u64 = 0x8000;

const PREFIX_LEN: usize = 64;
const INPUT_REGION_LEN: usize = 0x40;

/// Initial values of r0..=r9. r1 is owned by the target (it points r1 at the
/// input region), so its slot stays 0 and is not serialized.
pub type RegisterFile = [u64; 10];

pub const REGISTER_PRESET: RegisterFile = [
    0x0000_0000_0000_0000,
    0x0000_0000_0000_0000,
    0xFFFF_FFFF_FFFF_FFFF,
    0x0000_0000_7FFF_FFFF,
    0x0000_0000_8000_0000,
    0x0000_0001_0000_0000,
    0x8000_0000_0000_0000,
    0x7FFF_FFFF_FFFF_FFFF,
    0x0000_0000_0000_0020,
    0x1234_5678_9ABC_DEF0,
];

/* Generic operand domain. Registers straddle the nibble boundaries of the
register byte and include the reserved r10/r11. */
const SRC_REGS: [u8; 6] = [0, 2, 6, 9, 10, 11];
const DST_REGS: [u8; 4] = [0, 9, 10, 11];
const IMMEDIATES: [u32; 12] = [
    0x0000_0000,
    0x0000_0002,
    0x0000_000A,
    0x0000_0010,
    0x0000_0020,
    0x0000_0039,
    0x0000_0040,
    0x0000_0041,
    0x1234_5678,
    0x7FFF_FFFF,
    0x8000_0000,
    0xFFFF_FFFF,
];

const JUMP_OFFSETS: [u16; 6] = [0x0001, 0x0002, 0x7FFF, 0xFFFF, 0xFFFE, 0x8000];
const JUMP_IMMEDIATES: [u32; 2] = [0x0000_0000, 0xFFFF_FFFF];

/* Memory operand domain */
const OFFSETS: [u16; 7] = [0x0000, 0x0001, 0x0008, 0x00FF, 0x01FF, 0xFFF8, 0xFFFF];
// one frame below r10, and one byte past that
const FRAME_OFFSETS: [u16; 2] = [0xF000, 0xEFFF];
const BASE_REG: u8 = 2;
const VALUE_REG: u8 = 3;
const STORE_IMM: u32 = 0x8765_4321;
const SCRATCH_ADDR: u64 = MM_HEAP_START + 0x10;

const WIDE_IMMEDIATES: [u64; 7] = [
    0x0000_0000_0000_0000,
    0x0000_0000_0000_0001,
    0x0000_0000_FFFF_FFFF,
    0x0000_0001_0000_0000,
    0x8000_0000_0000_0000,
    0xFFFF_FFFF_FFFF_FFFF,
    0x1234_5678_9ABC_DEF0,
];
const WIDE_SRC_REGS: [u8; 2] = [0, 2];
/* (dst, src) of a continuation word that should be all zero */
const CONTINUATION_REGS: [(u8, u8); 4] = [(1, 0), (0, 1), (15, 15), (9, 2)];
const CONTINUATION_OPCODES: [u8; 3] = [LD_DW_IMM, ADD64_IMM, 0xFF];

/* Call programs are `call; exit; exit` with pcs 0 and 2 registered as
function starts. */
const CALLEE_PC: u64 = 2;
const CALL_WHITELIST: [u8; 1] = [0b0000_0101];
const CALL_SRC_REGS: [u8; 2] = [0, 1];
const TARGET_REG: u8 = 2;

const CALLX_TARGETS: [u64; 14] = [
    MM_RODATA_START + 16,
    MM_BYTECODE_START + 16,
    MM_RODATA_START + 8,
    MM_RODATA_START + 24,
    MM_RODATA_START + 0x1000,
    MM_RODATA_START - 8,
    MM_RODATA_START + 17,
    MM_RODATA_START + 25,
    MM_STACK_START,
    MM_HEAP_START + 16,
    MM_STACK_START + 3,
    0,
    u64::MAX - 7,
    u64::MAX,
];

const SYSCALL_NAMES: [&[u8]; 7] = [
    b"abort",
    b"sol_panic_",
    b"sol_log_",
    b"sol_log_64_",
    b"sol_memcpy_",
    b"sol_alloc_free_",
    b"sol_not_a_syscall_",
];

lazy_static! {
    static ref SYSCALL_IDS: Vec<u32> = SYSCALL_NAMES
        .iter()
        .map(|name| symbol_hash(name))
        .chain([0, u32::MAX])
        .collect();

    /* Immediates of `call imm`: the registered callee by hash and by relative
    offset, an unregistered pc, a pc past the program, the entrypoint alias
    every loader accepts, a syscall key, and offsets that wrap. */
    static ref CALL_IMMEDIATES: Vec<u32> = vec![
        pchash(CALLEE_PC),
        (CALLEE_PC - 1) as u32,
        pchash(1),
        pchash(0x100),
        symbol_hash(b"entrypoint"),
        symbol_hash(b"sol_log_"),
        0xFFFF_FFFF,
        0xFFFF_FFFE,
        0x7FFF_FFFF,
        0x8000_0000,
        0x0000_0000,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaseFamily {
    InvalidOpcode,
    Operands,
    JumpOffset,
    MemoryBoundary,
    FramePointer,
    RegisterEncoding,
    CallTarget,
    SyscallId,
    CallIndirectTarget,
    WideImmediate,
    /// lddw whose continuation word carries non-zero registers. Targets must
    /// agree on whether that word is rejected.
    ContinuationRegisters,
    ContinuationOpcode,
    IncompleteWide,
    JumpIntoWide,
    /// Programs whose length is not a multiple of 8, or that are empty
    ProgramLength,
    ComputeBudget,
}

impl CaseFamily {
    pub fn tag(self) -> &'static str {
        match self {
            CaseFamily::InvalidOpcode => "invalid",
            CaseFamily::Operands => "operands",
            CaseFamily::JumpOffset => "jump_offset",
            CaseFamily::MemoryBoundary => "mem_boundary",
            CaseFamily::FramePointer => "frame_pointer",
            CaseFamily::RegisterEncoding => "reg_encoding",
            CaseFamily::CallTarget => "call_target",
            CaseFamily::SyscallId => "syscall_id",
            CaseFamily::CallIndirectTarget => "callx_target",
            CaseFamily::WideImmediate => "lddw_imm",
            CaseFamily::ContinuationRegisters => "lddw_cont_regs",
            CaseFamily::ContinuationOpcode => "lddw_cont_opcode",
            CaseFamily::IncompleteWide => "lddw_incomplete",
            CaseFamily::JumpIntoWide => "lddw_jump_into",
            CaseFamily::ProgramLength => "program_len",
            CaseFamily::ComputeBudget => "cu",
        }
    }

    /// Families allowed to emit programs whose length is not a multiple of 8.
    pub fn is_malformed_length(self) -> bool {
        matches!(self, CaseFamily::ProgramLength)
    }
}

/// Memory contents shared by the stack, heap and input regions of a case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryPresets {
    pub stack_prefix: Vec<u8>,
    pub heap_prefix: Vec<u8>,
    pub heap_max: u64,
    /// (content, is_writable), mapped back to back from the input start
    pub input_regions: Vec<(Vec<u8>, bool)>,
}

impl Default for MemoryPresets {
    fn default() -> Self {
        let counting = |seed: u8, len: usize| -> Vec<u8> {
            (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
        };
        Self {
            stack_prefix: counting(0x00, PREFIX_LEN),
            heap_prefix: counting(0x80, PREFIX_LEN),
            heap_max: DEFAULT_HEAP_MAX,
            input_regions: vec![
                (counting(0x40, INPUT_REGION_LEN), true),
                (counting(0xC0, INPUT_REGION_LEN), false),
            ],
        }
    }
}

impl MemoryPresets {
    pub fn input_data_regions(&self) -> Vec<InputDataRegion> {
        setup_input_regions(&self.input_regions)
    }
}

/// One version-independent test case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VmTestCase {
    pub opcode: u8,
    pub family: CaseFamily,
    /// Position among the cases of the same opcode and family
    pub index: usize,
    pub program: Program,
    pub registers: RegisterFile,
    pub memory: MemoryPresets,
    pub cu_avail: u64,
    pub call_whitelist: Vec<u8>,
    pub entry_pc: u64,
}

impl VmTestCase {
    fn new(opcode: u8, family: CaseFamily, program: Program) -> Self {
        Self {
            opcode,
            family,
            index: 0,
            program,
            registers: REGISTER_PRESET,
            memory: MemoryPresets::default(),
            cu_avail: DEFAULT_CU_AVAIL,
            call_whitelist: Vec::new(),
            entry_pc: 0,
        }
    }

    fn with_register(mut self, reg: u8, value: u64) -> Self {
        if let Some(slot) = self.registers.get_mut(reg as usize) {
            *slot = value;
        }
        self
    }

    fn with_cu_avail(mut self, cu_avail: u64) -> Self {
        self.cu_avail = cu_avail;
        self
    }

    fn with_call_whitelist(mut self) -> Self {
        self.call_whitelist = CALL_WHITELIST.to_vec();
        self
    }

    pub fn id(&self) -> String {
        format!("{:02x}_{}_{}", self.opcode, self.family.tag(), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub versions: Vec<SbpfVersion>,
    pub opcodes: Vec<u8>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            versions: SbpfVersion::ALL.to_vec(),
            opcodes: (0..=u8::MAX).collect(),
        }
    }
}

/// Collects the cases of one opcode, dropping exact duplicates and numbering
/// the rest per family.
#[derive(Default)]
struct CaseSink {
    seen: HashSet<VmTestCase>,
    counters: HashMap<CaseFamily, usize>,
    cases: Vec<VmTestCase>,
    duplicates: usize,
}

impl CaseSink {
    fn push(&mut self, case: VmTestCase) {
        if !self.seen.insert(case.clone()) {
            self.duplicates += 1;
            return;
        }
        let counter = self.counters.entry(case.family).or_default();
        self.cases.push(VmTestCase {
            index: *counter,
            ..case
        });
        *counter += 1;
    }

    fn finish(self) -> (Vec<VmTestCase>, usize) {
        (self.cases, self.duplicates)
    }
}

fn legacy(insns: impl IntoIterator<Item = Insn>) -> Program {
    ProgramBuilder::new()
        .insns(insns)
        .assemble(ProgramForm::Legacy)
}

fn invalid_case(opcode: u8) -> VmTestCase {
    VmTestCase::new(
        opcode,
        CaseFamily::InvalidOpcode,
        legacy([Insn::new(opcode, 0, 0, 0, 0)]),
    )
}

fn operand_cases(opcode: u8, sink: &mut CaseSink) {
    for src in SRC_REGS {
        for dst in DST_REGS {
            for imm in IMMEDIATES {
                let program = legacy([Insn::new(opcode, dst, src, 0, imm as i32)]);
                sink.push(VmTestCase::new(opcode, CaseFamily::Operands, program));
            }
        }
    }
}

fn jump_offset_cases(opcode: u8, sink: &mut CaseSink) {
    for off in JUMP_OFFSETS {
        for imm in JUMP_IMMEDIATES {
            let program = legacy([
                Insn::new(opcode, 9, 2, off as i16, imm as i32),
                Insn::exit(),
            ]);
            sink.push(VmTestCase::new(opcode, CaseFamily::JumpOffset, program));
        }
    }
}

fn memory_insn(opcode: u8, access: MemoryAccess, base: u8, off: u16) -> Insn {
    let off = off as i16;
    match access.kind {
        AccessKind::Load => Insn::new(opcode, 0, base, off, 0),
        AccessKind::StoreImm => Insn::new(opcode, base, 0, off, STORE_IMM as i32),
        AccessKind::StoreReg => Insn::new(opcode, base, VALUE_REG, off, 0),
    }
}

fn memory_boundary_cases(opcode: u8, access: MemoryAccess, sink: &mut CaseSink) {
    let memory = MemoryPresets::default();
    for off in OFFSETS {
        let program = legacy([memory_insn(opcode, access, BASE_REG, off)]);
        let layout = memory_layout(
            program.len() as u64,
            memory.heap_max,
            &memory.input_data_regions(),
        );
        for addr in boundary_addresses(&layout, access.width) {
            sink.push(
                VmTestCase::new(opcode, CaseFamily::MemoryBoundary, program.clone())
                    .with_register(BASE_REG, addr),
            );
        }
    }
}

fn frame_pointer_cases(opcode: u8, access: MemoryAccess, sink: &mut CaseSink) {
    for off in OFFSETS.iter().chain(FRAME_OFFSETS.iter()) {
        let program = legacy([memory_insn(opcode, access, 10, *off)]);
        sink.push(VmTestCase::new(opcode, CaseFamily::FramePointer, program));
    }
}

fn register_encoding_cases(opcode: u8, access: MemoryAccess, sink: &mut CaseSink) {
    let imm = match access.kind {
        AccessKind::StoreImm => STORE_IMM as i32,
        _ => 0,
    };
    for src in SRC_REGS {
        for dst in DST_REGS {
            let program = legacy([Insn::new(opcode, dst, src, 0, imm)]);
            let case = SRC_REGS
                .iter()
                .chain(DST_REGS.iter())
                .fold(
                    VmTestCase::new(opcode, CaseFamily::RegisterEncoding, program),
                    |case, reg| case.with_register(*reg, SCRATCH_ADDR),
                );
            sink.push(case);
        }
    }
}

fn call_target_cases(sink: &mut CaseSink) {
    for src in CALL_SRC_REGS {
        for imm in CALL_IMMEDIATES.iter() {
            let program = legacy([
                Insn::new(CALL_IMM, 0, src, 0, *imm as i32),
                Insn::exit(),
            ]);
            sink.push(
                VmTestCase::new(CALL_IMM, CaseFamily::CallTarget, program).with_call_whitelist(),
            );
        }
    }
}

/* v0-v2 dispatch syscalls through `call imm`; v3 through the opcode that used
to be `exit`, in a program that ends in `return`. */
fn syscall_id_cases(opcode: u8, form: ProgramForm, sink: &mut CaseSink) {
    let regs: &[(u8, u8)] = match form {
        ProgramForm::Legacy => &[(0, 0), (0, 1)],
        ProgramForm::Static => &[(0, 0), (9, 2)],
    };
    for (dst, src) in regs {
        for id in SYSCALL_IDS.iter() {
            let program = ProgramBuilder::new()
                .insn(Insn::new(opcode, *dst, *src, 0, *id as i32))
                .assemble(form);
            sink.push(
                VmTestCase::new(opcode, CaseFamily::SyscallId, program)
                    .with_cu_avail(SYSCALL_CU_AVAIL),
            );
        }
    }
}

/// Where each version reads the `callx` target register from, plus both
/// fields at once.
fn callx_encodings() -> BTreeSet<(u8, i32)> {
    let mut encodings: BTreeSet<(u8, i32)> = SbpfVersion::ALL
        .iter()
        .map(|version| {
            if version.callx_uses_src_reg() {
                (TARGET_REG, 0)
            } else {
                (0, TARGET_REG as i32)
            }
        })
        .collect();
    encodings.insert((TARGET_REG, TARGET_REG as i32));
    encodings
}

fn call_indirect_cases(opcode: u8, sink: &mut CaseSink) {
    for (src, imm) in callx_encodings() {
        for target in CALLX_TARGETS {
            let program = legacy([Insn::new(opcode, 0, src, 0, imm), Insn::exit()]);
            sink.push(
                VmTestCase::new(opcode, CaseFamily::CallIndirectTarget, program)
                    .with_call_whitelist()
                    .with_register(TARGET_REG, target),
            );
        }
    }
    // r10 is the frame pointer, r11 does not exist
    for reg in [10, 11] {
        let program = legacy([Insn::new(opcode, 0, reg, 0, reg as i32), Insn::exit()]);
        sink.push(
            VmTestCase::new(opcode, CaseFamily::CallIndirectTarget, program)
                .with_call_whitelist(),
        );
    }
}

fn wide_cases(opcode: u8, sink: &mut CaseSink) {
    for dst in DST_REGS {
        for src in WIDE_SRC_REGS {
            for imm in WIDE_IMMEDIATES {
                let program = legacy(lddw(dst, src, imm));
                sink.push(VmTestCase::new(opcode, CaseFamily::WideImmediate, program));
            }
        }
    }

    let imm = 0x1234_5678_9ABC_DEF0;
    for (dst, src) in CONTINUATION_REGS {
        let continuation = Insn::new(0, dst, src, 0, 0);
        let program = legacy(lddw_with_continuation(0, 0, imm, continuation));
        sink.push(VmTestCase::new(
            opcode,
            CaseFamily::ContinuationRegisters,
            program,
        ));
    }
    for continuation_opcode in CONTINUATION_OPCODES {
        let continuation = Insn::new(continuation_opcode, 0, 0, 0, 0);
        let program = legacy(lddw_with_continuation(0, 0, imm, continuation));
        sink.push(VmTestCase::new(
            opcode,
            CaseFamily::ContinuationOpcode,
            program,
        ));
    }

    let [first, _] = lddw(0, 0, imm);
    // lddw as the last word, then with the terminator taking the place of
    // its continuation
    let truncated = ProgramBuilder::new()
        .insn(first)
        .without_terminator()
        .assemble(ProgramForm::Legacy);
    sink.push(VmTestCase::new(opcode, CaseFamily::IncompleteWide, truncated));
    sink.push(VmTestCase::new(
        opcode,
        CaseFamily::IncompleteWide,
        legacy([first]),
    ));

    // off 1 lands on the continuation word, off 2 on the terminator after it
    for off in [1, 2] {
        let program = legacy([Insn::new(JA, 0, 0, off, 0)].into_iter().chain(lddw(0, 0, imm)));
        sink.push(VmTestCase::new(opcode, CaseFamily::JumpIntoWide, program));
    }
}

fn program_length_cases(sink: &mut CaseSink) {
    let body = Insn::new(MOV64_IMM, 0, 0, 0, 0);
    sink.push(VmTestCase::new(
        MOV64_IMM,
        CaseFamily::ProgramLength,
        ProgramBuilder::new()
            .without_terminator()
            .assemble(ProgramForm::Legacy),
    ));
    for trailing in 0..8 {
        let program = ProgramBuilder::new()
            .insn(body)
            .without_terminator()
            .trailing_bytes(&Insn::exit().encode()[..trailing])
            .assemble(ProgramForm::Legacy);
        sink.push(VmTestCase::new(MOV64_IMM, CaseFamily::ProgramLength, program));
    }
    for trailing in 1..8 {
        let program = ProgramBuilder::new()
            .insn(body)
            .trailing_bytes(&body.encode()[..trailing])
            .assemble(ProgramForm::Legacy);
        sink.push(VmTestCase::new(MOV64_IMM, CaseFamily::ProgramLength, program));
    }
}

fn compute_budget_cases(opcode: u8, sink: &mut CaseSink) {
    match opcode {
        ADD64_IMM => {
            for cu_avail in 0..4 {
                let program = legacy([Insn::new(ADD64_IMM, 0, 0, 0, 1)]);
                sink.push(
                    VmTestCase::new(opcode, CaseFamily::ComputeBudget, program)
                        .with_cu_avail(cu_avail),
                );
            }
        }
        JA => {
            // jumps to itself until the budget runs out
            for cu_avail in [0, DEFAULT_CU_AVAIL] {
                let program = legacy([Insn::new(JA, 0, 0, -1, 0)]);
                sink.push(
                    VmTestCase::new(opcode, CaseFamily::ComputeBudget, program)
                        .with_cu_avail(cu_avail),
                );
            }
        }
        _ => {}
    }
}

fn cases_for_class(opcode: u8, class: OpcodeClass, sink: &mut CaseSink) {
    match class {
        // covered by the cases of the versions that accept the opcode
        OpcodeClass::Invalid => {}
        OpcodeClass::Generic => {
            operand_cases(opcode, sink);
            if is_jump(opcode) {
                jump_offset_cases(opcode, sink);
            }
        }
        OpcodeClass::LoadStore(access) => {
            memory_boundary_cases(opcode, access, sink);
            frame_pointer_cases(opcode, access, sink);
            register_encoding_cases(opcode, access, sink);
        }
        OpcodeClass::Call => call_target_cases(sink),
        OpcodeClass::CallIndirect => call_indirect_cases(opcode, sink),
        OpcodeClass::SyscallV0toV2 => syscall_id_cases(opcode, ProgramForm::Legacy, sink),
        OpcodeClass::SyscallV3 => syscall_id_cases(SYSCALL, ProgramForm::Static, sink),
        OpcodeClass::ExplicitMultiword => wide_cases(opcode, sink),
    }
}

/// Cases for one opcode byte. An opcode every version rejects gets exactly
/// one case; anything else gets the operand domain of each class it takes on
/// some version.
pub fn opcode_test_cases(table: &OpcodeTable, opcode: u8) -> Result<Vec<VmTestCase>, Error> {
    let mut sink = CaseSink::default();
    if table.is_invalid_everywhere(opcode)? {
        sink.push(invalid_case(opcode));
        return Ok(sink.finish().0);
    }

    let classes = table.classes_across(opcode, &SbpfVersion::ALL)?;
    for class in &classes {
        cases_for_class(opcode, *class, &mut sink);
    }
    compute_budget_cases(opcode, &mut sink);
    if opcode == MOV64_IMM {
        program_length_cases(&mut sink);
    }

    let (cases, duplicates) = sink.finish();
    debug!(
        "opcode {:#04x}: {} cases from {:?} ({} duplicates dropped)",
        opcode,
        cases.len(),
        classes,
        duplicates
    );
    Ok(cases)
}

/// Version-independent cases for `opcodes`, in ascending opcode order.
pub fn generate_vm_test_cases(
    table: &OpcodeTable,
    opcodes: &[u8],
) -> Result<Vec<VmTestCase>, Error> {
    let opcodes: BTreeSet<u8> = opcodes.iter().copied().collect();
    let mut cases = Vec::new();
    for opcode in opcodes {
        cases.extend(opcode_test_cases(table, opcode)?);
    }
    Ok(cases)
}

/// Cases for the selected opcodes, projected onto every selected version.
/// Fails if any selected (opcode, version) pair ends up without a vector.
pub fn generate_test_vectors(config: &GeneratorConfig) -> Result<Vec<TestVector>, Error> {
    let table = OpcodeTable::sbpf()?;
    let cases = generate_vm_test_cases(&table, &config.opcodes)?;
    let vectors: Vec<TestVector> = cases
        .iter()
        .flat_map(|case| {
            config
                .versions
                .iter()
                .map(move |version| project(case, *version))
        })
        .collect();
    check_coverage(&table, config, &cases, &vectors)?;
    info!(
        "generated {} cases, {} vectors for {} versions",
        cases.len(),
        vectors.len(),
        config.versions.len()
    );
    Ok(vectors)
}

/// The full corpus: every opcode byte on every SBPF version.
pub fn generate_all_test_cases() -> Result<Vec<TestVector>, Error> {
    generate_test_vectors(&GeneratorConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::vm::opcodes::{CALL_REG, EXIT, LD_B_REG, RETURN};

    fn table() -> OpcodeTable {
        OpcodeTable::sbpf().unwrap()
    }

    fn families(cases: &[VmTestCase]) -> BTreeSet<CaseFamily> {
        cases.iter().map(|case| case.family).collect()
    }

    #[test]
    fn test_register_preset_matches_serialized_file() {
        assert_eq!(REGISTER_PRESET[1], 0);
        let case = opcode_test_cases(&table(), 0x0f).unwrap().remove(0);
        let vector = project(&case, SbpfVersion::V0);
        let vm_ctx = vector.context.vm_ctx.unwrap();
        assert_eq!(vm_ctx.r1, case.registers[1]);
        assert_eq!(vm_ctx.r9, case.registers[9]);
    }

    #[test]
    fn test_callx_targets_track_sbpf_memory_map() {
        assert_eq!(MM_RODATA_START, solana_sbpf::ebpf::MM_REGION_SIZE);
        assert_eq!(CALLX_TARGETS[0], solana_sbpf::ebpf::MM_RODATA_START + 16);
        assert_eq!(CALLX_TARGETS[1], solana_sbpf::ebpf::MM_BYTECODE_START + 16);
    }

    #[test]
    fn test_invalid_opcode_gets_one_case() {
        let cases = opcode_test_cases(&table(), 0x00).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].family, CaseFamily::InvalidOpcode);
        assert_eq!(
            cases[0].program.rodata(),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0x95, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_generic_cross_product() {
        let cases = opcode_test_cases(&table(), 0x0f).unwrap();
        assert_eq!(cases.len(), SRC_REGS.len() * DST_REGS.len() * IMMEDIATES.len());
        assert!(cases.iter().all(|case| case.program.len() == 16));
        assert_eq!(cases[0].id(), "0f_operands_0");
    }

    #[test]
    fn test_jumps_get_offset_family() {
        let cases = opcode_test_cases(&table(), 0x15).unwrap();
        assert!(families(&cases).contains(&CaseFamily::JumpOffset));
        let jump_cases = cases
            .iter()
            .filter(|case| case.family == CaseFamily::JumpOffset)
            .count();
        assert_eq!(jump_cases, JUMP_OFFSETS.len() * JUMP_IMMEDIATES.len());
    }

    #[test]
    fn test_moved_memory_opcode_unions_classes() {
        // mul32 on v0-v1, one-byte load on v2+
        let cases = opcode_test_cases(&table(), 0x2c).unwrap();
        let families = families(&cases);
        assert!(families.contains(&CaseFamily::Operands));
        assert!(families.contains(&CaseFamily::MemoryBoundary));
        assert!(families.contains(&CaseFamily::FramePointer));
    }

    #[test]
    fn test_memory_boundary_sets_base_register() {
        let cases = opcode_test_cases(&table(), LD_B_REG).unwrap();
        let heap_start = cases.iter().any(|case| {
            case.family == CaseFamily::MemoryBoundary
                && case.registers[BASE_REG as usize] == MM_HEAP_START
        });
        assert!(heap_start);
    }

    #[test]
    fn test_call_opcode_has_both_roles() {
        let cases = opcode_test_cases(&table(), CALL_IMM).unwrap();
        let families = families(&cases);
        assert!(families.contains(&CaseFamily::CallTarget));
        assert!(families.contains(&CaseFamily::SyscallId));
        assert!(cases
            .iter()
            .filter(|case| case.family == CaseFamily::CallTarget)
            .all(|case| case.call_whitelist == CALL_WHITELIST));
    }

    #[test]
    fn test_exit_opcode_gets_static_syscalls() {
        let cases = opcode_test_cases(&table(), EXIT).unwrap();
        let syscalls: Vec<_> = cases
            .iter()
            .filter(|case| case.family == CaseFamily::SyscallId)
            .collect();
        assert!(!syscalls.is_empty());
        for case in syscalls {
            assert_eq!(case.program.form(), ProgramForm::Static);
            assert_eq!(case.program.rodata()[0], SYSCALL);
            assert_eq!(case.program.rodata()[8], RETURN);
        }
    }

    #[test]
    fn test_callx_encodings_cover_both_fields() {
        let encodings = callx_encodings();
        assert!(encodings.contains(&(0, TARGET_REG as i32)));
        assert!(encodings.contains(&(TARGET_REG, 0)));
        assert!(encodings.contains(&(TARGET_REG, TARGET_REG as i32)));
        let cases = opcode_test_cases(&table(), CALL_REG).unwrap();
        assert_eq!(cases.len(), encodings.len() * CALLX_TARGETS.len() + 2);
    }

    #[test]
    fn test_lddw_families() {
        let cases = opcode_test_cases(&table(), LD_DW_IMM).unwrap();
        let families = families(&cases);
        for family in [
            CaseFamily::WideImmediate,
            CaseFamily::ContinuationRegisters,
            CaseFamily::ContinuationOpcode,
            CaseFamily::IncompleteWide,
            CaseFamily::JumpIntoWide,
        ] {
            assert!(families.contains(&family), "missing {family:?}");
        }
        let mismatched = cases
            .iter()
            .find(|case| case.family == CaseFamily::ContinuationRegisters)
            .unwrap();
        assert_eq!(mismatched.program.rodata()[9], 0x01);
    }

    #[test]
    fn test_program_length_family_is_only_misaligned_one() {
        let cases = generate_vm_test_cases(&table(), &[MOV64_IMM, LD_DW_IMM]).unwrap();
        for case in &cases {
            if !case.family.is_malformed_length() {
                assert!(case.program.is_word_aligned(), "{}", case.id());
            }
        }
        let lengths: BTreeSet<usize> = cases
            .iter()
            .filter(|case| case.family == CaseFamily::ProgramLength)
            .map(|case| case.program.len())
            .collect();
        // empty, one word plus 0..=7 bytes, two words plus 1..=7 bytes
        let expected: BTreeSet<usize> = [0].into_iter().chain(8..16).chain(17..24).collect();
        assert_eq!(lengths, expected);
    }

    #[test]
    fn test_cases_are_indexed_per_family() {
        let cases = opcode_test_cases(&table(), ADD64_IMM).unwrap();
        let budget: Vec<usize> = cases
            .iter()
            .filter(|case| case.family == CaseFamily::ComputeBudget)
            .map(|case| case.index)
            .collect();
        assert_eq!(budget, vec![0, 1, 2, 3]);
        let ids: HashSet<String> = cases.iter().map(VmTestCase::id).collect();
        assert_eq!(ids.len(), cases.len());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let first = generate_vm_test_cases(&table(), &[0x07, 0x18, 0x61, 0x85, 0x95]).unwrap();
        let second = generate_vm_test_cases(&table(), &[0x95, 0x85, 0x61, 0x18, 0x07]).unwrap();
        assert_eq!(first, second);
    }
}
