//! Projection of version-independent cases onto one SBPF version, and their
//! protobuf form.

use crate::proto::{InstrContext, SyscallContext, SyscallInvocation, VmContext};
use crate::utils::vm::opcodes::OpcodeTable;
use crate::utils::vm::program::{Program, ProgramForm};
use crate::utils::vm::version::SbpfVersion;
use crate::utils::vm::INSN_SIZE;
use crate::vm_interp::{CaseFamily, VmTestCase};
use prost::Message;
use sha3::{Digest, Sha3_256};

const PROGRAM_ID: [u8; 32] = [0; 32];
const DIGEST_PREFIX_LEN: usize = 16;

/// A case bound to one SBPF version, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct TestVector {
    /// `<opcode>_<family>_<index>_v<version>`
    pub id: String,
    pub opcode: u8,
    pub family: CaseFamily,
    pub version: SbpfVersion,
    pub context: SyscallContext,
}

impl TestVector {
    pub fn payload(&self) -> Vec<u8> {
        self.context.encode_to_vec()
    }

    pub fn rodata(&self) -> &[u8] {
        self.context
            .vm_ctx
            .as_ref()
            .map(|vm_ctx| vm_ctx.rodata.as_slice())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> String {
        fixture_file_name(&self.id, &self.payload())
    }
}

/// `<test id>_<first 16 hex digits of sha3-256(payload)>.bin`
pub fn fixture_file_name(test_id: &str, payload: &[u8]) -> String {
    let digest = hex::encode(Sha3_256::digest(payload));
    format!("{}_{}.bin", test_id, &digest[..DIGEST_PREFIX_LEN])
}

/// Bytes `version` sees for `program`. Legacy programs get their `exit`
/// opcodes rewritten to what the version terminates with. Only the opcode
/// byte of each word is touched, including that of a trailing partial word.
pub fn project_rodata(program: &Program, version: SbpfVersion) -> Vec<u8> {
    let mut rodata = program.rodata().to_vec();
    if program.form() == ProgramForm::Legacy {
        for word in rodata.chunks_mut(INSN_SIZE) {
            word[0] = OpcodeTable::remap(word[0], version);
        }
    }
    rodata
}

pub fn project(case: &VmTestCase, version: SbpfVersion) -> TestVector {
    let rodata = project_rodata(&case.program, version);
    let [r0, _, r2, r3, r4, r5, r6, r7, r8, r9] = case.registers;

    let vm_ctx = VmContext {
        heap_max: case.memory.heap_max,
        rodata_text_section_offset: 0,
        rodata_text_section_length: rodata.len() as u64,
        rodata,
        input_data_regions: case.memory.input_data_regions(),
        r0,
        r1: 0,
        r2,
        r3,
        r4,
        r5,
        r6,
        r7,
        r8,
        r9,
        r10: 0,
        r11: 0,
        check_align: true,
        check_size: true,
        entry_pc: case.entry_pc,
        call_whitelist: case.call_whitelist.clone(),
        tracing_enabled: false,
        sbpf_version: version.as_u64(),
    };

    TestVector {
        id: format!("{}_{}", case.id(), version),
        opcode: case.opcode,
        family: case.family,
        version,
        context: SyscallContext {
            vm_ctx: Some(vm_ctx),
            instr_ctx: Some(InstrContext {
                program_id: PROGRAM_ID.to_vec(),
                cu_avail: case.cu_avail,
            }),
            syscall_invocation: Some(SyscallInvocation {
                function_name: Vec::new(),
                heap_prefix: case.memory.heap_prefix.clone(),
                stack_prefix: case.memory.stack_prefix.clone(),
            }),
        },
    }
}
