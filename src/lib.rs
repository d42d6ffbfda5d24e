pub mod proto;
pub mod utils;
pub mod vm_fixtures;
pub mod vm_interp;
pub mod vm_project;

use thiserror::Error;
use utils::vm::version::SbpfVersion;

pub use vm_interp::{generate_all_test_cases, generate_test_vectors, GeneratorConfig};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Opcode {opcode:#04x} has no classification for SBPF {version}")]
    UnclassifiedOpcode { opcode: u8, version: SbpfVersion },

    #[error("Opcode {opcode:#04x} classified twice for SBPF {version}")]
    ConflictingClassification { opcode: u8, version: SbpfVersion },

    #[error("No test vector covers opcode {opcode:#04x} on SBPF {version}")]
    CoverageGap { opcode: u8, version: SbpfVersion },

    #[error("Invalid opcode {opcode:#04x} produced {count} test cases")]
    InvalidOpcodeFanOut { opcode: u8, count: usize },

    #[error("Unsupported SBPF version {0}")]
    UnsupportedVersion(u64),

    #[error("Invalid protobuf")]
    InvalidProtobuf(#[from] prost::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
