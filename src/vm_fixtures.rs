use crate::proto::SyscallContext;
use crate::utils::vm::opcodes::OpcodeTable;
use crate::vm_interp::{GeneratorConfig, VmTestCase};
use crate::vm_project::TestVector;
use crate::Error;
use prost::Message;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Checks that every selected (opcode, version) pair has at least one vector
/// and that opcodes rejected by every version produced exactly one case.
pub fn check_coverage(
    table: &OpcodeTable,
    config: &GeneratorConfig,
    cases: &[VmTestCase],
    vectors: &[TestVector],
) -> Result<(), Error> {
    let covered: HashSet<_> = vectors
        .iter()
        .map(|vector| (vector.opcode, vector.version))
        .collect();
    let mut case_counts = [0usize; 256];
    for case in cases {
        case_counts[case.opcode as usize] += 1;
    }

    for opcode in &config.opcodes {
        for version in &config.versions {
            if !covered.contains(&(*opcode, *version)) {
                return Err(Error::CoverageGap {
                    opcode: *opcode,
                    version: *version,
                });
            }
        }
        let count = case_counts[*opcode as usize];
        if table.is_invalid_everywhere(*opcode)? && count != 1 {
            return Err(Error::InvalidOpcodeFanOut {
                opcode: *opcode,
                count,
            });
        }
    }
    Ok(())
}

/// Writes each vector as `<dir>/<file name>`, creating `dir` if needed.
/// A file already holding the exact payload is left alone; anything else
/// under that name (e.g. truncated by an interrupted run) is replaced.
pub fn write_test_vectors(dir: &Path, vectors: &[TestVector]) -> Result<usize, Error> {
    fs::create_dir_all(dir)?;
    let mut written = 0;
    for vector in vectors {
        let path = dir.join(vector.file_name());
        let payload = vector.payload();
        if fs::read(&path).is_ok_and(|existing| existing == payload) {
            debug!("{} already present", path.display());
            continue;
        }
        // readers never see a partial file under the final name
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, &payload)?;
        fs::rename(&tmp, &path)?;
        written += 1;
    }
    info!(
        "wrote {} of {} vectors to {}",
        written,
        vectors.len(),
        dir.display()
    );
    Ok(written)
}

pub fn read_test_vector(path: &Path) -> Result<SyscallContext, Error> {
    let blob = fs::read(path)?;
    Ok(SyscallContext::decode(&blob[..])?)
}
