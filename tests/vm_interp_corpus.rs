use solfuzz_vm_gen::utils::vm::mem_regions::{boundary_addresses, memory_layout};
use solfuzz_vm_gen::utils::vm::opcodes::{AccessWidth, OpcodeClass, OpcodeTable, EXIT, RETURN};
use solfuzz_vm_gen::utils::vm::version::SbpfVersion;
use solfuzz_vm_gen::utils::vm::INSN_SIZE;
use solfuzz_vm_gen::vm_fixtures::{read_test_vector, write_test_vectors};
use solfuzz_vm_gen::vm_interp::{CaseFamily, MemoryPresets};
use solfuzz_vm_gen::vm_project::TestVector;
use solfuzz_vm_gen::{generate_all_test_cases, generate_test_vectors, GeneratorConfig};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

fn base_id(vector: &TestVector) -> String {
    vector
        .id
        .strip_suffix(&format!("_{}", vector.version))
        .unwrap()
        .to_string()
}

#[test]
fn test_full_corpus() {
    let vectors = generate_all_test_cases().unwrap();
    let table = OpcodeTable::sbpf().unwrap();

    // every opcode on every version
    let covered: HashSet<(u8, SbpfVersion)> = vectors
        .iter()
        .map(|vector| (vector.opcode, vector.version))
        .collect();
    for opcode in 0..=u8::MAX {
        for version in SbpfVersion::ALL {
            assert!(covered.contains(&(opcode, version)), "{opcode:#04x} {version}");
        }
    }

    // rejected-everywhere opcodes fan out to one case per version
    let mut per_opcode: HashMap<u8, usize> = HashMap::new();
    for vector in &vectors {
        *per_opcode.entry(vector.opcode).or_default() += 1;
    }
    for opcode in 0..=u8::MAX {
        if table.is_invalid_everywhere(opcode).unwrap() {
            assert_eq!(per_opcode[&opcode], SbpfVersion::ALL.len(), "{opcode:#04x}");
        }
    }

    // file names are unique
    let names: HashSet<String> = vectors.iter().map(TestVector::file_name).collect();
    assert_eq!(names.len(), vectors.len());

    for vector in &vectors {
        if !vector.family.is_malformed_length() {
            assert_eq!(vector.rodata().len() % INSN_SIZE, 0, "{}", vector.id);
        }
    }
}

#[test]
fn test_generation_is_byte_identical() {
    let config = GeneratorConfig {
        versions: SbpfVersion::ALL.to_vec(),
        opcodes: vec![0x07, 0x18, 0x2c, 0x61, 0x85, 0x8d, 0x95, 0x9d, 0xb7],
    };
    let first: Vec<String> = generate_test_vectors(&config)
        .unwrap()
        .iter()
        .map(TestVector::file_name)
        .collect();
    let second: Vec<String> = generate_test_vectors(&config)
        .unwrap()
        .iter()
        .map(TestVector::file_name)
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_v3_differs_only_at_terminators() {
    let vectors = generate_test_vectors(&GeneratorConfig {
        versions: vec![SbpfVersion::V0, SbpfVersion::V3],
        opcodes: vec![0x00, 0x07, 0x18, 0x55, 0x95, 0xb7],
    })
    .unwrap();
    let mut by_case: BTreeMap<String, BTreeMap<SbpfVersion, &TestVector>> = BTreeMap::new();
    for vector in &vectors {
        by_case
            .entry(base_id(vector))
            .or_default()
            .insert(vector.version, vector);
    }

    for (id, versions) in by_case {
        let v0 = versions[&SbpfVersion::V0].rodata();
        let v3 = versions[&SbpfVersion::V3].rodata();
        assert_eq!(v0.len(), v3.len(), "{id}");
        for (i, (a, b)) in v0.iter().zip(v3).enumerate() {
            if a != b {
                assert_eq!(i % INSN_SIZE, 0, "{id} byte {i}");
                assert_eq!((*a, *b), (EXIT, RETURN), "{id} byte {i}");
            }
        }
    }
}

#[test]
fn test_single_terminator_program_differs_in_one_byte() {
    let vectors = generate_test_vectors(&GeneratorConfig {
        versions: vec![SbpfVersion::V0, SbpfVersion::V3],
        opcodes: vec![0x00],
    })
    .unwrap();
    assert_eq!(vectors.len(), 2);
    let diff = vectors[0]
        .rodata()
        .iter()
        .zip(vectors[1].rodata())
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(diff, 1);
}

#[test]
fn test_partial_terminators_follow_version() {
    let vectors = generate_test_vectors(&GeneratorConfig {
        versions: vec![SbpfVersion::V2, SbpfVersion::V3],
        opcodes: vec![0xb7],
    })
    .unwrap();
    let mut partial = 0;
    for vector in vectors
        .iter()
        .filter(|vector| vector.family == CaseFamily::ProgramLength)
    {
        let rodata = vector.rodata();
        let tail = &rodata[rodata.len() - rodata.len() % INSN_SIZE..];
        if tail.is_empty() || rodata.len() >= 2 * INSN_SIZE {
            continue;
        }
        // one word plus a prefix of the terminator
        partial += 1;
        let expected = match vector.version {
            SbpfVersion::V3 => RETURN,
            _ => EXIT,
        };
        assert_eq!(tail[0], expected, "{}", vector.id);
    }
    assert_eq!(partial, 2 * 7);
}

#[test]
fn test_static_syscalls_are_version_independent() {
    let vectors = generate_test_vectors(&GeneratorConfig {
        versions: SbpfVersion::ALL.to_vec(),
        opcodes: vec![0x95],
    })
    .unwrap();
    let mut by_case: BTreeMap<String, BTreeSet<Vec<u8>>> = BTreeMap::new();
    for vector in vectors
        .iter()
        .filter(|vector| vector.family == CaseFamily::SyscallId)
    {
        by_case
            .entry(base_id(vector))
            .or_default()
            .insert(vector.rodata().to_vec());
    }
    assert!(!by_case.is_empty());
    assert!(by_case.values().all(|rodatas| rodatas.len() == 1));
}

#[test]
fn test_boundaries_covered_for_every_width() {
    let table = OpcodeTable::sbpf().unwrap();
    let vectors = generate_all_test_cases().unwrap();
    let memory = MemoryPresets::default();
    let layout = memory_layout(16, memory.heap_max, &memory.input_data_regions());

    let mut targeted: HashMap<AccessWidth, HashSet<u64>> = HashMap::new();
    for vector in vectors
        .iter()
        .filter(|vector| vector.family == CaseFamily::MemoryBoundary)
    {
        let OpcodeClass::LoadStore(access) = table.classify(vector.opcode, vector.version).unwrap()
        else {
            continue;
        };
        let vm_ctx = vector.context.vm_ctx.as_ref().unwrap();
        let off = i16::from_le_bytes([vector.rodata()[2], vector.rodata()[3]]);
        targeted
            .entry(access.width)
            .or_default()
            .insert(vm_ctx.r2.wrapping_add_signed(off as i64));
    }

    for width in AccessWidth::ALL {
        let targeted = &targeted[&width];
        for addr in boundary_addresses(&layout, width) {
            assert!(targeted.contains(&addr), "{width:?} {addr:#x}");
        }
    }
}

#[test]
fn test_written_corpus_reads_back() {
    let vectors = generate_test_vectors(&GeneratorConfig {
        versions: SbpfVersion::ALL.to_vec(),
        opcodes: vec![0x18, 0xb7],
    })
    .unwrap();
    let dir = std::env::temp_dir().join(format!("vm_interp_corpus_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let written = write_test_vectors(&dir, &vectors).unwrap();
    assert_eq!(written, vectors.len());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), vectors.len());
    for vector in &vectors {
        let context = read_test_vector(&dir.join(vector.file_name())).unwrap();
        assert_eq!(context, vector.context);
    }
    std::fs::remove_dir_all(&dir).unwrap();
}
