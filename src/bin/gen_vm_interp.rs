use clap::Parser;
use solfuzz_vm_gen::utils::vm::version::SbpfVersion;
use solfuzz_vm_gen::vm_fixtures::write_test_vectors;
use solfuzz_vm_gen::{generate_test_vectors, Error, GeneratorConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate interpreter conformance vectors for every SBPF opcode.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory the .bin fixtures are written to
    #[arg(
        long,
        env = "VM_INTERP_OUTPUT_DIR",
        default_value = "test-vectors/vm_interp/tests"
    )]
    output_dir: PathBuf,

    /// SBPF versions to emit (default: all)
    #[arg(
        long = "sbpf-version",
        value_delimiter = ',',
        value_parser = clap::value_parser!(u64).range(0..4)
    )]
    sbpf_versions: Vec<u64>,

    /// Opcodes to emit, in hex (default: all 256)
    #[arg(long = "opcode", value_delimiter = ',', value_parser = parse_opcode)]
    opcodes: Vec<u8>,

    /// Generate and check coverage without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn parse_opcode(s: &str) -> Result<u8, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid opcode {s:?}: {e}"))
}

fn config(cli: &Cli) -> Result<GeneratorConfig, Error> {
    let mut config = GeneratorConfig::default();
    if !cli.sbpf_versions.is_empty() {
        config.versions = cli
            .sbpf_versions
            .iter()
            .map(|version| SbpfVersion::try_from(*version))
            .collect::<Result<_, _>>()?;
        config.versions.sort();
        config.versions.dedup();
    }
    if !cli.opcodes.is_empty() {
        config.opcodes = cli.opcodes.clone();
        config.opcodes.sort();
        config.opcodes.dedup();
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = config(cli)?;
    let vectors = generate_test_vectors(&config)?;
    if cli.dry_run {
        info!("dry run, {} vectors not written", vectors.len());
        return Ok(());
    }
    write_test_vectors(&cli.output_dir, &vectors)?;
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
