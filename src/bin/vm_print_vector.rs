use clap::Parser;
use solfuzz_vm_gen::proto::SyscallContext;
use solfuzz_vm_gen::utils::vm::insn::Insn;
use solfuzz_vm_gen::utils::vm::INSN_SIZE;
use solfuzz_vm_gen::vm_fixtures::read_test_vector;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    inputs: Vec<PathBuf>,
}

fn print_context(context: &SyscallContext) {
    let Some(vm_ctx) = context.vm_ctx.as_ref() else {
        println!("No VM context found.");
        return;
    };
    let cu_avail = context
        .instr_ctx
        .as_ref()
        .map(|instr_ctx| instr_ctx.cu_avail)
        .unwrap_or_default();
    println!(
        "sbpf v{}  cu_avail {}  heap_max {:#x}  entry_pc {}  call_whitelist {:02x?}",
        vm_ctx.sbpf_version, cu_avail, vm_ctx.heap_max, vm_ctx.entry_pc, vm_ctx.call_whitelist
    );
    let regs = [
        vm_ctx.r0, vm_ctx.r2, vm_ctx.r3, vm_ctx.r4, vm_ctx.r5, vm_ctx.r6, vm_ctx.r7, vm_ctx.r8,
        vm_ctx.r9,
    ];
    for (reg, value) in [0, 2, 3, 4, 5, 6, 7, 8, 9].iter().zip(regs) {
        println!("  r{reg:<2} = {value:#018x}");
    }
    for region in &vm_ctx.input_data_regions {
        println!(
            "  input +{:#x}: {} bytes{}",
            region.offset,
            region.content.len(),
            if region.is_writable { ", writable" } else { "" }
        );
    }

    for (pc, word) in vm_ctx.rodata.chunks(INSN_SIZE).enumerate() {
        match Insn::decode(word) {
            Some(insn) => println!(
                "  {pc:4}: {:02x} dst=r{} src=r{} off={} imm={:#x}",
                insn.opc, insn.dst, insn.src, insn.off, insn.imm
            ),
            None => println!("  {pc:4}: trailing {} bytes {:02x?}", word.len(), word),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let mut fail_cnt = 0;
    for input in cli.inputs {
        println!("{}", input.display());
        match read_test_vector(&input) {
            Ok(context) => print_context(&context),
            Err(err) => {
                println!("FAIL: {err}");
                fail_cnt += 1;
            }
        }
    }
    if fail_cnt > 0 {
        std::process::exit(1);
    }
}
