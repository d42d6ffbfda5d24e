pub mod vm;

use solana_sbpf::ebpf;

/// Key under which the loader registers an internal function starting at `pc`.
///
/// Static calls on SBPF v0-v2 carry this hash in their immediate, so a call
/// lands on `pc` iff `pc` is set in the call whitelist.
pub fn pchash(pc: u64) -> u32 {
    ebpf::hash_symbol_name(&u64::to_le_bytes(pc))
}

/// Key of a named symbol (syscalls, the `entrypoint` alias).
pub fn symbol_hash(name: &[u8]) -> u32 {
    ebpf::hash_symbol_name(name)
}
