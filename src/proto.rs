//! Messages of the `org.solana.sealevel.v1` VM schema that the generator emits.
//!
//! Only the subset of the schema the interpreter vectors populate is declared
//! here. Tags match the schema consumed by `sol_compat_vm_*` targets, so
//! fixtures decode unchanged on the harness side.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InputDataRegion {
    /// Offset from the start of the input region
    #[prost(uint64, tag = "1")]
    pub offset: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub content: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, tag = "3")]
    pub is_writable: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VmContext {
    #[prost(uint64, tag = "1")]
    pub heap_max: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub rodata: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub rodata_text_section_offset: u64,
    #[prost(uint64, tag = "4")]
    pub rodata_text_section_length: u64,
    #[prost(message, repeated, tag = "5")]
    pub input_data_regions: ::prost::alloc::vec::Vec<InputDataRegion>,
    #[prost(uint64, tag = "6")]
    pub r0: u64,
    #[prost(uint64, tag = "7")]
    pub r1: u64,
    #[prost(uint64, tag = "8")]
    pub r2: u64,
    #[prost(uint64, tag = "9")]
    pub r3: u64,
    #[prost(uint64, tag = "10")]
    pub r4: u64,
    #[prost(uint64, tag = "11")]
    pub r5: u64,
    #[prost(uint64, tag = "12")]
    pub r6: u64,
    #[prost(uint64, tag = "13")]
    pub r7: u64,
    #[prost(uint64, tag = "14")]
    pub r8: u64,
    #[prost(uint64, tag = "15")]
    pub r9: u64,
    #[prost(uint64, tag = "16")]
    pub r10: u64,
    #[prost(uint64, tag = "17")]
    pub r11: u64,
    #[prost(bool, tag = "18")]
    pub check_align: bool,
    #[prost(bool, tag = "19")]
    pub check_size: bool,
    #[prost(uint64, tag = "20")]
    pub entry_pc: u64,
    /// Bitmap of valid static-call targets, bit `pc % 8` of byte `pc / 8`
    #[prost(bytes = "vec", tag = "21")]
    pub call_whitelist: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, tag = "22")]
    pub tracing_enabled: bool,
    #[prost(uint64, tag = "24")]
    pub sbpf_version: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InstrContext {
    #[prost(bytes = "vec", tag = "1")]
    pub program_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "6")]
    pub cu_avail: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SyscallInvocation {
    #[prost(bytes = "vec", tag = "1")]
    pub function_name: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub heap_prefix: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub stack_prefix: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SyscallContext {
    #[prost(message, optional, tag = "1")]
    pub vm_ctx: ::core::option::Option<VmContext>,
    #[prost(message, optional, tag = "2")]
    pub instr_ctx: ::core::option::Option<InstrContext>,
    #[prost(message, optional, tag = "3")]
    pub syscall_invocation: ::core::option::Option<SyscallInvocation>,
}
