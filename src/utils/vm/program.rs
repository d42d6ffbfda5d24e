use crate::utils::vm::insn::Insn;
use crate::utils::vm::opcodes::{EXIT, RETURN};
use crate::utils::vm::INSN_SIZE;

/// Instruction-set form a program is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProgramForm {
    /// v0-v2 encoding, ends in `exit` (0x95). Projected onto v3 by rewriting
    /// the terminator.
    Legacy,
    /// Static-syscall encoding, ends in `return` (0x9d). Emitted verbatim for
    /// every version.
    Static,
}

impl ProgramForm {
    pub fn terminator(self) -> Insn {
        match self {
            ProgramForm::Legacy => Insn::new(EXIT, 0, 0, 0, 0),
            ProgramForm::Static => Insn::new(RETURN, 0, 0, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramBuilder {
    insns: Vec<Insn>,
    terminate: bool,
    trailing: Vec<u8>,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            insns: Vec::new(),
            terminate: true,
            trailing: Vec::new(),
        }
    }

    pub fn insn(mut self, insn: Insn) -> Self {
        self.insns.push(insn);
        self
    }

    pub fn insns(mut self, insns: impl IntoIterator<Item = Insn>) -> Self {
        self.insns.extend(insns);
        self
    }

    /// Leave off the terminating instruction.
    pub fn without_terminator(mut self) -> Self {
        self.terminate = false;
        self
    }

    /// Raw bytes appended after the last word. Anything but a multiple of 8
    /// makes the program length invalid.
    pub fn trailing_bytes(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    pub fn assemble(&self, form: ProgramForm) -> Program {
        let terminator = self.terminate.then(|| form.terminator());
        let mut rodata =
            Vec::with_capacity((self.insns.len() + 1) * INSN_SIZE + self.trailing.len());
        for insn in self.insns.iter().chain(terminator.iter()) {
            rodata.extend_from_slice(&insn.encode());
        }
        rodata.extend_from_slice(&self.trailing);
        Program { rodata, form }
    }
}

/// An assembled read-only program image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Program {
    rodata: Vec<u8>,
    form: ProgramForm,
}

impl Program {
    pub fn rodata(&self) -> &[u8] {
        &self.rodata
    }

    pub fn len(&self) -> usize {
        self.rodata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodata.is_empty()
    }

    pub fn form(&self) -> ProgramForm {
        self.form
    }

    pub fn is_word_aligned(&self) -> bool {
        self.rodata.len() % INSN_SIZE == 0
    }

    /// Number of complete instruction words.
    pub fn insn_count(&self) -> usize {
        self.rodata.len() / INSN_SIZE
    }
}
