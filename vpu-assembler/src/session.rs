//! Assembly session state
//!
//! One [`AssemblerSession`] carries everything a single assembly run touches:
//! the output program, the static memory stream, both label tables, the
//! include stack and the accumulated diagnostics. Included files share the
//! session, so labels and static data defined in an include are visible to
//! the including file.

use std::io;
use std::path::{Path, PathBuf};

use vpu_spec::Program;

use crate::error::{AssemblerError, Diagnostic};
use crate::labels::{LabelTable, LocalLabelTable};
use crate::lexer::Loc;

/// Diagnostics past this many abort the run
pub const MAX_DIAGNOSTICS: usize = 50;

/// `%include` nesting bound
pub const MAX_INCLUDE_DEPTH: usize = 100;

/// Source lookup for `%include`. Paths resolve relative to the directory of
/// the including file.
pub trait IncludeResolver {
    fn read_relative(&self, mother: &Path, path: &str) -> io::Result<String>;
}

/// Filesystem resolver (the default)
pub struct FsResolver;

impl IncludeResolver for FsResolver {
    fn read_relative(&self, mother: &Path, path: &str) -> io::Result<String> {
        let dir = mother.parent().unwrap_or_else(|| Path::new("."));
        std::fs::read_to_string(dir.join(path))
    }
}

/// In-memory resolver for tests and embedded sources
#[derive(Default)]
pub struct MemoryResolver {
    files: std::collections::HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, source: &str) {
        self.files.insert(path.to_string(), source.to_string());
    }
}

impl IncludeResolver for MemoryResolver {
    fn read_relative(&self, _mother: &Path, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// State of one assembly run
pub struct AssemblerSession<'r> {
    pub(crate) resolver: &'r dyn IncludeResolver,
    pub(crate) program: Vec<u32>,
    pub(crate) static_mem: Vec<u8>,
    pub(crate) labels: LabelTable,
    pub(crate) locals: LocalLabelTable,
    pub(crate) entry_point: u64,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) include_stack: Vec<PathBuf>,
    pub(crate) aborted: bool,
}

impl<'r> AssemblerSession<'r> {
    pub fn new(resolver: &'r dyn IncludeResolver) -> Self {
        // first 8 bytes of static memory hold its total size, backpatched
        // in finish()
        Self {
            resolver,
            program: Vec::new(),
            static_mem: vec![0u8; 8],
            labels: LabelTable::new(),
            locals: LocalLabelTable::new(),
            entry_point: 0,
            diagnostics: Vec::new(),
            include_stack: Vec::new(),
            aborted: false,
        }
    }

    /// Current file (top of the include stack)
    pub(crate) fn current_file(&self) -> String {
        self.include_stack
            .last()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    /// Record a diagnostic; sets the abort flag at the ceiling
    pub(crate) fn diag(&mut self, loc: Loc, message: impl Into<String>) {
        if self.aborted {
            return;
        }
        self.diagnostics.push(Diagnostic {
            file: self.current_file(),
            line: loc.line,
            column: loc.column,
            message: message.into(),
        });
        if self.diagnostics.len() >= MAX_DIAGNOSTICS {
            self.diagnostics.push(Diagnostic {
                file: self.current_file(),
                line: loc.line,
                column: loc.column,
                message: "too many error messages, aborting".to_string(),
            });
            self.aborted = true;
        }
    }

    /// Append string bytes (NUL-terminated) to static memory, returning
    /// (offset, string length)
    pub(crate) fn push_static_str(&mut self, bytes: &[u8]) -> (u64, u64) {
        let offset = self.static_mem.len() as u64;
        self.static_mem.extend_from_slice(bytes);
        self.static_mem.push(0);
        (offset, bytes.len() as u64)
    }

    /// Append an 8-byte value to static memory, returning its offset
    pub(crate) fn push_static_u64(&mut self, value: u64) -> u64 {
        let offset = self.static_mem.len() as u64;
        self.static_mem.extend_from_slice(&value.to_le_bytes());
        offset
    }

    /// Close the run: verify local labels, backpatch the static size header
    /// and produce the program, or the accumulated diagnostics.
    pub(crate) fn finish(mut self) -> Result<Program, AssemblerError> {
        if let Some(name) = self.locals.missing() {
            let message = format!("unsolved local label '.{}'", name);
            self.diagnostics.push(Diagnostic {
                file: self.current_file(),
                line: 0,
                column: 0,
                message,
            });
        }

        if !self.diagnostics.is_empty() {
            return Err(AssemblerError::Failed(self.diagnostics));
        }

        let size = self.static_mem.len() as u64;
        self.static_mem[..8].copy_from_slice(&size.to_le_bytes());

        let mut program = Program::new();
        program.code = self.program;
        program.static_mem = self.static_mem;
        program.entry_point = self.entry_point;
        program.label_bytes = Some(self.labels.to_bytes());
        Ok(program)
    }
}
