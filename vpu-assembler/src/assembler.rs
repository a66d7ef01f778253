//! Main assembler logic
//!
//! Single pass: tokens stream through once, instructions are encoded as
//! they appear, label references resolve against what the pass has already
//! seen, and forward `@name` references get a zero placeholder that the
//! `.name:` definition patches.

use std::path::Path;

use vpu_spec::{Opcode, OperandProfile, Program, Register};

use crate::encoder::{encode, fit_signed, fit_unsigned, ResolvedOperands};
use crate::error::Result;
use crate::labels::{LabelValue, LiteralSlot, PendingRef};
use crate::lexer::{Lexer, Loc, Token};
use crate::literal::{parse_literal, Literal};
use crate::session::{AssemblerSession, FsResolver, IncludeResolver, MAX_INCLUDE_DEPTH};

/// Assemble source text. `%include` resolves against the filesystem,
/// relative to the working directory.
pub fn assemble(source: &str) -> Result<Program> {
    assemble_with(source, Path::new("<source>"), &FsResolver)
}

/// Assemble a file. `%include` resolves relative to its directory.
pub fn assemble_file(path: impl AsRef<Path>) -> Result<Program> {
    let source = std::fs::read_to_string(path.as_ref())?;
    assemble_with(&source, path.as_ref(), &FsResolver)
}

/// Assemble with an explicit include resolver
pub fn assemble_with(
    source: &str,
    origin: &Path,
    resolver: &dyn IncludeResolver,
) -> Result<Program> {
    let mut session = AssemblerSession::new(resolver);
    session.include_stack.push(origin.to_path_buf());
    session.parse_source(source);
    session.finish()
}

impl<'r> AssemblerSession<'r> {
    pub(crate) fn parse_source(&mut self, source: &str) {
        let mut lexer = Lexer::new(source);
        while let Some((token, loc)) = lexer.next() {
            if self.aborted {
                return;
            }
            match token {
                Err(()) => self.diag(loc, format!("unrecognized token '{}'", lexer.slice())),
                Ok(Token::Newline) => {}
                Ok(Token::Macro(name)) => self.handle_macro(&name, &mut lexer, loc),
                Ok(Token::Raw(text)) => {
                    if lexer.peek() == Some(Ok(Token::Colon)) {
                        lexer.next();
                        self.define_label(&text, loc);
                    } else if let Some(op) = Opcode::from_mnemonic(&text) {
                        self.encode_instruction(op, &mut lexer, loc);
                    } else {
                        self.diag(loc, format!("unknown instruction '{}'", text));
                    }
                }
                Ok(Token::Colon) => self.diag(loc, "stray ':'"),
                Ok(Token::Comma) | Ok(Token::Eq) => {}
                Ok(_) => self.diag(loc, "token outside of any instruction or macro"),
            }
        }
    }

    // ======================= labels =======================

    fn define_label(&mut self, name: &str, loc: Loc) {
        let position = self.program.len() as u64;
        if let Some(local) = name.strip_prefix('.') {
            if local.is_empty() {
                self.diag(loc, "empty local label name");
                return;
            }
            match self.locals.define(local, position) {
                Ok(pending) => {
                    for reference in pending {
                        self.patch_local(reference, position, loc);
                    }
                }
                Err(()) => self.diag(loc, format!("redefinition of local label '.{}'", local)),
            }
        } else {
            // a new global label closes the current local block
            self.close_local_block(loc);
            if self.labels.add(name, LabelValue::InstPosition(position)).is_err() {
                self.diag(loc, format!("label '{}' already defined", name));
            }
        }
    }

    fn close_local_block(&mut self, loc: Loc) {
        if let Some(missing) = self.locals.missing().map(str::to_string) {
            self.diag(loc, format!("unsolved local label '.{}'", missing));
        }
        self.locals.clear();
    }

    fn patch_local(&mut self, reference: PendingRef, position: u64, loc: Loc) {
        let delta = position as i64 - (reference.word_index as i64 + 1);
        match fit_signed(delta) {
            Some(value) => {
                let index = reference.word_index as usize;
                self.program[index] = reference.slot.patch(self.program[index], value);
            }
            None => self.diag(loc, "local label jump does not fit in 16 bits"),
        }
    }

    // ======================= instructions =======================

    fn encode_instruction(&mut self, op: Opcode, lexer: &mut Lexer, loc: Loc) {
        let operands = match op.profile() {
            OperandProfile::None => Some(ResolvedOperands::None),
            OperandProfile::R => self.fetch_register(lexer, loc).map(ResolvedOperands::R),
            OperandProfile::Rr => {
                let a = self.fetch_register(lexer, loc);
                let b = self.fetch_register(lexer, loc);
                a.zip(b).map(|(a, b)| ResolvedOperands::Rr(a, b))
            }
            OperandProfile::Rrr => {
                let a = self.fetch_register(lexer, loc);
                let b = self.fetch_register(lexer, loc);
                let c = self.fetch_register(lexer, loc);
                a.zip(b).zip(c).map(|((a, b), c)| ResolvedOperands::Rrr(a, b, c))
            }
            OperandProfile::Rl => {
                let a = self.fetch_register(lexer, loc);
                let lit = self.fetch_literal(lexer, loc, LiteralSlot::Rl);
                a.zip(lit).map(|(a, lit)| ResolvedOperands::Rl(a, lit))
            }
            OperandProfile::E => self.fetch_e_operand(lexer, loc),
        };
        if let Some(operands) = operands {
            self.program.push(encode(op, operands).0);
        }
    }

    /// Next operand token; commas and newlines are separators
    fn next_operand_token(&mut self, lexer: &mut Lexer, at: Loc) -> Option<(Token, Loc)> {
        loop {
            match lexer.next() {
                None => {
                    self.diag(at, "unexpected end of input");
                    return None;
                }
                Some((Err(()), loc)) => {
                    let slice = lexer.slice().to_string();
                    self.diag(loc, format!("unrecognized token '{}'", slice));
                    return None;
                }
                Some((Ok(Token::Comma), _)) | Some((Ok(Token::Newline), _)) => {}
                Some((Ok(token), loc)) => return Some((token, loc)),
            }
        }
    }

    fn fetch_register(&mut self, lexer: &mut Lexer, at: Loc) -> Option<Register> {
        let (token, loc) = self.next_operand_token(lexer, at)?;
        match token {
            Token::Raw(text) => match text.parse::<Register>() {
                Ok(reg) => Some(reg),
                Err(_) => {
                    self.diag(loc, format!("expected a register, got '{}'", text));
                    None
                }
            },
            _ => {
                self.diag(loc, "expected a register");
                None
            }
        }
    }

    fn fetch_literal(&mut self, lexer: &mut Lexer, at: Loc, slot: LiteralSlot) -> Option<u16> {
        let (token, loc) = self.next_operand_token(lexer, at)?;
        self.resolve_literal(token, loc, slot)
    }

    /// E-profile operand: a register name or anything a literal slot takes
    fn fetch_e_operand(&mut self, lexer: &mut Lexer, at: Loc) -> Option<ResolvedOperands> {
        let (token, loc) = self.next_operand_token(lexer, at)?;
        if let Token::Raw(text) = &token {
            if let Ok(reg) = text.parse::<Register>() {
                return Some(ResolvedOperands::EReg(reg));
            }
        }
        self.resolve_literal(token, loc, LiteralSlot::E)
            .map(ResolvedOperands::ELit)
    }

    /// Resolve a token occupying a 16-bit literal slot
    fn resolve_literal(&mut self, token: Token, loc: Loc, slot: LiteralSlot) -> Option<u16> {
        match token {
            Token::Raw(text) => match parse_literal(&text) {
                Some(Literal::Uint(value)) => self.fit_u(value, loc),
                Some(Literal::Int(value)) => self.fit_i(value, loc),
                Some(Literal::Float(_)) => {
                    self.diag(loc, "float literal does not fit a 16-bit slot");
                    None
                }
                None => {
                    self.diag(loc, format!("expected a literal, got '{}'", text));
                    None
                }
            },
            Token::Char(byte) => Some(byte as u16),
            Token::Str(bytes) => {
                // strings land in static memory; the operand is their offset
                let (offset, _) = self.push_static_str(&bytes);
                self.fit_u(offset, loc)
            }
            Token::LabelRef(name) => match self.labels.get(&name).copied() {
                None => {
                    self.diag(loc, format!("undefined label '${}'", name));
                    None
                }
                Some(LabelValue::Uint(value)) | Some(LabelValue::InstPosition(value)) => {
                    self.fit_u(value, loc)
                }
                Some(LabelValue::Int(value)) => self.fit_i(value, loc),
                Some(LabelValue::StaticRef { offset, .. }) => self.fit_u(offset, loc),
                Some(LabelValue::Float(_)) => {
                    self.diag(loc, format!("label '${}' is a float", name));
                    None
                }
            },
            Token::AddrLabelRef(name) => {
                let reference = PendingRef {
                    word_index: self.program.len() as u64,
                    slot,
                };
                match self.locals.resolve_or_defer(&name, reference) {
                    // deltas resolve against the instruction after this one
                    Some(position) => {
                        let delta = position as i64 - (reference.word_index as i64 + 1);
                        self.fit_i(delta, loc)
                    }
                    None => Some(0), // patched when the definition arrives
                }
            }
            _ => {
                self.diag(loc, "expected a literal operand");
                None
            }
        }
    }

    fn fit_u(&mut self, value: u64, loc: Loc) -> Option<u16> {
        match fit_unsigned(value) {
            Some(v) => Some(v),
            None => {
                self.diag(loc, "literal has to be up to 16 bits");
                None
            }
        }
    }

    fn fit_i(&mut self, value: i64, loc: Loc) -> Option<u16> {
        match fit_signed(value) {
            Some(v) => Some(v),
            None => {
                self.diag(loc, "literal has to be up to 16 bits");
                None
            }
        }
    }

    // ======================= macros =======================

    fn handle_macro(&mut self, name: &str, lexer: &mut Lexer, loc: Loc) {
        match name {
            "include" => self.macro_include(lexer, loc),
            "label" => self.macro_label(lexer, loc, true),
            "labelv" => self.macro_label(lexer, loc, false),
            "unlabel" => {
                if let Some((name, nloc)) = self.fetch_name(lexer, loc) {
                    if self.labels.remove(&name).is_err() {
                        self.diag(nloc, format!("cannot unlabel unknown '{}'", name));
                    }
                }
            }
            "iflabel" => self.macro_conditional(lexer, loc, true),
            "ifnlabel" => self.macro_conditional(lexer, loc, false),
            // a lone %endif just closes an open (taken) conditional
            "endif" => {}
            "enum" => self.macro_enum(lexer, loc),
            "static" => self.macro_static(lexer, loc),
            "start" => self.entry_point = self.program.len() as u64,
            _ => self.diag(loc, format!("unknown macro '%{}'", name)),
        }
    }

    fn fetch_name(&mut self, lexer: &mut Lexer, at: Loc) -> Option<(String, Loc)> {
        let (token, loc) = self.next_operand_token(lexer, at)?;
        match token {
            Token::Raw(name) => Some((name, loc)),
            _ => {
                self.diag(loc, "expected a name");
                None
            }
        }
    }

    fn macro_include(&mut self, lexer: &mut Lexer, at: Loc) {
        let Some((token, loc)) = self.next_operand_token(lexer, at) else {
            return;
        };
        let Token::Str(bytes) = token else {
            self.diag(loc, "expected a quoted path after %include");
            return;
        };
        let path = String::from_utf8_lossy(&bytes).into_owned();

        if self.include_stack.len() >= MAX_INCLUDE_DEPTH {
            self.diag(loc, format!("include depth limit reached at '{}'", path));
            return;
        }
        let mother = self.include_stack.last().cloned().unwrap_or_default();
        match self.resolver.read_relative(&mother, &path) {
            Ok(source) => {
                let dir = mother.parent().unwrap_or_else(|| Path::new("."));
                self.include_stack.push(dir.join(&path));
                self.parse_source(&source);
                self.include_stack.pop();
            }
            Err(err) => self.diag(loc, format!("cannot include '{}': {}", path, err)),
        }
    }

    fn macro_label(&mut self, lexer: &mut Lexer, at: Loc, with_value: bool) {
        let Some((name, nloc)) = self.fetch_name(lexer, at) else {
            return;
        };
        let value = if with_value {
            match self.fetch_label_value(lexer) {
                Ok(value) => value,
                Err(()) => return,
            }
        } else {
            LabelValue::Uint(0)
        };
        if self.labels.add(&name, value).is_err() {
            self.diag(nloc, format!("label '{}' already defined", name));
        }
    }

    /// Optional `%label` value, up to the end of the line
    fn fetch_label_value(&mut self, lexer: &mut Lexer) -> std::result::Result<LabelValue, ()> {
        match lexer.peek() {
            None | Some(Ok(Token::Newline)) => return Ok(LabelValue::Uint(0)),
            _ => {}
        }
        let Some((token, loc)) = lexer.next() else {
            return Ok(LabelValue::Uint(0));
        };
        match token {
            Ok(Token::Raw(text)) => match parse_literal(&text) {
                Some(Literal::Uint(v)) => Ok(LabelValue::Uint(v)),
                Some(Literal::Int(v)) => Ok(LabelValue::Int(v)),
                Some(Literal::Float(v)) => Ok(LabelValue::Float(v)),
                None => {
                    self.diag(loc, format!("expected a literal, got '{}'", text));
                    Err(())
                }
            },
            Ok(Token::Char(byte)) => Ok(LabelValue::Uint(byte as u64)),
            Ok(Token::Str(bytes)) => {
                let (offset, len) = self.push_static_str(&bytes);
                Ok(LabelValue::StaticRef { offset, len })
            }
            Ok(Token::LabelRef(name)) => match self.labels.get(&name).copied() {
                Some(value) => Ok(value),
                None => {
                    self.diag(loc, format!("undefined label '${}'", name));
                    Err(())
                }
            },
            _ => {
                self.diag(loc, "expected a label value");
                Err(())
            }
        }
    }

    fn macro_conditional(&mut self, lexer: &mut Lexer, at: Loc, wanted: bool) {
        let Some((name, _)) = self.fetch_name(lexer, at) else {
            return;
        };
        if self.labels.contains(&name) == wanted {
            return; // body tokens run normally, %endif is a no-op
        }
        let mut depth = 1u32;
        while depth > 0 {
            match lexer.next() {
                None => {
                    self.diag(at, "unterminated %iflabel / %ifnlabel");
                    return;
                }
                Some((Ok(Token::Macro(m)), _)) if m == "iflabel" || m == "ifnlabel" => depth += 1,
                Some((Ok(Token::Macro(m)), _)) if m == "endif" => depth -= 1,
                _ => {}
            }
        }
    }

    /// `%enum a, b = 5, c` to end of line: auto-incrementing unsigned labels
    fn macro_enum(&mut self, lexer: &mut Lexer, at: Loc) {
        let mut counter: u64 = 0;
        loop {
            match lexer.peek() {
                None | Some(Ok(Token::Newline)) => return,
                _ => {}
            }
            let Some((token, loc)) = lexer.next() else {
                return;
            };
            match token {
                Ok(Token::Comma) => continue,
                Ok(Token::Raw(name)) => {
                    if lexer.peek() == Some(Ok(Token::Eq)) {
                        lexer.next();
                        match self.next_operand_token(lexer, at) {
                            Some((Token::Raw(text), vloc)) => match parse_literal(&text) {
                                Some(Literal::Uint(v)) => counter = v,
                                _ => self.diag(vloc, "expected an unsigned enum value"),
                            },
                            Some((_, vloc)) => self.diag(vloc, "expected an unsigned enum value"),
                            None => return,
                        }
                    }
                    if self.labels.add(&name, LabelValue::Uint(counter)).is_err() {
                        self.diag(loc, format!("label '{}' already defined", name));
                    }
                    counter += 1;
                }
                Ok(_) => self.diag(loc, "expected an enum entry name"),
                Err(()) => {
                    let slice = lexer.slice().to_string();
                    self.diag(loc, format!("unrecognized token '{}'", slice));
                }
            }
            if self.aborted {
                return;
            }
        }
    }

    fn macro_static(&mut self, lexer: &mut Lexer, at: Loc) {
        let Some((token, loc)) = self.next_operand_token(lexer, at) else {
            return;
        };
        match token {
            Token::Str(bytes) => {
                self.push_static_str(&bytes);
            }
            Token::Char(byte) => {
                self.push_static_u64(byte as u64);
            }
            Token::Raw(text) => match parse_literal(&text) {
                Some(Literal::Uint(v)) => {
                    self.push_static_u64(v);
                }
                Some(Literal::Int(v)) => {
                    self.push_static_u64(v as u64);
                }
                Some(Literal::Float(v)) => {
                    self.push_static_u64(v.to_bits());
                }
                None => self.diag(loc, format!("expected a literal, got '{}'", text)),
            },
            _ => self.diag(loc, "expected a literal or string after %static"),
        }
    }
}
