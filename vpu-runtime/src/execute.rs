//! Instruction dispatch
//!
//! One decode-dispatch-mutate cycle per call. Every arm returns the signed
//! number of instruction words to add to `RIP`: 1 for sequential flow, a
//! computed delta for control flow, and a sentinel that lands `RIP` at the
//! program's end for HALT and fatal conditions. Branch deltas are relative
//! to the instruction after the branch, matching the encoder.

use vpu_spec::{Opcode, Register, VpuError, Word, STACK_BASE, STATIC_BASE};

use crate::error::{Result, RuntimeError};
use crate::state::HaltReason;
use crate::vm::Vm;

#[inline]
fn reg(byte: u8) -> Result<Register> {
    Register::from_u8(byte).ok_or(RuntimeError::Spec(VpuError::InvalidRegister(byte)))
}

#[inline]
fn reg1(word: Word) -> Result<Register> {
    reg(word.r1())
}

#[inline]
fn reg2(word: Word) -> Result<Register> {
    reg(word.r2())
}

#[inline]
fn reg3(word: Word) -> Result<Register> {
    reg(word.r3())
}

/// Base pointer plus signed byte offset, as READ/WRITE compute it
#[inline]
fn offset_addr(base: u64, offset: i64) -> u64 {
    (base as i64).wrapping_add(offset) as u64
}

impl Vm {
    /// E-profile operand: the register named in byte 1, or the inline
    /// 16-bit literal, per the hint bit.
    fn e_value(&self, word: Word) -> Result<u64> {
        if word.e_is_literal() {
            Ok(word.l1() as u64)
        } else {
            Ok(self.regs.read_u64(reg1(word)?))
        }
    }

    /// E-profile branch delta: literals are signed, registers are taken
    /// whole.
    fn e_delta(&self, word: Word) -> Result<i64> {
        if word.e_is_literal() {
            Ok(word.l1() as i16 as i64)
        } else {
            Ok(self.regs.read_i64(reg1(word)?))
        }
    }

    fn push_stack(&mut self, value: u64) -> Result<()> {
        let sp = self.regs.rsp();
        if sp >= self.memory.stack_slots() {
            return Err(RuntimeError::StackOverflow { ip: self.regs.rip() });
        }
        self.memory.set_stack_slot(sp, value)?;
        self.regs.set_rsp(sp + 1);
        Ok(())
    }

    fn pop_stack(&mut self) -> Result<u64> {
        let sp = self.regs.rsp();
        if sp == 0 {
            return Err(RuntimeError::StackUnderflow { ip: self.regs.rip() });
        }
        let value = self.memory.stack_slot(sp - 1)?;
        self.regs.set_rsp(sp - 1);
        Ok(value)
    }

    /// Stack slot `literal` positions below the stack pointer (GET/PUT)
    fn stack_index(&self, literal: u16) -> Result<u64> {
        self.regs
            .rsp()
            .checked_sub(literal as u64)
            .ok_or(RuntimeError::StackUnderflow { ip: self.regs.rip() })
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            self.io.put_char(byte, 0, false)?;
        }
        self.io.put_char(b'\n', 0, true)
    }

    pub(crate) fn dispatch(&mut self, word: Word) -> Result<i64> {
        let ip = self.regs.rip();
        let op = word
            .opcode()
            .ok_or(RuntimeError::Spec(VpuError::InvalidOpcode(word.opcode_byte())))?;

        match op {
            // ---------------- basics ----------------
            Opcode::Nop => Ok(1),

            Opcode::Halt => {
                let status = if word.e_is_literal() {
                    word.l1() as i64
                } else {
                    self.regs.read_i8(reg1(word)?) as i64
                };
                self.halt(HaltReason::Halt(status));
                Ok(self.halt_delta())
            }

            // ---------------- data movement ----------------
            Opcode::Mov8 => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_u8(b);
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Mov16 => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_u16(b);
                self.regs.write_u16(a, v);
                Ok(1)
            }
            Opcode::Mov32 => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_u32(b);
                self.regs.write_u32(a, v);
                Ok(1)
            }
            Opcode::Mov => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_u64(b);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Movv => {
                self.regs.write_u64(reg1(word)?, word.l2() as u64);
                Ok(1)
            }
            Opcode::Movv16 => {
                self.regs.write_u16(reg1(word)?, word.l2());
                Ok(1)
            }
            Opcode::Movn => {
                self.regs.write_u64(reg1(word)?, !(word.l2() as u64));
                Ok(1)
            }
            Opcode::Movc => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                if self.regs.read_u64(a) != 0 {
                    let v = self.regs.read_u64(c);
                    self.regs.write_u64(b, v);
                }
                Ok(1)
            }

            // ---------------- data stack ----------------
            Opcode::Push => {
                let value = self.e_value(word)?;
                self.push_stack(value)?;
                Ok(1)
            }
            Opcode::Pop => {
                let value = self.pop_stack()?;
                self.regs.write_u64(reg1(word)?, value);
                Ok(1)
            }
            Opcode::Get => {
                let index = self.stack_index(word.l2())?;
                let value = self.memory.stack_slot(index)?;
                self.regs.write_u64(reg1(word)?, value);
                Ok(1)
            }
            Opcode::Put => {
                let index = self.stack_index(word.l2())?;
                let value = self.regs.read_u64(reg1(word)?);
                self.memory.set_stack_slot(index, value)?;
                Ok(1)
            }
            Opcode::Gsp => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let slot = self.regs.read_u64(b);
                let byte = self.regs.read_u64(c);
                self.regs.write_u64(
                    a,
                    STACK_BASE
                        .wrapping_add(slot.wrapping_mul(8))
                        .wrapping_add(byte),
                );
                Ok(1)
            }
            Opcode::Static => {
                let offset = self.e_value(word)?;
                self.push_stack(STATIC_BASE.wrapping_add(offset))?;
                Ok(1)
            }

            // ---------------- memory ----------------
            Opcode::Read8 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(b), self.regs.read_i64(c));
                let v = self.memory.read_u8(addr)?;
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Read16 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(b), self.regs.read_i64(c));
                let v = self.memory.read_u16(addr)?;
                self.regs.write_u16(a, v);
                Ok(1)
            }
            Opcode::Read32 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(b), self.regs.read_i64(c));
                let v = self.memory.read_u32(addr)?;
                self.regs.write_u32(a, v);
                Ok(1)
            }
            Opcode::Read => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(b), self.regs.read_i64(c));
                let v = self.memory.read_u64(addr)?;
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Write8 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(a), self.regs.read_i64(c));
                self.memory.write_u8(addr, self.regs.read_u8(b))?;
                Ok(1)
            }
            Opcode::Write16 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(a), self.regs.read_i64(c));
                self.memory.write_u16(addr, self.regs.read_u16(b))?;
                Ok(1)
            }
            Opcode::Write32 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(a), self.regs.read_i64(c));
                self.memory.write_u32(addr, self.regs.read_u32(b))?;
                Ok(1)
            }
            Opcode::Write => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let addr = offset_addr(self.regs.read_u64(a), self.regs.read_i64(c));
                self.memory.write_u64(addr, self.regs.read_u64(b))?;
                Ok(1)
            }
            Opcode::Memset => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let dst = self.regs.read_u64(a);
                let byte = self.regs.read_u8(b);
                let len = self.regs.read_u64(c);
                self.memory.memset(dst, byte, len)?;
                Ok(1)
            }
            Opcode::Memcpy | Opcode::Memmov => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let dst = self.regs.read_u64(a);
                let src = self.regs.read_u64(b);
                let len = self.regs.read_u64(c);
                self.memory.copy(dst, src, len)?;
                Ok(1)
            }
            Opcode::Memcmp => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let lhs = self.regs.read_u64(a);
                let rhs = self.regs.read_u64(b);
                let len = self.regs.read_u64(c);
                let cmp = self.memory.compare(lhs, rhs, len)?;
                self.regs.write_u8(a, cmp as u8);
                Ok(1)
            }
            Opcode::Malloc => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let size = self.regs.read_u64(b);
                let addr = self.memory.malloc(size)?;
                self.regs.write_u64(a, addr);
                Ok(1)
            }
            Opcode::Free => {
                let addr = self.regs.read_u64(reg1(word)?);
                self.memory.free(addr)?;
                Ok(1)
            }

            // ---------------- logic ----------------
            Opcode::Not => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = u64::from(self.regs.read_u64(b) == 0);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Neg => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = !self.regs.read_u64(b) | self.regs.read_u64(c);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::And => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u64(b) & self.regs.read_u64(c);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Nand => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = !(self.regs.read_u64(b) & self.regs.read_u64(c));
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Or => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u64(b) | self.regs.read_u64(c);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Xor => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u64(b) ^ self.regs.read_u64(c);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Bshift => {
                // negative count shifts right; counts past 63 drain to zero
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let value = self.regs.read_u64(b);
                let count = self.regs.read_i8(c) as i32;
                let v = if count < 0 {
                    value.checked_shr((-count) as u32).unwrap_or(0)
                } else {
                    value.checked_shl(count as u32).unwrap_or(0)
                };
                self.regs.write_u64(a, v);
                Ok(1)
            }

            // ---------------- control flow ----------------
            Opcode::Jmp => Ok(1 + self.e_delta(word)?),
            Opcode::Jmpf => {
                if self.regs.read_u8(reg1(word)?) != 0 {
                    Ok(1 + word.l2() as i16 as i64)
                } else {
                    Ok(1)
                }
            }
            Opcode::Jmpfn => {
                if self.regs.read_u8(reg1(word)?) == 0 {
                    Ok(1 + word.l2() as i16 as i64)
                } else {
                    Ok(1)
                }
            }
            Opcode::Call => {
                self.push_stack(ip + 1)?;
                Ok(1 + self.e_delta(word)?)
            }
            Opcode::Ret => {
                let target = self.pop_stack()?;
                self.regs.set_rip(target);
                Ok(0)
            }

            // ---------------- integer arithmetic ----------------
            Opcode::Add8 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u8(b).wrapping_add(self.regs.read_u8(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Sub8 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u8(b).wrapping_sub(self.regs.read_u8(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Mul8 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u8(b).wrapping_mul(self.regs.read_u8(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Add16 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u16(b).wrapping_add(self.regs.read_u16(c));
                self.regs.write_u16(a, v);
                Ok(1)
            }
            Opcode::Sub16 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u16(b).wrapping_sub(self.regs.read_u16(c));
                self.regs.write_u16(a, v);
                Ok(1)
            }
            Opcode::Mul16 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u16(b).wrapping_mul(self.regs.read_u16(c));
                self.regs.write_u16(a, v);
                Ok(1)
            }
            Opcode::Add32 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u32(b).wrapping_add(self.regs.read_u32(c));
                self.regs.write_u32(a, v);
                Ok(1)
            }
            Opcode::Sub32 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u32(b).wrapping_sub(self.regs.read_u32(c));
                self.regs.write_u32(a, v);
                Ok(1)
            }
            Opcode::Mul32 => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u32(b).wrapping_mul(self.regs.read_u32(c));
                self.regs.write_u32(a, v);
                Ok(1)
            }
            Opcode::Add => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u64(b).wrapping_add(self.regs.read_u64(c));
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Sub => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u64(b).wrapping_sub(self.regs.read_u64(c));
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Mul => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_u64(b).wrapping_mul(self.regs.read_u64(c));
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Divi => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let divisor = self.regs.read_i64(c);
                if divisor == 0 {
                    return Err(RuntimeError::DivisionByZero { ip });
                }
                let v = self.regs.read_i64(b).wrapping_div(divisor);
                self.regs.write_i64(a, v);
                Ok(1)
            }
            Opcode::Divu => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let divisor = self.regs.read_u64(c);
                if divisor == 0 {
                    return Err(RuntimeError::DivisionByZero { ip });
                }
                let v = self.regs.read_u64(b) / divisor;
                self.regs.write_u64(a, v);
                Ok(1)
            }

            // ---------------- float arithmetic ----------------
            Opcode::Addf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_f64(b) + self.regs.read_f64(c);
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Subf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_f64(b) - self.regs.read_f64(c);
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Mulf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_f64(b) * self.regs.read_f64(c);
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Divf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_f64(b) / self.regs.read_f64(c);
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Inc => {
                let a = reg1(word)?;
                let v = self.regs.read_u64(a).wrapping_add(word.l2() as u64);
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Dec => {
                let a = reg1(word)?;
                let v = self.regs.read_i64(a).wrapping_sub(word.l2() as i64);
                self.regs.write_i64(a, v);
                Ok(1)
            }
            Opcode::Incf => {
                let a = reg1(word)?;
                let v = self.regs.read_f64(a) + word.l2() as f64;
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Decf => {
                let a = reg1(word)?;
                let v = self.regs.read_f64(a) - word.l2() as f64;
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Abs => {
                // absolute difference
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self
                    .regs
                    .read_i64(b)
                    .wrapping_sub(self.regs.read_i64(c))
                    .wrapping_abs();
                self.regs.write_i64(a, v);
                Ok(1)
            }
            Opcode::Absf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = (self.regs.read_f64(b) - self.regs.read_f64(c)).abs();
                self.regs.write_f64(a, v);
                Ok(1)
            }

            // ---------------- comparisons ----------------
            Opcode::Eq => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_u64(b) == self.regs.read_u64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Neq => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_u64(b) != self.regs.read_u64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Eqf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_f64(b) == self.regs.read_f64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Neqf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_f64(b) != self.regs.read_f64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Bigi => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_i64(b) > self.regs.read_i64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Bigu => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_u64(b) > self.regs.read_u64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Bigf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_f64(b) > self.regs.read_f64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Smli => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_i64(b) < self.regs.read_i64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Smlu => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_u64(b) < self.regs.read_u64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }
            Opcode::Smlf => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = u8::from(self.regs.read_f64(b) < self.regs.read_f64(c));
                self.regs.write_u8(a, v);
                Ok(1)
            }

            // ---------------- casts ----------------
            Opcode::Castiu => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_u64(b) as i64;
                self.regs.write_i64(a, v);
                Ok(1)
            }
            Opcode::Castif => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_f64(b) as i64;
                self.regs.write_i64(a, v);
                Ok(1)
            }
            Opcode::Castui => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_i64(b) as u64;
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Castuf => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_f64(b) as u64;
                self.regs.write_u64(a, v);
                Ok(1)
            }
            Opcode::Castfi => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_i64(b) as f64;
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Castfu => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_u64(b) as f64;
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Cf3264 => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_f64(b) as f32;
                self.regs.write_f32(a, v);
                Ok(1)
            }
            Opcode::Cf6432 => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let v = self.regs.read_f32(b) as f64;
                self.regs.write_f64(a, v);
                Ok(1)
            }
            Opcode::Float => {
                // fraction of two integer registers
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let v = self.regs.read_i64(b) as f64 / self.regs.read_u64(c) as f64;
                self.regs.write_f64(a, v);
                Ok(1)
            }

            // ---------------- I/O & syscall ----------------
            Opcode::Putc => {
                let (a, b, c) = (reg1(word)?, reg2(word)?, reg3(word)?);
                let byte = self.regs.read_u32(a) as u8;
                let stream = self.regs.read_u64(b);
                let flush = self.regs.read_u8(c) != 0;
                self.io.put_char(byte, stream, flush)?;
                Ok(1)
            }
            Opcode::Getc => {
                let a = reg1(word)?;
                let v = self.io.get_char();
                self.regs.write_u32(a, v as u32);
                Ok(1)
            }
            Opcode::Fopen => {
                let (a, b) = (reg1(word)?, reg2(word)?);
                let path_addr = self.regs.read_u64(b);
                let path_bytes = self.memory.read_cstr(path_addr)?;
                let path = String::from_utf8_lossy(&path_bytes).into_owned();
                // an open failure is reported as handle 0, not a fault
                let handle = self.io.fopen(&path).unwrap_or(0);
                self.regs.write_u64(a, handle);
                Ok(1)
            }
            Opcode::Fclose => {
                let handle = self.regs.read_u64(reg1(word)?);
                self.io.fclose(handle)?;
                Ok(1)
            }
            Opcode::Exec => {
                // run the low 32 bits of the register as an instruction;
                // a nested EXEC would recurse without bound
                let inner = Word(self.regs.read_u32(reg1(word)?));
                if inner.opcode() == Some(Opcode::Exec) {
                    return Err(RuntimeError::NestedExec { ip });
                }
                self.dispatch(inner)
            }
            Opcode::Sys => {
                let id = self.e_value(word)?;
                let status = self.syscalls.call(&mut self.regs, id);
                if status != 0 {
                    self.halt(HaltReason::SyscallFailed { ip, id });
                    return Ok(self.halt_delta());
                }
                Ok(1)
            }
            Opcode::Disreg => {
                let a = reg1(word)?;
                let line = format!(
                    "{} = ({:#018x}; u: {}; i: {}; f: {})",
                    a,
                    self.regs.read_u64(a),
                    self.regs.read_u64(a),
                    self.regs.read_i64(a),
                    self.regs.read_f64(a),
                );
                self.write_line(&line)?;
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HaltReason;
    use crate::vm::{Vm, VmConfig};
    use vpu_spec::{Program, HEAP_BASE};

    fn vm_for(words: Vec<u32>) -> Vm {
        let mut program = Program::new();
        program.code = words;
        Vm::captured(&program, VmConfig::default()).unwrap()
    }

    fn vm_with_static(words: Vec<u32>, payload: &[u8]) -> Vm {
        let mut program = Program::new();
        program.code = words;
        program.static_mem.extend_from_slice(payload);
        let size = program.static_mem.len() as u64;
        program.static_mem[..8].copy_from_slice(&size.to_le_bytes());
        Vm::captured(&program, VmConfig::default()).unwrap()
    }

    use Register::{RA, RB, RC, RD};

    #[test]
    fn test_movv_and_add() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 5).0,
            Word::pack_rl(Opcode::Movv, RB, 7).0,
            Word::pack_rrr(Opcode::Add, RC, RA, RB).0,
            Word::pack_e_reg(Opcode::Halt, RC).0,
        ]);
        let result = vm.run();
        assert_eq!(result.status, 12);
        assert_eq!(result.cycles, 4);
    }

    #[test]
    fn test_movn_loads_complement() {
        let mut vm = vm_for(vec![Word::pack_rl(Opcode::Movn, RA, 2).0]);
        vm.step().unwrap();
        assert_eq!(vm.regs().read_i64(RA), -3);
    }

    #[test]
    fn test_movc_is_conditional() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RC, 9).0,
            Word::pack_rrr(Opcode::Movc, RA, RB, RC).0, // RA == 0, no move
            Word::pack_rl(Opcode::Movv, RA, 1).0,
            Word::pack_rrr(Opcode::Movc, RA, RB, RC).0, // RA != 0, move
        ]);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RB), 9);
    }

    #[test]
    fn test_narrow_arithmetic_wraps() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 0xFFFF).0,
            Word::pack_rl(Opcode::Movv, RB, 1).0,
            Word::pack_rrr(Opcode::Add8, RC, RA, RB).0,
            Word::pack_rrr(Opcode::Add16, RD, RA, RB).0,
        ]);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RC), 0); // 0xFF + 1 wraps the low byte
        assert_eq!(vm.regs().read_u64(RD), 0); // 0xFFFF + 1 wraps 16 bits
    }

    #[test]
    fn test_narrow_write_preserves_destination_upper_bytes() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 3).0,
            Word::pack_rl(Opcode::Movv, RB, 4).0,
            Word::pack_rrr(Opcode::Add8, RC, RA, RB).0,
        ]);
        vm.regs_mut().write_u64(RC, u64::MAX);
        for _ in 0..3 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RC), (u64::MAX << 8) | 7);
    }

    #[test]
    fn test_division_semantics() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movn, RA, 6).0, // RA = -7
            Word::pack_rl(Opcode::Movv, RB, 2).0,
            Word::pack_rrr(Opcode::Divi, RC, RA, RB).0,
        ]);
        for _ in 0..3 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_i64(RC), -3); // truncating division
    }

    #[test]
    fn test_division_by_zero_faults() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 4).0,
            Word::pack_rrr(Opcode::Divu, RC, RA, RB).0,
        ]);
        let result = vm.run();
        assert_eq!(result.status, 1);
        assert!(matches!(result.halt_reason, HaltReason::Fault(_)));
    }

    #[test]
    fn test_not_is_logical() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 5).0,
            Word::pack_rr(Opcode::Not, RB, RA).0,
            Word::pack_rr(Opcode::Not, RC, RB).0,
        ]);
        for _ in 0..3 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RB), 0);
        assert_eq!(vm.regs().read_u64(RC), 1);
    }

    #[test]
    fn test_bshift_both_directions() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 1).0,
            Word::pack_rl(Opcode::Movv, RB, 4).0,
            Word::pack_rrr(Opcode::Bshift, RC, RA, RB).0, // 1 << 4
            Word::pack_rl(Opcode::Movn, RB, 1).0,         // RB = -2
            Word::pack_rrr(Opcode::Bshift, RD, RC, RB).0, // 16 >> 2
        ]);
        for _ in 0..5 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RC), 16);
        assert_eq!(vm.regs().read_u64(RD), 4);
    }

    #[test]
    fn test_push_pop_get_put() {
        let mut vm = vm_for(vec![
            Word::pack_e_lit(Opcode::Push, 11).0,
            Word::pack_e_lit(Opcode::Push, 22).0,
            Word::pack_rl(Opcode::Get, RA, 2).0, // two below the top: 11
            Word::pack_rl(Opcode::Movv, RB, 99).0,
            Word::pack_rl(Opcode::Put, RB, 1).0, // overwrite the top
            Word::pack_r(Opcode::Pop, RC).0,
        ]);
        for _ in 0..6 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RA), 11);
        assert_eq!(vm.regs().read_u64(RC), 99);
        assert_eq!(vm.regs().rsp(), 1);
    }

    #[test]
    fn test_stack_underflow_faults() {
        let mut vm = vm_for(vec![Word::pack_r(Opcode::Pop, RA).0]);
        let result = vm.run();
        assert_eq!(result.status, 1);
        assert!(matches!(result.halt_reason, HaltReason::Fault(_)));
    }

    #[test]
    fn test_call_and_ret() {
        // 0: CALL +2 (to 3)   1: MOVV RB 5   2: HALT RB   3: MOVV RA 9   4: RET
        let mut vm = vm_for(vec![
            Word::pack_e_lit(Opcode::Call, 2).0,
            Word::pack_rl(Opcode::Movv, RB, 5).0,
            Word::pack_e_reg(Opcode::Halt, RB).0,
            Word::pack_rl(Opcode::Movv, RA, 9).0,
            Word::pack_none(Opcode::Ret).0,
        ]);
        let result = vm.run();
        assert_eq!(result.status, 5);
        assert_eq!(vm.regs().read_u64(RA), 9);
    }

    #[test]
    fn test_jmpf_tests_low_byte() {
        // RA = 0x100: low byte is zero, so JMPF falls through
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 0x100).0,
            Word::pack_rl(Opcode::Jmpf, RA, 1).0,
            Word::pack_e_lit(Opcode::Halt, 3).0,
            Word::pack_e_lit(Opcode::Halt, 4).0,
        ]);
        assert_eq!(vm.run().status, 3);
    }

    #[test]
    fn test_register_jump_is_relative() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 1).0,
            Word::pack_e_reg(Opcode::Jmp, RA).0, // skip one instruction
            Word::pack_e_lit(Opcode::Halt, 3).0,
            Word::pack_e_lit(Opcode::Halt, 4).0,
        ]);
        assert_eq!(vm.run().status, 4);
    }

    #[test]
    fn test_static_pushes_address() {
        let mut vm = vm_with_static(
            vec![
                Word::pack_e_lit(Opcode::Static, 8).0,
                Word::pack_r(Opcode::Pop, RA).0,
                Word::pack_rrr(Opcode::Read8, RB, RA, RC).0,
            ],
            b"hi\0",
        );
        for _ in 0..3 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RA), STATIC_BASE + 8);
        assert_eq!(vm.regs().read_u8(RB), b'h');
    }

    #[test]
    fn test_read_write_with_signed_offset() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RB, 16).0,
            Word::pack_rr(Opcode::Malloc, RA, RB).0,
            Word::pack_rl(Opcode::Movv, RC, 0x77).0,
            Word::pack_rrr(Opcode::Write8, RA, RC, RD).0, // heap[0] = 0x77
            Word::pack_rl(Opcode::Inc, RA, 4).0,
            Word::pack_rl(Opcode::Movn, RD, 3).0,         // RD = -4
            Word::pack_rrr(Opcode::Read8, RB, RA, RD).0,  // read heap[4 - 4]
        ]);
        for _ in 0..7 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u8(RB), 0x77);
    }

    #[test]
    fn test_memory_out_of_bounds_faults() {
        let mut vm = vm_for(vec![
            Word::pack_rrr(Opcode::Read, RA, RB, RC).0, // RB == 0, unmapped
        ]);
        let result = vm.run();
        assert_eq!(result.status, 1);
    }

    #[test]
    fn test_malloc_free_cycle() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RB, 8).0,
            Word::pack_rr(Opcode::Malloc, RA, RB).0,
            Word::pack_r(Opcode::Free, RA).0,
            Word::pack_r(Opcode::Free, RA).0, // double free
        ]);
        let result = vm.run();
        assert_eq!(vm.regs().read_u64(RA), HEAP_BASE);
        assert_eq!(result.status, 1);
        assert!(matches!(result.halt_reason, HaltReason::Fault(_)));
    }

    #[test]
    fn test_malloc_of_huge_size_faults() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RB, 8).0,
            Word::pack_rr(Opcode::Malloc, RA, RB).0,
            Word::pack_rl(Opcode::Movn, RC, 0).0, // RC = u64::MAX
            Word::pack_rr(Opcode::Malloc, RD, RC).0,
        ]);
        let result = vm.run();
        assert_eq!(result.status, 1);
        assert!(matches!(result.halt_reason, HaltReason::Fault(_)));
    }

    #[test]
    fn test_memcpy_of_huge_length_faults() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RB, 8).0,
            Word::pack_rr(Opcode::Malloc, RA, RB).0,
            Word::pack_rl(Opcode::Movn, RC, 0).0, // RC = u64::MAX
            Word::pack_rrr(Opcode::Memcpy, RA, RA, RC).0,
        ]);
        let result = vm.run();
        assert_eq!(result.status, 1);
        assert!(matches!(result.halt_reason, HaltReason::Fault(_)));
    }

    #[test]
    fn test_float_pipeline() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 7).0,
            Word::pack_rl(Opcode::Movv, RB, 2).0,
            Word::pack_rrr(Opcode::Float, RC, RA, RB).0, // 7 / 2 = 3.5
            Word::pack_rrr(Opcode::Addf, RC, RC, RC).0,  // 7.0
            Word::pack_rr(Opcode::Castif, RD, RC).0,
        ]);
        for _ in 0..5 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_f64(RC), 7.0);
        assert_eq!(vm.regs().read_i64(RD), 7);
    }

    #[test]
    fn test_float32_round_trip() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 3).0,
            Word::pack_rr(Opcode::Castfu, RB, RA).0, // 3.0 f64
            Word::pack_rr(Opcode::Cf3264, RC, RB).0,
            Word::pack_rr(Opcode::Cf6432, RD, RC).0,
        ]);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_f32(RC), 3.0);
        assert_eq!(vm.regs().read_f64(RD), 3.0);
    }

    #[test]
    fn test_comparisons_write_booleans() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movn, RA, 0).0, // -1
            Word::pack_rl(Opcode::Movv, RB, 1).0,
            Word::pack_rrr(Opcode::Smli, RC, RA, RB).0, // -1 < 1 signed
            Word::pack_rrr(Opcode::Smlu, RD, RA, RB).0, // huge < 1 unsigned
        ]);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u8(RC), 1);
        assert_eq!(vm.regs().read_u8(RD), 0);
    }

    #[test]
    fn test_abs_is_absolute_difference() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 3).0,
            Word::pack_rl(Opcode::Movv, RB, 10).0,
            Word::pack_rrr(Opcode::Abs, RC, RA, RB).0,
        ]);
        for _ in 0..3 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RC), 7);
    }

    #[test]
    fn test_putc_getc() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, b'V' as u16).0,
            Word::pack_rrr(Opcode::Putc, RA, RB, RC).0, // stream 0 = stdout
            Word::pack_r(Opcode::Getc, RD).0,
        ]);
        vm.io_mut().feed_stdin(b"x");
        for _ in 0..3 {
            vm.step().unwrap();
        }
        assert_eq!(vm.io().stdout(), b"V");
        assert_eq!(vm.regs().read_u32(RD), b'x' as u32);
    }

    #[test]
    fn test_getc_end_of_input() {
        let mut vm = vm_for(vec![Word::pack_r(Opcode::Getc, RA).0]);
        vm.step().unwrap();
        assert_eq!(vm.regs().read_u32(RA) as i32, -1);
    }

    #[test]
    fn test_exec_runs_register_as_instruction() {
        let movv = Word::pack_rl(Opcode::Movv, RB, 42).0;
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, (movv & 0xFFFF) as u16).0,
            Word::pack_rl(Opcode::Movv, RC, (movv >> 16) as u16).0,
            Word::pack_rl(Opcode::Movv, RD, 16).0,
            Word::pack_rrr(Opcode::Bshift, RC, RC, RD).0,
            Word::pack_rrr(Opcode::Or, RA, RA, RC).0,
            Word::pack_r(Opcode::Exec, RA).0,
        ]);
        for _ in 0..6 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(RB), 42);
    }

    #[test]
    fn test_exec_of_exec_faults() {
        // RA holds the encoding of the EXEC RA instruction itself
        let exec_ra = Word::pack_r(Opcode::Exec, RA).0;
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, exec_ra as u16).0,
            exec_ra,
        ]);
        let result = vm.run();
        assert_eq!(result.status, 1);
        assert!(matches!(result.halt_reason, HaltReason::Fault(_)));
    }

    #[test]
    fn test_sys_failure_halts_with_status_one() {
        let mut vm = vm_for(vec![
            Word::pack_e_lit(Opcode::Sys, 0xEE).0,
            Word::pack_e_lit(Opcode::Halt, 7).0,
        ]);
        let result = vm.run();
        assert_eq!(
            result.halt_reason,
            HaltReason::SyscallFailed { ip: 0, id: 0xEE }
        );
        assert_eq!(result.status, 1);
    }

    #[test]
    fn test_sys_get_special_address() {
        let mut vm = vm_for(vec![
            Word::pack_e_lit(Opcode::Sys, 0).0, // RA = 0 selects static
        ]);
        vm.step().unwrap();
        assert_eq!(vm.regs().read_u64(RA), STATIC_BASE);
    }

    #[test]
    fn test_disreg_writes_to_stdout() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, RA, 5).0,
            Word::pack_r(Opcode::Disreg, RA).0,
        ]);
        for _ in 0..2 {
            vm.step().unwrap();
        }
        let text = String::from_utf8_lossy(vm.io().stdout()).into_owned();
        assert!(text.starts_with("RA = ("));
        assert!(text.contains("u: 5"));
    }

    #[test]
    fn test_r0_stays_zero() {
        let mut vm = vm_for(vec![
            Word::pack_rl(Opcode::Movv, Register::R0, 9).0,
            Word::pack_rrr(Opcode::Add, RA, Register::R0, Register::R0).0,
        ]);
        for _ in 0..2 {
            vm.step().unwrap();
        }
        assert_eq!(vm.regs().read_u64(Register::R0), 0);
        assert_eq!(vm.regs().read_u64(RA), 0);
    }
}
