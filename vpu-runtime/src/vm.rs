//! Virtual machine driver
//!
//! Owns the register file, the data stack, memory, and the I/O and syscall
//! planes. The driving loop is the original's: start `RIP` at the entry
//! point, and keep adding the signed delta each instruction returns until
//! `RIP` leaves the program or the machine halts.

use std::sync::Arc;

use tracing::trace;
use vpu_spec::{Program, VpuError, Word, DEFAULT_HEAP_LIMIT, DEFAULT_STACK_SLOTS};

use crate::error::{Result, RuntimeError};
use crate::io::IoHandler;
use crate::memory::Memory;
use crate::state::{HaltReason, RegisterFile};
use crate::syscall::{HostSyscalls, SyscallHandler};

/// VM configuration
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Data stack size in u64 slots
    pub stack_slots: usize,

    /// Heap growth bound in bytes
    pub heap_limit: u64,

    /// Maximum number of instructions before halting
    pub max_cycles: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_slots: DEFAULT_STACK_SLOTS,
            heap_limit: DEFAULT_HEAP_LIMIT,
            max_cycles: 10_000_000,
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Process-style exit status
    pub status: i64,

    /// Instructions executed
    pub cycles: u64,

    /// Why the machine stopped
    pub halt_reason: HaltReason,
}

/// The virtual machine
pub struct Vm {
    pub(crate) regs: RegisterFile,
    pub(crate) memory: Memory,
    pub(crate) io: IoHandler,
    pub(crate) syscalls: Box<dyn SyscallHandler>,
    /// Shared instruction image; several VMs may run the same program
    pub(crate) code: Arc<[u32]>,
    pub(crate) halt: Option<HaltReason>,
    cycles: u64,
    config: VmConfig,
}

impl Vm {
    /// VM wired to host stdio and the default syscall plane
    pub fn new(program: &Program, config: VmConfig) -> Result<Self> {
        Self::with_io(program, config, IoHandler::new())
    }

    /// VM with all I/O captured in memory
    pub fn captured(program: &Program, config: VmConfig) -> Result<Self> {
        Self::with_io(program, config, IoHandler::captured())
    }

    pub fn with_io(program: &Program, config: VmConfig, io: IoHandler) -> Result<Self> {
        program.validate().map_err(RuntimeError::Spec)?;
        let memory = Memory::new(
            program.static_mem.clone(),
            config.stack_slots,
            config.heap_limit,
        );
        let mut regs = RegisterFile::new();
        regs.set_rip(program.entry_point);
        Ok(Self {
            regs,
            memory,
            io,
            syscalls: Box::new(HostSyscalls),
            code: program.code.clone().into(),
            halt: None,
            cycles: 0,
            config,
        })
    }

    /// Replace the syscall plane
    pub fn set_syscall_handler(&mut self, handler: Box<dyn SyscallHandler>) {
        self.syscalls = handler;
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn io(&self) -> &IoHandler {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IoHandler {
        &mut self.io
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub(crate) fn halt(&mut self, reason: HaltReason) {
        if self.halt.is_none() {
            self.halt = Some(reason);
        }
    }

    /// Delta that pushes `RIP` to the end of the program
    pub(crate) fn halt_delta(&self) -> i64 {
        self.code.len() as i64 - self.regs.rip() as i64
    }

    /// Execute exactly one instruction, returning the new `RIP`.
    ///
    /// The single-step primitive the debugger surface consumes; faults come
    /// back as errors instead of halting the machine.
    pub fn step(&mut self) -> Result<u64> {
        let ip = self.regs.rip();
        let word = match self.code.get(ip as usize) {
            Some(&raw) => Word(raw),
            None => {
                self.halt(HaltReason::EndOfProgram);
                return Ok(ip);
            }
        };
        trace!(ip, word = format_args!("{:#010x}", word.0), "step");
        let delta = self.dispatch(word)?;
        // RET rewrites RIP itself and returns 0
        let rip = self.regs.rip();
        self.regs.set_rip((rip as i64).wrapping_add(delta) as u64);
        self.cycles += 1;
        Ok(self.regs.rip())
    }

    /// Run to completion. Faults halt the machine with status 1; they never
    /// escape as errors.
    pub fn run(&mut self) -> ExecutionResult {
        while self.halt.is_none() {
            let ip = self.regs.rip();
            if ip >= self.code.len() as u64 {
                self.halt = Some(HaltReason::EndOfProgram);
                break;
            }
            if self.cycles >= self.config.max_cycles {
                self.halt = Some(HaltReason::CycleLimit);
                break;
            }
            if let Err(err) = self.step() {
                let reason = match err {
                    RuntimeError::Spec(VpuError::InvalidOpcode(byte)) => {
                        HaltReason::InvalidOpcode { ip, byte }
                    }
                    other => HaltReason::Fault(other.to_string()),
                };
                trace!(ip, reason = ?reason, "fault");
                self.halt = Some(reason);
            }
        }

        let halt_reason = self
            .halt
            .clone()
            .unwrap_or(HaltReason::EndOfProgram);
        ExecutionResult {
            status: halt_reason.status(),
            cycles: self.cycles,
            halt_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpu_spec::{Opcode, Register};

    fn program(words: Vec<u32>) -> Program {
        let mut program = Program::new();
        program.code = words;
        program
    }

    #[test]
    fn test_empty_program_ends_cleanly() {
        let mut vm = Vm::captured(&program(vec![]), VmConfig::default()).unwrap();
        let result = vm.run();
        assert_eq!(result.halt_reason, HaltReason::EndOfProgram);
        assert_eq!(result.status, 0);
        assert_eq!(result.cycles, 0);
    }

    #[test]
    fn test_halt_literal_status() {
        let code = vec![Word::pack_e_lit(Opcode::Halt, 7).0];
        let mut vm = Vm::captured(&program(code), VmConfig::default()).unwrap();
        let result = vm.run();
        assert_eq!(result.halt_reason, HaltReason::Halt(7));
        assert_eq!(result.status, 7);
        assert_eq!(result.cycles, 1);
    }

    #[test]
    fn test_cycle_limit() {
        // JMP -1 spins on itself
        let code = vec![Word::pack_e_lit(Opcode::Jmp, (-1i16) as u16).0];
        let config = VmConfig {
            max_cycles: 50,
            ..VmConfig::default()
        };
        let mut vm = Vm::captured(&program(code), config).unwrap();
        let result = vm.run();
        assert_eq!(result.halt_reason, HaltReason::CycleLimit);
        assert_eq!(result.cycles, 50);
    }

    #[test]
    fn test_invalid_opcode_faults() {
        let code = vec![0x0000_002Fu32, Word::pack_e_lit(Opcode::Halt, 0).0];
        let mut vm = Vm::captured(&program(code), VmConfig::default()).unwrap();
        let result = vm.run();
        assert_eq!(
            result.halt_reason,
            HaltReason::InvalidOpcode { ip: 0, byte: 0x2F }
        );
        assert_eq!(result.status, 1);
        assert_eq!(result.cycles, 0);
    }

    #[test]
    fn test_entry_point_out_of_range_rejected() {
        let mut p = program(vec![0]);
        p.entry_point = 5;
        assert!(Vm::captured(&p, VmConfig::default()).is_err());
    }

    #[test]
    fn test_single_step_reports_new_rip() {
        let code = vec![
            Word::pack_rl(Opcode::Movv, Register::RA, 9).0,
            Word::pack_e_lit(Opcode::Halt, 0).0,
        ];
        let mut vm = Vm::captured(&program(code), VmConfig::default()).unwrap();
        assert_eq!(vm.step().unwrap(), 1);
        assert_eq!(vm.regs().read_u64(Register::RA), 9);
        assert!(!vm.is_halted());
    }

    #[test]
    fn test_two_vms_share_one_program() {
        let code = vec![
            Word::pack_rl(Opcode::Movv, Register::RA, 3).0,
            Word::pack_e_reg(Opcode::Halt, Register::RA).0,
        ];
        let p = program(code);
        let mut a = Vm::captured(&p, VmConfig::default()).unwrap();
        let mut b = Vm::captured(&p, VmConfig::default()).unwrap();
        assert_eq!(a.run().status, 3);
        assert_eq!(b.run().status, 3);
    }
}
