//! # VPU Runtime
//!
//! Dispatch-loop interpreter for VPU executables.
//!
//! The machine is the flat 80-byte register file, a region-tagged 64-bit
//! address space (static, stack, heap), and a data stack of u64 slots. One
//! instruction executes per cycle; each returns a signed `RIP` delta and the
//! driver keeps adding deltas until the program halts, faults, or runs off
//! its end.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vpu_runtime::{Vm, VmConfig};
//!
//! let program = vpu_assembler::assemble("MOVV RA 41\nINC RA 1\nHALT RA\n").unwrap();
//! let mut vm = Vm::new(&program, VmConfig::default()).unwrap();
//! let result = vm.run();
//! println!("status {} after {} cycles", result.status, result.cycles);
//! ```
//!
//! Faults (out-of-bounds access, division by zero, stack misuse) never
//! panic and never escape [`Vm::run`]; they halt the machine with status 1
//! and a [`HaltReason`] naming the cause. [`Vm::step`] surfaces the same
//! faults as errors for debugger-style callers.

pub mod error;
pub mod state;
pub mod memory;
pub mod io;
pub mod syscall;
pub mod execute;
pub mod vm;

pub use error::RuntimeError;
pub use io::{IoHandler, STREAM_STDERR, STREAM_STDOUT};
pub use memory::Memory;
pub use state::{HaltReason, RegisterFile};
pub use syscall::{
    HostSyscalls, SyscallHandler, SyscallStatus, SYSCALL_GET_SPECIAL_ADDRESS,
    SYSCALL_GET_SYSTEM_SPECIFICATIONS,
};
pub use vm::{ExecutionResult, Vm, VmConfig};

/// Run a program to completion on a fresh VM wired to host stdio
pub fn run(program: &vpu_spec::Program) -> Result<ExecutionResult, RuntimeError> {
    let mut vm = Vm::new(program, VmConfig::default())?;
    Ok(vm.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpu_spec::{Opcode, Program, Word};

    #[test]
    fn test_public_exports() {
        let _ = VmConfig::default();
        let _ = HaltReason::EndOfProgram;
        let _ = IoHandler::captured();
        let _ = HostSyscalls;
    }

    #[test]
    fn test_run_helper() {
        let mut program = Program::new();
        program.code = vec![Word::pack_e_lit(Opcode::Halt, 3).0];
        let result = run(&program).unwrap();
        assert_eq!(result.status, 3);
        assert_eq!(result.halt_reason, HaltReason::Halt(3));
    }
}
