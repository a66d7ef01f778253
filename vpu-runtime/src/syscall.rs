//! Syscall plane
//!
//! The SYS opcode hands the register file and a numeric call id to a
//! [`SyscallHandler`]. Arguments travel in `RA..` and results come back in
//! the same registers, by convention only. A non-zero status from the
//! handler halts the VM with status 1.

use vpu_spec::{Register, HEAP_BASE, STACK_BASE, STATIC_BASE};

use crate::state::RegisterFile;

/// Resolve a memory region base address. `RA` selects the region
/// (0 = static, 1 = stack, 2 = heap); the address comes back in `RA`.
pub const SYSCALL_GET_SPECIAL_ADDRESS: u64 = 0;

/// Describe the host. `RA` comes back with bit 0 set on a little-endian
/// machine.
pub const SYSCALL_GET_SYSTEM_SPECIFICATIONS: u64 = 1;

/// Syscall status: zero is success, anything else halts the VM
pub type SyscallStatus = u64;

pub trait SyscallHandler {
    fn call(&mut self, regs: &mut RegisterFile, id: u64) -> SyscallStatus;
}

/// The default syscall plane. Dynamic-library loading ids from the original
/// surface are not carried; any unknown id reports failure.
#[derive(Debug, Default)]
pub struct HostSyscalls;

impl SyscallHandler for HostSyscalls {
    fn call(&mut self, regs: &mut RegisterFile, id: u64) -> SyscallStatus {
        match id {
            SYSCALL_GET_SPECIAL_ADDRESS => {
                let base = match regs.read_u64(Register::RA) {
                    0 => STATIC_BASE,
                    1 => STACK_BASE,
                    2 => HEAP_BASE,
                    _ => return 1,
                };
                regs.write_u64(Register::RA, base);
                0
            }
            SYSCALL_GET_SYSTEM_SPECIFICATIONS => {
                let little_endian = u64::from(cfg!(target_endian = "little"));
                regs.write_u64(Register::RA, little_endian);
                0
            }
            _ => 1,
        }
    }
}
