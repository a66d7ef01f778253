//! Memory subsystem
//!
//! The VM addresses three disjoint regions through one 64-bit address space:
//!
//! - static memory at [`STATIC_BASE`], read-only, loaded from the program
//!   container (its first 8 bytes are its own size),
//! - the data stack at [`STACK_BASE`], a byte view over the u64 stack slots,
//! - the heap at [`HEAP_BASE`], grown by a bump allocator.
//!
//! Every access is bounds-checked; an address outside a mapped region is a
//! fault, never host memory.

use std::collections::HashMap;

use vpu_spec::{Address, HEAP_BASE, STACK_BASE, STATIC_BASE};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone)]
pub struct Memory {
    static_mem: Vec<u8>,
    stack: Vec<u64>,
    heap: Vec<u8>,
    heap_limit: u64,
    /// Live allocations: heap offset -> size
    allocations: HashMap<u64, u64>,
}

impl Memory {
    pub fn new(static_mem: Vec<u8>, stack_slots: usize, heap_limit: u64) -> Self {
        Self {
            static_mem,
            stack: vec![0; stack_slots],
            heap: Vec::new(),
            heap_limit,
            allocations: HashMap::new(),
        }
    }

    // ---------------- stack slots ----------------

    pub fn stack_slots(&self) -> u64 {
        self.stack.len() as u64
    }

    pub fn stack_slot(&self, index: u64) -> Result<u64> {
        self.stack
            .get(index as usize)
            .copied()
            .ok_or(RuntimeError::OutOfBounds {
                address: STACK_BASE + index * 8,
                width: 8,
            })
    }

    pub fn set_stack_slot(&mut self, index: u64, value: u64) -> Result<()> {
        match self.stack.get_mut(index as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::OutOfBounds {
                address: STACK_BASE + index * 8,
                width: 8,
            }),
        }
    }

    // ---------------- byte-addressed access ----------------

    fn load(&self, addr: Address) -> Result<u8> {
        if addr >= STATIC_BASE && addr < STATIC_BASE + self.static_mem.len() as u64 {
            return Ok(self.static_mem[(addr - STATIC_BASE) as usize]);
        }
        if addr >= STACK_BASE && addr < STACK_BASE + self.stack.len() as u64 * 8 {
            let off = addr - STACK_BASE;
            let slot = self.stack[(off / 8) as usize];
            return Ok(slot.to_le_bytes()[(off % 8) as usize]);
        }
        if addr >= HEAP_BASE && addr < HEAP_BASE + self.heap.len() as u64 {
            return Ok(self.heap[(addr - HEAP_BASE) as usize]);
        }
        Err(RuntimeError::OutOfBounds {
            address: addr,
            width: 1,
        })
    }

    fn store(&mut self, addr: Address, value: u8) -> Result<()> {
        if addr >= STATIC_BASE && addr < STATIC_BASE + self.static_mem.len() as u64 {
            return Err(RuntimeError::ReadOnly { address: addr });
        }
        if addr >= STACK_BASE && addr < STACK_BASE + self.stack.len() as u64 * 8 {
            let off = addr - STACK_BASE;
            let slot = &mut self.stack[(off / 8) as usize];
            let mut bytes = slot.to_le_bytes();
            bytes[(off % 8) as usize] = value;
            *slot = u64::from_le_bytes(bytes);
            return Ok(());
        }
        if addr >= HEAP_BASE && addr < HEAP_BASE + self.heap.len() as u64 {
            self.heap[(addr - HEAP_BASE) as usize] = value;
            return Ok(());
        }
        Err(RuntimeError::OutOfBounds {
            address: addr,
            width: 1,
        })
    }

    pub fn read_u8(&self, addr: Address) -> Result<u8> {
        self.load(addr)
    }

    pub fn read_u16(&self, addr: Address) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_bytes(addr, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&self, addr: Address) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&self, addr: Address) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_bytes(addr, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn write_u8(&mut self, addr: Address, value: u8) -> Result<()> {
        self.store(addr, value)
    }

    pub fn write_u16(&mut self, addr: Address, value: u16) -> Result<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, addr: Address, value: u32) -> Result<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, addr: Address, value: u64) -> Result<()> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    pub fn read_bytes(&self, addr: Address, buf: &mut [u8]) -> Result<()> {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.load(addr + i as u64)?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, addr: Address, bytes: &[u8]) -> Result<()> {
        for (i, &byte) in bytes.iter().enumerate() {
            self.store(addr + i as u64, byte)?;
        }
        Ok(())
    }

    /// Read a NUL-terminated string, without the terminator
    pub fn read_cstr(&self, addr: Address) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut pos = addr;
        loop {
            let byte = self.load(pos)?;
            if byte == 0 {
                return Ok(out);
            }
            out.push(byte);
            pos += 1;
        }
    }

    // ---------------- block operations ----------------

    pub fn memset(&mut self, dst: Address, byte: u8, len: u64) -> Result<()> {
        for i in 0..len {
            self.store(dst + i, byte)?;
        }
        Ok(())
    }

    /// A block operand must lie entirely inside one mapped region
    fn check_span(&self, addr: Address, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let regions = [
            (STATIC_BASE, self.static_mem.len() as u64),
            (STACK_BASE, self.stack.len() as u64 * 8),
            (HEAP_BASE, self.heap.len() as u64),
        ];
        if let Some(end) = addr.checked_add(len) {
            for (base, size) in regions {
                if addr >= base && end <= base + size {
                    return Ok(());
                }
            }
        }
        Err(RuntimeError::OutOfBounds {
            address: addr,
            width: len,
        })
    }

    /// Overlap-safe copy (memmove). Both spans are validated before the
    /// scratch buffer is sized, so the length never reaches the host
    /// allocator unchecked.
    pub fn copy(&mut self, dst: Address, src: Address, len: u64) -> Result<()> {
        self.check_span(src, len)?;
        self.check_span(dst, len)?;
        let mut buf = vec![0u8; len as usize];
        self.read_bytes(src, &mut buf)?;
        self.write_bytes(dst, &buf)
    }

    pub fn compare(&self, a: Address, b: Address, len: u64) -> Result<i32> {
        for i in 0..len {
            let x = self.load(a + i)?;
            let y = self.load(b + i)?;
            if x != y {
                return Ok(if x < y { -1 } else { 1 });
            }
        }
        Ok(0)
    }

    // ---------------- heap ----------------

    /// Bump-allocate. Freed blocks are not reclaimed, only invalidated.
    pub fn malloc(&mut self, size: u64) -> Result<Address> {
        let offset = self.heap.len() as u64;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.heap_limit)
            .ok_or(RuntimeError::HeapExhausted { size })?;
        self.heap.resize(end as usize, 0);
        self.allocations.insert(offset, size);
        Ok(HEAP_BASE + offset)
    }

    pub fn free(&mut self, addr: Address) -> Result<()> {
        let offset = addr
            .checked_sub(HEAP_BASE)
            .ok_or(RuntimeError::InvalidFree { address: addr })?;
        match self.allocations.remove(&offset) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::InvalidFree { address: addr }),
        }
    }

    pub fn live_allocations(&self) -> usize {
        self.allocations.len()
    }
}
