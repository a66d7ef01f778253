//! # VPU Executable Container
//!
//! Binary format (all fields little-endian):
//!
//! ```text
//! Offset  Size   Field
//! ─────────────────────────────────────────────
//! 0x00    4      magic ("VPU:")
//! 0x04    4      padding_count
//! 0x08    8      flags (bit 0: labels blob present)
//! 0x10    8      entry_point (instruction index)
//! 0x18    8      metadata_size
//! 0x20    ...    static memory blob (first 8 bytes: its own size)
//!         ...    labels blob (u64 size + bytes, per flags bit 0)
//!         ...    padding_count zero bytes (aligns the program to 4)
//!         ...    program: u32 instruction words to end of file
//! ```

use crate::error::VpuError;
use crate::MAGIC;

/// Container header size in bytes
pub const HEADER_SIZE: usize = 32;

/// Flag bit: a serialized label table follows the static blob
pub const FLAG_LABELS: u64 = 1;

/// A loaded (or assembled) VPU executable
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    /// Instruction words
    pub code: Vec<u32>,

    /// Static memory blob; its first 8 bytes record its own total size
    pub static_mem: Vec<u8>,

    /// Entry point (instruction index)
    pub entry_point: u64,

    /// Container flags (bit 0 is managed by serialization)
    pub flags: u64,

    /// Opaque serialized label table, kept for debuggers
    pub label_bytes: Option<Vec<u8>>,
}

impl Program {
    /// Create an empty program with an empty (header-only) static blob
    pub fn new() -> Self {
        let mut static_mem = vec![0u8; 8];
        static_mem[..8].copy_from_slice(&8u64.to_le_bytes());
        Self {
            code: Vec::new(),
            static_mem,
            entry_point: 0,
            flags: 0,
            label_bytes: None,
        }
    }

    /// Size declared by the static blob's own header
    pub fn static_header_size(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.static_mem[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Validate internal consistency
    pub fn validate(&self) -> Result<(), VpuError> {
        if self.static_mem.len() < 8 {
            return Err(VpuError::StaticSizeMismatch {
                header: 0,
                actual: self.static_mem.len(),
            });
        }
        let header = self.static_header_size();
        if header as usize != self.static_mem.len() {
            return Err(VpuError::StaticSizeMismatch {
                header,
                actual: self.static_mem.len(),
            });
        }
        if !self.code.is_empty() && self.entry_point >= self.code.len() as u64 {
            return Err(VpuError::EntryOutOfRange {
                entry: self.entry_point,
                len: self.code.len(),
            });
        }
        Ok(())
    }

    /// Serialize to container bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut labels_section = Vec::new();
        let mut flags = self.flags & !FLAG_LABELS;
        if let Some(labels) = &self.label_bytes {
            flags |= FLAG_LABELS;
            labels_section.extend_from_slice(&(labels.len() as u64).to_le_bytes());
            labels_section.extend_from_slice(labels);
        }

        let meta_size = self.static_mem.len() + labels_section.len();
        let padding = (4 - meta_size % 4) % 4;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + meta_size + padding + self.code.len() * 4);
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&(padding as u32).to_le_bytes());
        bytes.extend_from_slice(&flags.to_le_bytes());
        bytes.extend_from_slice(&self.entry_point.to_le_bytes());
        bytes.extend_from_slice(&(meta_size as u64).to_le_bytes());
        bytes.extend_from_slice(&self.static_mem);
        bytes.extend_from_slice(&labels_section);
        bytes.extend_from_slice(&vec![0u8; padding]);
        for &word in &self.code {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Deserialize and validate container bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VpuError> {
        if bytes.len() < HEADER_SIZE {
            return Err(VpuError::Truncated {
                expected: HEADER_SIZE,
                found: bytes.len(),
            });
        }
        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != MAGIC {
            return Err(VpuError::InvalidMagic(magic));
        }

        let padding = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let flags = read_u64(bytes, 8);
        let entry_point = read_u64(bytes, 16);
        let meta_size = read_u64(bytes, 24);

        let meta_start = HEADER_SIZE;
        let meta_end = meta_start
            .checked_add(meta_size as usize)
            .ok_or(VpuError::InvalidMetadataSize {
                meta_size,
                total: bytes.len(),
            })?;
        let code_start = meta_end + padding;
        if meta_size < 8 || code_start > bytes.len() {
            return Err(VpuError::InvalidMetadataSize {
                meta_size,
                total: bytes.len(),
            });
        }

        let metadata = &bytes[meta_start..meta_end];
        let static_size = read_u64(metadata, 0) as usize;
        if static_size < 8 || static_size > metadata.len() {
            return Err(VpuError::StaticSizeMismatch {
                header: static_size as u64,
                actual: metadata.len(),
            });
        }
        let static_mem = metadata[..static_size].to_vec();

        let label_bytes = if flags & FLAG_LABELS != 0 {
            let labels_region = &metadata[static_size..];
            if labels_region.len() < 8 {
                return Err(VpuError::Truncated {
                    expected: static_size + 8,
                    found: metadata.len(),
                });
            }
            let labels_size = read_u64(labels_region, 0) as usize;
            if labels_region.len() < 8 + labels_size {
                return Err(VpuError::Truncated {
                    expected: static_size + 8 + labels_size,
                    found: metadata.len(),
                });
            }
            Some(labels_region[8..8 + labels_size].to_vec())
        } else {
            None
        };

        let code_bytes = &bytes[code_start..];
        if code_bytes.len() % 4 != 0 {
            return Err(VpuError::MisalignedProgram(code_bytes.len()));
        }
        let mut code = Vec::with_capacity(code_bytes.len() / 4);
        for chunk in code_bytes.chunks_exact(4) {
            code.push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        let program = Self {
            code,
            static_mem,
            entry_point,
            flags,
            label_bytes,
        };
        program.validate()?;
        Ok(program)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buf)
}
