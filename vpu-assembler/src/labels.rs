//! Label tables
//!
//! Global labels live in an indexed arena: records in definition order plus
//! a name index. Local labels (`.name:` / `@name`) keep a side table of
//! deferred references that get patched when the definition arrives.

use std::collections::HashMap;

/// What a global label resolves to
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LabelValue {
    /// Instruction position (`name:` definitions)
    InstPosition(u64),
    /// Unsigned constant
    Uint(u64),
    /// Signed constant
    Int(i64),
    /// Float constant
    Float(f64),
    /// Reference into the static memory blob
    StaticRef { offset: u64, len: u64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelRecord {
    pub name: String,
    pub value: LabelValue,
}

/// Global label arena
#[derive(Default, Debug)]
pub struct LabelTable {
    records: Vec<LabelRecord>,
    index: HashMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&LabelValue> {
        self.index.get(name).map(|&i| &self.records[i].value)
    }

    /// Add a label. Redefinition is rejected, as are empty names.
    pub fn add(&mut self, name: &str, value: LabelValue) -> Result<(), ()> {
        if name.is_empty() || self.index.contains_key(name) {
            return Err(());
        }
        self.index.insert(name.to_string(), self.records.len());
        self.records.push(LabelRecord {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    /// Remove a label, compacting the arena. Fails if the name is unknown.
    pub fn remove(&mut self, name: &str) -> Result<(), ()> {
        let pos = self.index.remove(name).ok_or(())?;
        self.records.remove(pos);
        for i in self.index.values_mut() {
            if *i > pos {
                *i -= 1;
            }
        }
        Ok(())
    }

    /// Records in definition order
    pub fn iter(&self) -> impl Iterator<Item = &LabelRecord> {
        self.records.iter()
    }

    /// Serialize to the container's opaque labels blob
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        for record in &self.records {
            out.extend_from_slice(&(record.name.len() as u32).to_le_bytes());
            out.extend_from_slice(record.name.as_bytes());
            match record.value {
                LabelValue::InstPosition(v) => {
                    out.push(0);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                LabelValue::Uint(v) => {
                    out.push(1);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                LabelValue::Int(v) => {
                    out.push(2);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                LabelValue::Float(v) => {
                    out.push(3);
                    out.extend_from_slice(&v.to_bits().to_le_bytes());
                }
                LabelValue::StaticRef { offset, len } => {
                    out.push(4);
                    out.extend_from_slice(&offset.to_le_bytes());
                    out.extend_from_slice(&len.to_le_bytes());
                }
            }
        }
        out
    }

    /// Parse a labels blob written by [`LabelTable::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut table = Self::new();
        let mut pos = 0usize;
        let count = read_u32(bytes, &mut pos)?;
        for _ in 0..count {
            let name_len = read_u32(bytes, &mut pos)? as usize;
            let name = std::str::from_utf8(bytes.get(pos..pos + name_len)?).ok()?;
            pos += name_len;
            let tag = *bytes.get(pos)?;
            pos += 1;
            let value = match tag {
                0 => LabelValue::InstPosition(read_u64(bytes, &mut pos)?),
                1 => LabelValue::Uint(read_u64(bytes, &mut pos)?),
                2 => LabelValue::Int(read_u64(bytes, &mut pos)? as i64),
                3 => LabelValue::Float(f64::from_bits(read_u64(bytes, &mut pos)?)),
                4 => LabelValue::StaticRef {
                    offset: read_u64(bytes, &mut pos)?,
                    len: read_u64(bytes, &mut pos)?,
                },
                _ => return None,
            };
            table.add(name, value).ok()?;
        }
        Some(table)
    }
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let chunk = bytes.get(*pos..*pos + 4)?;
    *pos += 4;
    Some(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

fn read_u64(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let chunk = bytes.get(*pos..*pos + 8)?;
    *pos += 8;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    Some(u64::from_le_bytes(buf))
}

/// Which literal slot of a word a deferred reference patches
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LiteralSlot {
    /// E profile, bits 8..24
    E,
    /// RL profile, bits 16..32
    Rl,
}

impl LiteralSlot {
    /// Write a 16-bit value into the slot of a packed word
    pub fn patch(self, word: u32, value: u16) -> u32 {
        match self {
            LiteralSlot::E => (word & !(0xFFFF << 8)) | (value as u32) << 8,
            LiteralSlot::Rl => (word & 0xFFFF) | (value as u32) << 16,
        }
    }
}

/// A reference waiting for its local label to be defined
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingRef {
    /// Instruction index of the word to patch
    pub word_index: u64,
    pub slot: LiteralSlot,
}

#[derive(Default, Debug)]
struct LocalLabel {
    defined: Option<u64>,
    pending: Vec<PendingRef>,
}

/// Side table for local labels, scoped to the current block
#[derive(Default, Debug)]
pub struct LocalLabelTable {
    entries: HashMap<String, LocalLabel>,
}

impl LocalLabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a `@name` reference. Returns the defined position, or `None`
    /// after recording the reference for patching.
    pub fn resolve_or_defer(&mut self, name: &str, reference: PendingRef) -> Option<u64> {
        let entry = self.entries.entry(name.to_string()).or_default();
        match entry.defined {
            Some(position) => Some(position),
            None => {
                entry.pending.push(reference);
                None
            }
        }
    }

    /// Define `.name:` at an instruction position, draining the references
    /// waiting on it. Fails on redefinition.
    pub fn define(&mut self, name: &str, position: u64) -> Result<Vec<PendingRef>, ()> {
        let entry = self.entries.entry(name.to_string()).or_default();
        if entry.defined.is_some() {
            return Err(());
        }
        entry.defined = Some(position);
        Ok(std::mem::take(&mut entry.pending))
    }

    /// Any name still referenced but never defined
    pub fn missing(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, l)| l.defined.is_none() && !l.pending.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Close the block: local names do not outlive it
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut table = LabelTable::new();
        table.add("size", LabelValue::Uint(40)).unwrap();
        table.add("main", LabelValue::InstPosition(2)).unwrap();
        assert_eq!(table.get("size"), Some(&LabelValue::Uint(40)));
        assert_eq!(table.get("main"), Some(&LabelValue::InstPosition(2)));
        assert_eq!(table.get("nope"), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = LabelTable::new();
        table.add("x", LabelValue::Uint(1)).unwrap();
        assert!(table.add("x", LabelValue::Uint(2)).is_err());
        assert_eq!(table.get("x"), Some(&LabelValue::Uint(1)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut table = LabelTable::new();
        assert!(table.add("", LabelValue::Uint(1)).is_err());
    }

    #[test]
    fn test_remove_compacts() {
        let mut table = LabelTable::new();
        table.add("a", LabelValue::Uint(1)).unwrap();
        table.add("b", LabelValue::Uint(2)).unwrap();
        table.add("c", LabelValue::Uint(3)).unwrap();
        table.remove("b").unwrap();
        assert!(table.remove("b").is_err());
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("c"), Some(&LabelValue::Uint(3)));
        let names: Vec<_> = table.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_blob_round_trip() {
        let mut table = LabelTable::new();
        table.add("pos", LabelValue::InstPosition(7)).unwrap();
        table.add("neg", LabelValue::Int(-9)).unwrap();
        table.add("pi", LabelValue::Float(3.25)).unwrap();
        table
            .add("msg", LabelValue::StaticRef { offset: 8, len: 2 })
            .unwrap();
        let loaded = LabelTable::from_bytes(&table.to_bytes()).unwrap();
        let records: Vec<_> = loaded.iter().cloned().collect();
        let original: Vec<_> = table.iter().cloned().collect();
        assert_eq!(records, original);
    }

    #[test]
    fn test_local_backward_reference() {
        let mut locals = LocalLabelTable::new();
        locals.define("loop", 2).unwrap();
        let resolved = locals.resolve_or_defer(
            "loop",
            PendingRef {
                word_index: 5,
                slot: LiteralSlot::E,
            },
        );
        assert_eq!(resolved, Some(2));
        assert_eq!(locals.missing(), None);
    }

    #[test]
    fn test_local_forward_reference_then_define() {
        let mut locals = LocalLabelTable::new();
        let reference = PendingRef {
            word_index: 1,
            slot: LiteralSlot::Rl,
        };
        assert_eq!(locals.resolve_or_defer("end", reference), None);
        assert_eq!(locals.missing(), Some("end"));
        let drained = locals.define("end", 4).unwrap();
        assert_eq!(drained, vec![reference]);
        assert_eq!(locals.missing(), None);
    }

    #[test]
    fn test_local_one_definition_only() {
        let mut locals = LocalLabelTable::new();
        locals.define("x", 1).unwrap();
        assert!(locals.define("x", 2).is_err());
    }

    #[test]
    fn test_patch_slots() {
        let word = 0x8000_0028u32; // E-profile with hint set
        assert_eq!(LiteralSlot::E.patch(word, 0xFFFD), 0x80FF_FD28);
        let word = 0x0000_0029u32;
        assert_eq!(LiteralSlot::Rl.patch(word, 0xFFFD), 0xFFFD_0029);
    }
}
