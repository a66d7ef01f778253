//! Whole-program listing

use vpu_spec::{Program, Word};

use crate::decoder::decode;
use crate::error::Result;
use crate::formatter::format;

/// Disassemble a program into an assembly listing.
///
/// Undecodable words are annotated in place instead of aborting the
/// listing, so a corrupt region does not hide the rest of the program.
pub fn disassemble(program: &Program) -> Result<String> {
    let mut output = String::new();

    output.push_str("; VPU disassembly\n");
    output.push_str(&format!("; entry point: {}\n", program.entry_point));
    output.push_str(&format!(
        "; {} instructions, {} static bytes\n\n",
        program.code.len(),
        program.static_mem.len()
    ));

    for (index, &raw) in program.code.iter().enumerate() {
        output.push_str(&format!("{:#06x}:  {:08x}  ", index, raw));
        match decode(Word(raw)) {
            Ok(instr) => output.push_str(&format(&instr)),
            Err(err) => output.push_str(&format!("; ERROR: {}", err)),
        }
        output.push('\n');
    }

    Ok(output)
}
